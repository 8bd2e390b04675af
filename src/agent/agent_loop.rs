//! The agent: turn coordination and the bounded tool-call loop.
//!
//! A turn is one complete `chat()` or heartbeat invocation; within a turn
//! the loop runs up to [`MAX_TOOL_ROUNDS`] model-call-plus-tool-execution
//! rounds. The `busy` flag gates admission: timer ticks that land during a
//! turn coalesce into a single deferred scan, released when the chat turn
//! finishes. Conversation history lives for the process lifetime only;
//! nothing but scan metadata survives a restart.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;

use crate::agent::heartbeat::{
    build_scan_prompt, classify_scan, is_scan_due, HeartbeatTimer, ScanOutcome, ScanState,
    ScanStateStore,
};
use crate::agent::system_prompt::build_system_prompt;
use crate::error::LlmError;
use crate::llm::{ChatMessage, LlmProvider, ToolDefinition};
use crate::tools::ToolRegistry;
use crate::workspace::Workspace;

/// Ceiling on model+tool rounds within one turn.
pub const MAX_TOOL_ROUNDS: usize = 20;

/// Terminal text appended when the round ceiling is hit. A designed
/// terminal state, not an error.
pub const ROUND_LIMIT_FALLBACK: &str =
    "I've reached the maximum number of tool call rounds. Let me know if you'd like me to continue.";

/// Observer callbacks for the presentation layer. Fire-and-forget; return
/// values are never consumed and the callbacks must not block for long.
pub trait AgentCallbacks: Send + Sync {
    fn on_assistant_text(&self, text: &str);
    fn on_tool_call(&self, name: &str, args: &serde_json::Value);
    fn on_tool_result(&self, name: &str, result: &str);
    fn on_heartbeat_start(&self);
    fn on_heartbeat_end(&self, result: &str);
}

/// Callbacks that ignore everything (headless runs and tests).
pub struct NullCallbacks;

impl AgentCallbacks for NullCallbacks {
    fn on_assistant_text(&self, _text: &str) {}
    fn on_tool_call(&self, _name: &str, _args: &serde_json::Value) {}
    fn on_tool_result(&self, _name: &str, _result: &str) {}
    fn on_heartbeat_start(&self) {}
    fn on_heartbeat_end(&self, _result: &str) {}
}

/// Everything the agent is wired to.
pub struct AgentDeps {
    pub llm: Arc<dyn LlmProvider>,
    pub tools: Arc<ToolRegistry>,
    pub workspace: Workspace,
    pub callbacks: Arc<dyn AgentCallbacks>,
    pub scan_state: Arc<dyn ScanStateStore>,
}

#[derive(Debug, Default, Clone, Copy)]
struct TurnFlags {
    /// True for the full extent of any turn (chat or heartbeat).
    busy: bool,
    /// One pending deferred scan; ticks while busy collapse into this bit.
    heartbeat_pending: bool,
}

struct AgentInner {
    deps: AgentDeps,
    /// Fixed tool catalog, snapshotted at construction.
    catalog: Vec<ToolDefinition>,
    flags: Mutex<TurnFlags>,
    /// Held for the full extent of a turn; guarantees turns never interleave
    /// in history even if callers misbehave.
    history: AsyncMutex<Vec<ChatMessage>>,
    timer: Mutex<HeartbeatTimer>,
}

/// One workspace session's agent. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

impl Agent {
    pub fn new(deps: AgentDeps) -> Self {
        let catalog = deps.tools.definitions();
        Self {
            inner: Arc::new(AgentInner {
                deps,
                catalog,
                flags: Mutex::new(TurnFlags::default()),
                history: AsyncMutex::new(Vec::new()),
                timer: Mutex::new(HeartbeatTimer::new()),
            }),
        }
    }

    /// Initialize the session: build the system prompt, run a catch-up scan
    /// if one is overdue, then arm the periodic heartbeat timer.
    ///
    /// The catch-up scan completes before the timer is armed. A model-call
    /// failure during it propagates; scan state stays untouched so the scan
    /// fires again at the next opportunity.
    pub async fn init(&self, heartbeat_interval_minutes: Option<u64>) -> Result<(), LlmError> {
        let system_prompt = build_system_prompt(&self.inner.deps.workspace).await;
        {
            let mut history = self.inner.history.lock().await;
            history.clear();
            history.push(ChatMessage::system(system_prompt));
        }

        let Some(interval_minutes) = heartbeat_interval_minutes.filter(|m| *m > 0) else {
            return Ok(());
        };

        let state = self.inner.deps.scan_state.load().await;
        if is_scan_due(state.last_scan_ms, interval_minutes, Utc::now().timestamp_millis()) {
            tracing::info!(
                last_scan_ms = state.last_scan_ms,
                interval_minutes,
                "Scan overdue at startup, running catch-up"
            );
            self.run_heartbeat().await?;
        }

        let agent = self.clone();
        let interval = std::time::Duration::from_secs(interval_minutes * 60);
        self.inner
            .timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .start(interval, move || {
                let agent = agent.clone();
                async move { agent.request_scan().await }
            });

        Ok(())
    }

    /// Process a user message and return the terminal assistant text.
    ///
    /// Concurrent `chat` calls are not deferred — the interactive prompt
    /// serializes them. Only heartbeat ticks get deferral. The busy flag is
    /// released even when the model call fails; after release, one deferred
    /// scan (if any) runs before this returns.
    pub async fn chat(&self, text: &str) -> Result<String, LlmError> {
        let result = {
            let mut history = self.inner.history.lock().await;
            self.set_busy(true);
            history.push(ChatMessage::user(text));
            let result = run_turn(
                &mut history,
                &self.inner.catalog,
                self.inner.deps.llm.as_ref(),
                &self.inner.deps.tools,
                self.inner.deps.callbacks.as_ref(),
            )
            .await;
            self.set_busy(false);
            result
        };

        if self.take_pending() {
            tracing::debug!("Releasing deferred heartbeat scan");
            if let Err(e) = self.run_heartbeat().await {
                tracing::error!(error = %e, "Deferred heartbeat scan failed");
            }
        }

        result
    }

    /// Timer-tick entry point: run a scan now, or defer it when a turn is in
    /// flight. Repeated ticks while busy still yield exactly one deferred
    /// scan.
    pub async fn request_scan(&self) {
        {
            let mut flags = self.inner.flags.lock().unwrap_or_else(|e| e.into_inner());
            if flags.busy {
                flags.heartbeat_pending = true;
                tracing::debug!("Agent busy, heartbeat deferred");
                return;
            }
        }
        if let Err(e) = self.run_heartbeat().await {
            tracing::error!(error = %e, "Heartbeat scan failed");
        }
    }

    /// Run one heartbeat scan turn.
    ///
    /// Scan state is persisted only after the turn completes; a model-call
    /// error leaves it untouched so the next due-check still fires. The busy
    /// flag spans the store update and is released on either path.
    pub async fn run_heartbeat(&self) -> Result<String, LlmError> {
        let mut history = self.inner.history.lock().await;
        self.set_busy(true);
        self.inner.deps.callbacks.on_heartbeat_start();
        history.push(ChatMessage::user(build_scan_prompt()));

        let result = run_turn(
            &mut history,
            &self.inner.catalog,
            self.inner.deps.llm.as_ref(),
            &self.inner.deps.tools,
            self.inner.deps.callbacks.as_ref(),
        )
        .await;

        let result = match result {
            Ok(text) => {
                let outcome = classify_scan(&text);
                let state = ScanState {
                    last_scan_ms: Utc::now().timestamp_millis(),
                    last_scan_result: Some(outcome),
                };
                if let Err(e) = self.inner.deps.scan_state.save(&state).await {
                    tracing::warn!(error = %e, "Failed to persist scan state");
                }
                self.inner.deps.callbacks.on_heartbeat_end(match outcome {
                    ScanOutcome::Ok => "No action needed",
                    ScanOutcome::ActionTaken => &text,
                });
                Ok(text)
            }
            Err(e) => Err(e),
        };

        self.set_busy(false);
        result
    }

    /// Stop the heartbeat timer. Safe to call repeatedly.
    pub fn stop(&self) {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .stop();
    }

    /// Snapshot of the conversation history.
    pub async fn history_snapshot(&self) -> Vec<ChatMessage> {
        self.inner.history.lock().await.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.inner
            .flags
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .busy
    }

    fn set_busy(&self, busy: bool) {
        self.inner
            .flags
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .busy = busy;
    }

    /// Consume the pending-scan bit.
    fn take_pending(&self) -> bool {
        let mut flags = self.inner.flags.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut flags.heartbeat_pending)
    }
}

/// Run one turn: call the model, execute requested tools in order, repeat
/// until a plain-text response or the round ceiling.
///
/// Mutates `history` append-only. Tool calls execute strictly sequentially
/// in request order — a later call may depend on an earlier one's side
/// effects, and sequential order keeps tool-result ordering deterministic.
pub(crate) async fn run_turn(
    history: &mut Vec<ChatMessage>,
    catalog: &[ToolDefinition],
    llm: &dyn LlmProvider,
    tools: &ToolRegistry,
    callbacks: &dyn AgentCallbacks,
) -> Result<String, LlmError> {
    for round in 0..MAX_TOOL_ROUNDS {
        tracing::debug!(round, messages = history.len(), "Agent loop round");

        let response = llm.complete(history, catalog).await?;

        if response.tool_calls.is_empty() {
            // Plain text: the sole success-terminal path.
            let text = response.content;
            history.push(ChatMessage::assistant(text.clone()));
            callbacks.on_assistant_text(&text);
            return Ok(text);
        }

        history.push(ChatMessage::assistant_with_tool_calls(
            response.content,
            response.tool_calls.clone(),
        ));

        for call in &response.tool_calls {
            let result_text = match serde_json::from_str::<serde_json::Value>(&call.arguments) {
                Ok(args) => {
                    callbacks.on_tool_call(&call.name, &args);
                    tools.dispatch(&call.name, args).await
                }
                Err(e) => {
                    // Fed back as the tool result so the model can
                    // self-correct next round.
                    tracing::warn!(tool = %call.name, error = %e, "Malformed tool-call arguments");
                    format!("Error: invalid JSON arguments for '{}': {}", call.name, e)
                }
            };

            callbacks.on_tool_result(&call.name, &result_text);
            history.push(ChatMessage::tool_result(&call.id, &call.name, &result_text));
        }
    }

    tracing::warn!(
        rounds = MAX_TOOL_ROUNDS,
        "Tool round ceiling reached, forcing terminal response"
    );
    history.push(ChatMessage::assistant(ROUND_LIMIT_FALLBACK));
    Ok(ROUND_LIMIT_FALLBACK.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::error::WorkspaceError;
    use crate::llm::{LlmResponse, Role, ToolCall};
    use crate::tools::EchoTool;

    struct Step {
        gate: Option<Arc<Notify>>,
        result: Result<LlmResponse, String>,
    }

    impl Step {
        fn text(content: &str) -> Self {
            Self {
                gate: None,
                result: Ok(LlmResponse::text(content)),
            }
        }

        fn gated_text(content: &str, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                result: Ok(LlmResponse::text(content)),
            }
        }

        fn tool_calls(calls: Vec<ToolCall>) -> Self {
            Self {
                gate: None,
                result: Ok(LlmResponse {
                    content: String::new(),
                    tool_calls: calls,
                    finish_reason: crate::llm::FinishReason::ToolUse,
                }),
            }
        }

        fn fail(reason: &str) -> Self {
            Self {
                gate: None,
                result: Err(reason.to_string()),
            }
        }
    }

    fn echo_call(id: &str, message: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: "echo".to_string(),
            arguments: format!(r#"{{"message":"{}"}}"#, message),
        }
    }

    /// Provider that replays a script, optionally looping one tool-call
    /// response forever.
    struct ScriptedProvider {
        steps: Mutex<VecDeque<Step>>,
        calls: AtomicUsize,
        entered: Arc<Notify>,
        repeat_tool_calls: bool,
    }

    impl ScriptedProvider {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                calls: AtomicUsize::new(0),
                entered: Arc::new(Notify::new()),
                repeat_tool_calls: false,
            })
        }

        fn repeating_tool_calls() -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
                entered: Arc::new(Notify::new()),
                repeat_tool_calls: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolDefinition],
        ) -> Result<LlmResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();

            if self.repeat_tool_calls {
                return Ok(LlmResponse {
                    content: String::new(),
                    tool_calls: vec![echo_call("call_loop", "again")],
                    finish_reason: crate::llm::FinishReason::ToolUse,
                });
            }

            let step = self
                .steps
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted provider ran out of steps");
            if let Some(gate) = step.gate {
                gate.notified().await;
            }
            step.result.map_err(|reason| LlmError::RequestFailed {
                provider: "mock".to_string(),
                reason,
            })
        }

        fn model_name(&self) -> &str {
            "mock-model"
        }
    }

    #[derive(Default)]
    struct RecordingCallbacks {
        events: Mutex<Vec<String>>,
    }

    impl RecordingCallbacks {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn count(&self, prefix: &str) -> usize {
            self.events()
                .iter()
                .filter(|e| e.starts_with(prefix))
                .count()
        }
    }

    impl AgentCallbacks for RecordingCallbacks {
        fn on_assistant_text(&self, text: &str) {
            self.events.lock().unwrap().push(format!("text:{}", text));
        }
        fn on_tool_call(&self, name: &str, _args: &serde_json::Value) {
            self.events.lock().unwrap().push(format!("call:{}", name));
        }
        fn on_tool_result(&self, name: &str, result: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("result:{}:{}", name, result));
        }
        fn on_heartbeat_start(&self) {
            self.events.lock().unwrap().push("hb_start".to_string());
        }
        fn on_heartbeat_end(&self, result: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("hb_end:{}", result));
        }
    }

    #[derive(Default)]
    struct MemoryScanStore {
        state: Mutex<ScanState>,
        saves: Mutex<Vec<ScanState>>,
    }

    impl MemoryScanStore {
        fn with_last_scan(last_scan_ms: i64) -> Arc<Self> {
            let store = Self::default();
            store.state.lock().unwrap().last_scan_ms = last_scan_ms;
            Arc::new(store)
        }

        fn saves(&self) -> Vec<ScanState> {
            self.saves.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ScanStateStore for MemoryScanStore {
        async fn load(&self) -> ScanState {
            self.state.lock().unwrap().clone()
        }

        async fn save(&self, state: &ScanState) -> Result<(), WorkspaceError> {
            *self.state.lock().unwrap() = state.clone();
            self.saves.lock().unwrap().push(state.clone());
            Ok(())
        }
    }

    struct Harness {
        agent: Agent,
        provider: Arc<ScriptedProvider>,
        store: Arc<MemoryScanStore>,
        callbacks: Arc<RecordingCallbacks>,
        _dir: tempfile::TempDir,
    }

    async fn harness_with(
        provider: Arc<ScriptedProvider>,
        store: Arc<MemoryScanStore>,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        workspace.init().await.unwrap();

        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(EchoTool));

        let callbacks = Arc::new(RecordingCallbacks::default());
        let agent = Agent::new(AgentDeps {
            llm: provider.clone(),
            tools: Arc::new(tools),
            workspace,
            callbacks: callbacks.clone(),
            scan_state: store.clone(),
        });

        Harness {
            agent,
            provider,
            store,
            callbacks,
            _dir: dir,
        }
    }

    async fn harness(steps: Vec<Step>) -> Harness {
        let h = harness_with(ScriptedProvider::new(steps), Arc::new(MemoryScanStore::default()))
            .await;
        h.agent.init(None).await.unwrap();
        h
    }

    fn roles(history: &[ChatMessage]) -> Vec<Role> {
        history.iter().map(|m| m.role).collect()
    }

    #[tokio::test]
    async fn test_immediate_text_response() {
        let h = harness(vec![Step::text("hi")]).await;

        let reply = h.agent.chat("hello").await.unwrap();
        assert_eq!(reply, "hi");

        let history = h.agent.history_snapshot().await;
        assert_eq!(roles(&history), vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(history[1].content, "hello");
        assert_eq!(history[2].content, "hi");
        assert_eq!(h.callbacks.events(), vec!["text:hi"]);
    }

    #[tokio::test]
    async fn test_tool_round_then_text() {
        let h = harness(vec![
            Step::tool_calls(vec![echo_call("call_1", "ping")]),
            Step::text("done"),
        ])
        .await;

        let reply = h.agent.chat("go").await.unwrap();
        assert_eq!(reply, "done");
        assert_eq!(h.provider.calls(), 2);

        let history = h.agent.history_snapshot().await;
        assert_eq!(
            roles(&history),
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::Tool,
                Role::Assistant
            ]
        );
        assert_eq!(history[2].tool_calls.as_ref().unwrap().len(), 1);
        assert_eq!(history[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(history[3].content, "ping");
    }

    #[tokio::test]
    async fn test_two_tool_calls_execute_in_request_order() {
        let h = harness(vec![
            Step::tool_calls(vec![echo_call("call_a", "first"), echo_call("call_b", "second")]),
            Step::text("ok"),
        ])
        .await;

        h.agent.chat("go").await.unwrap();

        let history = h.agent.history_snapshot().await;
        // assistant(tool_calls), result A, result B — A strictly before B.
        assert_eq!(history[3].tool_call_id.as_deref(), Some("call_a"));
        assert_eq!(history[3].content, "first");
        assert_eq!(history[4].tool_call_id.as_deref(), Some("call_b"));
        assert_eq!(history[4].content, "second");

        assert_eq!(
            h.callbacks.events(),
            vec![
                "call:echo",
                "result:echo:first",
                "call:echo",
                "result:echo:second",
                "text:ok"
            ]
        );
    }

    #[tokio::test]
    async fn test_round_ceiling_returns_fallback_without_extra_call() {
        let provider = ScriptedProvider::repeating_tool_calls();
        let h = harness_with(provider, Arc::new(MemoryScanStore::default())).await;
        h.agent.init(None).await.unwrap();

        let reply = h.agent.chat("loop forever").await.unwrap();
        assert_eq!(reply, ROUND_LIMIT_FALLBACK);
        // Exactly the ceiling; no 21st model call.
        assert_eq!(h.provider.calls(), MAX_TOOL_ROUNDS);

        let history = h.agent.history_snapshot().await;
        // system + user + 20 * (assistant + tool result) + fallback
        assert_eq!(history.len(), 2 + MAX_TOOL_ROUNDS * 2 + 1);
        assert_eq!(history.last().unwrap().content, ROUND_LIMIT_FALLBACK);
    }

    #[tokio::test]
    async fn test_malformed_arguments_become_tool_result() {
        let bad_call = ToolCall {
            id: "call_bad".to_string(),
            name: "echo".to_string(),
            arguments: "{not json".to_string(),
        };
        let h = harness(vec![Step::tool_calls(vec![bad_call]), Step::text("recovered")]).await;

        let reply = h.agent.chat("go").await.unwrap();
        assert_eq!(reply, "recovered");

        let history = h.agent.history_snapshot().await;
        assert_eq!(history[3].tool_call_id.as_deref(), Some("call_bad"));
        assert!(history[3].content.starts_with("Error: invalid JSON arguments for 'echo'"));

        // No on_tool_call for the unparseable payload, but the result still
        // fires.
        assert_eq!(h.callbacks.count("call:"), 0);
        assert_eq!(h.callbacks.count("result:"), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_feeds_error_text_back() {
        let call = ToolCall {
            id: "call_x".to_string(),
            name: "no_such_tool".to_string(),
            arguments: "{}".to_string(),
        };
        let h = harness(vec![Step::tool_calls(vec![call]), Step::text("ok")]).await;

        h.agent.chat("go").await.unwrap();
        let history = h.agent.history_snapshot().await;
        assert_eq!(history[3].content, "Unknown tool: no_such_tool");
    }

    #[tokio::test]
    async fn test_chat_failure_releases_busy() {
        let h = harness(vec![Step::fail("boom"), Step::text("second try")]).await;

        let err = h.agent.chat("first").await.unwrap_err();
        assert!(matches!(err, LlmError::RequestFailed { .. }));
        assert!(!h.agent.is_busy());

        // A wedged busy flag would defer this turn forever.
        let reply = h.agent.chat("again").await.unwrap();
        assert_eq!(reply, "second try");
    }

    #[tokio::test]
    async fn test_ticks_while_busy_coalesce_into_one_scan() {
        let gate = Arc::new(Notify::new());
        let provider = ScriptedProvider::new(vec![
            Step::gated_text("hi", gate.clone()),
            Step::text("HEARTBEAT_OK"),
        ]);
        let h = harness_with(provider, Arc::new(MemoryScanStore::default())).await;
        h.agent.init(None).await.unwrap();

        let chat = tokio::spawn({
            let agent = h.agent.clone();
            async move { agent.chat("hello").await }
        });

        // Wait until the chat turn is inside its model call.
        h.provider.entered.notified().await;
        assert!(h.agent.is_busy());

        // Three ticks while busy: all defer, no scan yet.
        h.agent.request_scan().await;
        h.agent.request_scan().await;
        h.agent.request_scan().await;
        assert_eq!(h.provider.calls(), 1);
        assert_eq!(h.callbacks.count("hb_start"), 0);

        gate.notify_one();
        let reply = chat.await.unwrap().unwrap();
        assert_eq!(reply, "hi");

        // Exactly one catch-up scan ran after the turn, already released
        // before chat() returned.
        assert_eq!(h.provider.calls(), 2);
        assert_eq!(h.callbacks.count("hb_start"), 1);
        assert_eq!(h.store.saves().len(), 1);
    }

    #[tokio::test]
    async fn test_scan_sentinel_persists_ok() {
        let h = harness(vec![Step::text("  HEARTBEAT_OK \n")]).await;

        h.agent.request_scan().await;

        let saves = h.store.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].last_scan_result, Some(ScanOutcome::Ok));
        assert!(saves[0].last_scan_ms > 0);
        assert!(h.callbacks.events().contains(&"hb_end:No action needed".to_string()));
    }

    #[tokio::test]
    async fn test_scan_other_text_persists_action_taken() {
        let h = harness(vec![Step::text("Created a task for the new file.")]).await;

        h.agent.request_scan().await;

        let saves = h.store.saves();
        assert_eq!(saves[0].last_scan_result, Some(ScanOutcome::ActionTaken));
        assert!(h
            .callbacks
            .events()
            .contains(&"hb_end:Created a task for the new file.".to_string()));
    }

    #[tokio::test]
    async fn test_failed_scan_leaves_state_untouched() {
        let h = harness(vec![Step::fail("api down")]).await;

        h.agent.request_scan().await;

        assert!(h.store.saves().is_empty());
        assert!(!h.agent.is_busy());
        // Start fired, end did not.
        assert_eq!(h.callbacks.count("hb_start"), 1);
        assert_eq!(h.callbacks.count("hb_end"), 0);
    }

    #[tokio::test]
    async fn test_startup_catch_up_runs_overdue_scan() {
        let ninety_minutes_ago = Utc::now().timestamp_millis() - 90 * 60_000;
        let provider = ScriptedProvider::new(vec![Step::text("HEARTBEAT_OK")]);
        let store = MemoryScanStore::with_last_scan(ninety_minutes_ago);
        let h = harness_with(provider, store).await;

        h.agent.init(Some(60)).await.unwrap();

        // One scan ran synchronously during init, before the timer armed.
        assert_eq!(h.provider.calls(), 1);
        assert_eq!(h.store.saves().len(), 1);
        h.agent.stop();
    }

    #[tokio::test]
    async fn test_startup_skips_scan_when_not_due() {
        let thirty_minutes_ago = Utc::now().timestamp_millis() - 30 * 60_000;
        let provider = ScriptedProvider::new(vec![]);
        let store = MemoryScanStore::with_last_scan(thirty_minutes_ago);
        let h = harness_with(provider, store).await;

        h.agent.init(Some(60)).await.unwrap();

        assert_eq!(h.provider.calls(), 0);
        assert!(h.store.saves().is_empty());
        h.agent.stop();
    }

    #[tokio::test]
    async fn test_scan_prompt_is_a_user_message_in_history() {
        let h = harness(vec![Step::text("HEARTBEAT_OK")]).await;
        h.agent.request_scan().await;

        let history = h.agent.history_snapshot().await;
        assert_eq!(roles(&history), vec![Role::System, Role::User, Role::Assistant]);
        assert!(history[1].content.starts_with("[Heartbeat Scan]"));
        assert_eq!(history[2].content, "HEARTBEAT_OK");
    }
}
