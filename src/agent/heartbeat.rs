//! Heartbeat: periodic autonomous scans of the workspace.
//!
//! A repeating timer asks the agent to run a "scan" turn on a fixed
//! interval. The agent reviews `user/`, `workbench/` and the memory index;
//! if nothing needs attention it answers with the scan sentinel, otherwise
//! it takes action (typically `create_task(source="agent")`). Scan metadata
//! persists in `state.json` so a restart can catch up on a missed scan.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::error::WorkspaceError;

/// Reply that marks a scan as "nothing needs attention".
pub const SCAN_SENTINEL: &str = "HEARTBEAT_OK";

/// How a completed scan turn was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    /// The reply was exactly the sentinel.
    Ok,
    /// The reply carried anything else.
    ActionTaken,
}

/// Durable record of the last completed scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanState {
    /// Unix epoch milliseconds of the last completed scan; 0 = never.
    pub last_scan_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scan_result: Option<ScanOutcome>,
}

impl Default for ScanState {
    fn default() -> Self {
        Self {
            last_scan_ms: 0,
            last_scan_result: None,
        }
    }
}

/// Classify a scan turn's terminal text.
pub fn classify_scan(response: &str) -> ScanOutcome {
    if response.trim() == SCAN_SENTINEL {
        ScanOutcome::Ok
    } else {
        ScanOutcome::ActionTaken
    }
}

/// Pure due-check: has at least one full interval elapsed since the last
/// scan? Boundary inclusive at exactly `interval_minutes * 60_000`.
pub fn is_scan_due(last_scan_ms: i64, interval_minutes: u64, now_ms: i64) -> bool {
    let interval_ms = interval_minutes as i64 * 60_000;
    now_ms - last_scan_ms >= interval_ms
}

/// The synthetic user message that drives a scan turn.
pub fn build_scan_prompt() -> String {
    [
        "[Heartbeat Scan] Periodic check triggered.",
        "",
        "Please do the following:",
        "1. Scan the user folder (user/) for any new or modified files since last check.",
        "2. Review current workbench tasks (workbench/) and their statuses.",
        "3. Check MEMORY_INDEX.md for any pending items or reminders.",
        "4. If you find something worth acting on, create a new task in workbench/ with the 🤖 prefix.",
        &format!("5. If nothing needs attention, respond with exactly: {}", SCAN_SENTINEL),
        "",
        "Remember: agent-initiated tasks should use create_task with source='agent'.",
    ]
    .join("\n")
}

/// Persistence for [`ScanState`].
///
/// `load` never fails: missing or corrupt storage yields the zero state so a
/// scan is simply considered overdue.
#[async_trait]
pub trait ScanStateStore: Send + Sync {
    async fn load(&self) -> ScanState;
    async fn save(&self, state: &ScanState) -> Result<(), WorkspaceError>;
}

/// `state.json` in the workspace root.
pub struct FileScanStateStore {
    path: PathBuf,
}

impl FileScanStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ScanStateStore for FileScanStateStore {
    async fn load(&self) -> ScanState {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), error = %e, "Corrupt scan state, starting fresh");
                ScanState::default()
            }),
            Err(_) => ScanState::default(),
        }
    }

    async fn save(&self, state: &ScanState) -> Result<(), WorkspaceError> {
        let mut body = serde_json::to_string_pretty(state).map_err(|e| {
            WorkspaceError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        body.push('\n');
        tokio::fs::write(&self.path, body).await?;
        Ok(())
    }
}

/// Repeating timer driving scan requests.
///
/// `start` is idempotent; the first (immediate) interval tick is swallowed
/// so the cadence begins one full interval after arming. The task is
/// aborted on `stop` or drop and never outlives the runtime.
#[derive(Debug, Default)]
pub struct HeartbeatTimer {
    handle: Option<JoinHandle<()>>,
}

impl HeartbeatTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer. A second call while armed is a no-op.
    pub fn start<F, Fut>(&mut self, interval: Duration, on_tick: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.handle.is_some() {
            return;
        }

        tracing::info!(?interval, "Starting heartbeat timer");
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; the startup catch-up
            // already handled "due right now".
            ticker.tick().await;
            loop {
                ticker.tick().await;
                on_tick().await;
            }
        }));
    }

    /// Cancel the timer. Safe to call repeatedly or without `start`.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::info!("Heartbeat timer stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for HeartbeatTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
