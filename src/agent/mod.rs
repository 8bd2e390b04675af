//! Core agent logic.
//!
//! The agent orchestrates:
//! - The bounded model+tool round loop driving each turn
//! - Mutual exclusion between user turns and heartbeat scans
//! - Crash-recoverable heartbeat scheduling with startup catch-up
//! - System prompt assembly from the workspace
//! - Soul and identity file management

mod agent_loop;
pub mod heartbeat;
pub mod soul;
mod system_prompt;

pub use agent_loop::{
    Agent, AgentCallbacks, AgentDeps, NullCallbacks, MAX_TOOL_ROUNDS, ROUND_LIMIT_FALLBACK,
};
pub use heartbeat::{
    classify_scan, is_scan_due, FileScanStateStore, HeartbeatTimer, ScanOutcome, ScanState,
    ScanStateStore, SCAN_SENTINEL,
};
pub use system_prompt::build_system_prompt;
