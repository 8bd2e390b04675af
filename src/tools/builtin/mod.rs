//! Builtin tools available to every session.

mod file;
mod memory;
mod shell;
mod skill;
mod soul;
mod task;

pub use file::{CopyToWorkbenchTool, ListDirTool, ReadFileTool, WriteFileTool};
pub use memory::{MemoryIndexTool, MemoryReadTool, MemoryWriteTool};
pub use shell::ExecTool;
pub use skill::{CreateSkillTool, ReadSkillTool, UpdateSkillTool};
pub use soul::{CompleteBootstrapTool, UpdateIdentityTool, UpdateSoulTool};
pub use task::{ArchiveTaskTool, CreateTaskTool, UpdateTaskStatusTool};

use std::sync::Arc;

use crate::tools::ToolRegistry;
use crate::workspace::Workspace;

/// Register the full builtin catalog for a workspace.
pub fn register_builtins(registry: &mut ToolRegistry, workspace: &Workspace) {
    let ws = workspace.clone();
    registry.register(Arc::new(ReadFileTool::new(ws.clone())));
    registry.register(Arc::new(WriteFileTool::new(ws.clone())));
    registry.register(Arc::new(ListDirTool::new(ws.clone())));
    registry.register(Arc::new(CopyToWorkbenchTool::new(ws.clone())));
    registry.register(Arc::new(CreateTaskTool::new(ws.clone())));
    registry.register(Arc::new(UpdateTaskStatusTool::new(ws.clone())));
    registry.register(Arc::new(ArchiveTaskTool::new(ws.clone())));
    registry.register(Arc::new(MemoryReadTool::new(ws.clone())));
    registry.register(Arc::new(MemoryWriteTool::new(ws.clone())));
    registry.register(Arc::new(MemoryIndexTool::new(ws.clone())));
    registry.register(Arc::new(ReadSkillTool::new(ws.clone())));
    registry.register(Arc::new(CreateSkillTool::new(ws.clone())));
    registry.register(Arc::new(UpdateSkillTool::new(ws.clone())));
    registry.register(Arc::new(ExecTool::new(ws.clone())));
    registry.register(Arc::new(UpdateSoulTool::new(ws.clone())));
    registry.register(Arc::new(UpdateIdentityTool::new(ws.clone())));
    registry.register(Arc::new(CompleteBootstrapTool::new(ws)));
}
