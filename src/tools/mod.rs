pub mod executor;
pub mod filesystem;
pub mod git;
pub mod ledger_tools;
pub mod registry;
pub mod task_tools;

use std::sync::Arc;

pub use executor::ToolExecutor;
pub use filesystem::{
    AppendToFileTool, ChangeDirectoryTool, CheckIfFileExistsTool, CreateDirectoryTool,
    CreateFileTool, GetCurrentDirectoryTool, ListFilesTool, ReadFileTool, WorkDir, WriteFileTool,
};
pub use git::{GitCommitTool, GitLogTool, GitQuery, GitQueryTool};
pub use ledger_tools::{AddTaskForRoleTool, ClearAllTasksTool, GetCurrentTasksTool};
pub use registry::{Tool, ToolRegistry};
pub use task_tools::{
    AddTaskRecordTool, GetValidStatusesTool, ReadContextTool, ReadTasksTool, UpdateTaskStatusTool,
};

use crate::memory::ContextLog;
use crate::tasks::{TaskLedger, TaskRecordStore, TaskRole};

/// 注册全部工具时需要的共享资源
pub struct ToolContext {
    pub dir: WorkDir,
    pub ledger: Arc<TaskLedger>,
    pub context_log: Arc<ContextLog>,
    pub records: Arc<TaskRecordStore>,
    pub write_namespace: String,
    pub enable_git: bool,
}

/// 注册文件、账本、任务记录与（可选）git 工具；各角色能用哪些由 RoleAgent.tools 决定
pub fn build_registry(ctx: &ToolContext) -> ToolRegistry {
    let mut tools = ToolRegistry::new();

    tools.register(GetCurrentDirectoryTool::new(ctx.dir.clone()));
    tools.register(ChangeDirectoryTool::new(ctx.dir.clone()));
    tools.register(CreateDirectoryTool::new(ctx.dir.clone()));
    tools.register(CreateFileTool::new(ctx.dir.clone()));
    tools.register(CheckIfFileExistsTool::new(ctx.dir.clone()));
    tools.register(ListFilesTool::new(ctx.dir.clone()));
    tools.register(ReadFileTool::new(ctx.dir.clone()));
    tools.register(AppendToFileTool::new(ctx.dir.clone()));
    tools.register(WriteFileTool::new(ctx.dir.clone(), ctx.write_namespace.clone()));

    // Decider 分区不会被调度，不提供 add_task_for_decider
    for role in [TaskRole::Planner, TaskRole::Executor, TaskRole::Reviewer] {
        tools.register(AddTaskForRoleTool::new(ctx.ledger.clone(), role));
    }
    tools.register(GetCurrentTasksTool::new(ctx.ledger.clone()));
    tools.register(ClearAllTasksTool::new(ctx.ledger.clone()));

    tools.register(ReadContextTool::new(ctx.context_log.clone()));
    tools.register(ReadTasksTool::new(ctx.records.clone()));
    tools.register(AddTaskRecordTool::new(ctx.records.clone()));
    tools.register(UpdateTaskStatusTool::new(ctx.records.clone()));
    tools.register(GetValidStatusesTool);

    if ctx.enable_git {
        for query in [GitQuery::Status, GitQuery::Branch, GitQuery::Diff] {
            tools.register(GitQueryTool::new(ctx.dir.clone(), query));
        }
        tools.register(GitLogTool::new(ctx.dir.clone()));
        tools.register(GitCommitTool::new(ctx.dir.clone()));
    }

    tools
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crew::Roster;

    fn context(root: &std::path::Path, enable_git: bool) -> ToolContext {
        ToolContext {
            dir: WorkDir::new(root).unwrap(),
            ledger: Arc::new(TaskLedger::new()),
            context_log: Arc::new(ContextLog::open(root.join("context.md")).unwrap()),
            records: Arc::new(TaskRecordStore::new(root.join("tasks.md"))),
            write_namespace: "context".into(),
            enable_git,
        }
    }

    #[test]
    fn test_registry_and_roster_agree() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = build_registry(&context(tmp.path(), true));
        let roster = Roster::canonical();

        for name in registry.tool_names() {
            assert!(
                roster.iter().any(|a| a.can_use(&name)),
                "{} is registered but no role can call it",
                name
            );
        }
        for agent in roster.iter() {
            for name in &agent.tools {
                assert!(registry.contains(name), "{} lists unregistered {}", agent.name, name);
            }
        }
        assert!(!registry.contains("add_task_for_decider"));
    }

    #[test]
    fn test_git_tools_are_optional() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = build_registry(&context(tmp.path(), false));
        assert!(!registry.contains("git_status"));
        assert!(!registry.contains("git_commit"));
        assert!(registry.contains("write_file"));
    }
}
