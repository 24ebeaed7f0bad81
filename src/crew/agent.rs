//! 角色描述（RoleAgent）与角色表（Roster）
//!
//! 纯配置：角色名、目标、背景、可用工具名、是否允许委派；本身没有行为，由 Crew 实现消费。

use serde::{Deserialize, Serialize};

use crate::tasks::TaskRole;

/// 一个角色的声明式描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAgent {
    pub role: TaskRole,
    /// 展示用名称
    pub name: String,
    pub goal: String,
    pub backstory: String,
    /// 允许调用的工具名（ToolExecutor 按此校验）
    pub tools: Vec<String>,
    pub allow_delegation: bool,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl RoleAgent {
    /// 读上下文、管理账本
    pub fn planner() -> Self {
        Self {
            role: TaskRole::Planner,
            name: "Planner".into(),
            goal: "Read context and create a list of tasks to complete the objective(s).".into(),
            backstory: "You are a top-notch planner with the ability to break down complex \
                objectives into smaller, actionable tasks. Your job is to read the context and \
                create a list of tasks for execution, assigning each to the agent best suited for it."
                .into(),
            tools: names(&[
                "read_context",
                "get_current_tasks",
                "clear_all_tasks",
                "add_task_for_planner",
                "add_task_for_executor",
                "add_task_for_reviewer",
                "read_tasks",
                "add_task",
                "update_task_status",
            ]),
            allow_delegation: true,
        }
    }

    /// 文件系统写工具 + 给自己追加任务
    pub fn executor() -> Self {
        Self {
            role: TaskRole::Executor,
            name: "Executor".into(),
            goal: "Complete assigned tasks.".into(),
            backstory: "You are an executor with a knack for getting things done. Your job is to \
                complete the tasks assigned to you by the Planner."
                .into(),
            tools: names(&[
                "get_current_directory",
                "change_directory",
                "create_directory",
                "create_file",
                "check_if_file_exists",
                "list_files",
                "read_file",
                "append_to_file",
                "write_file",
                "read_context",
                "add_task_for_executor",
                "update_task_status",
                "git_status",
                "git_diff",
                "git_commit",
            ]),
            allow_delegation: false,
        }
    }

    /// 只读文件系统 + 上下文；发现问题时给 Planner 追加任务
    pub fn reviewer() -> Self {
        Self {
            role: TaskRole::Reviewer,
            name: "Reviewer".into(),
            goal: "Ensure tasks are completed satisfactorily.".into(),
            backstory: "You are a reviewer with an eye for detail. Your job is to verify the \
                completion and quality of all tasks completed, and to check that the objective(s) \
                listed in the context are met. If not, create a task for the Planner to address the issue."
                .into(),
            tools: names(&[
                "get_current_directory",
                "change_directory",
                "check_if_file_exists",
                "list_files",
                "read_file",
                "read_context",
                "read_tasks",
                "add_task_for_planner",
                "get_valid_statuses",
                "git_status",
                "git_branch",
                "git_log",
                "git_diff",
            ]),
            allow_delegation: false,
        }
    }

    /// 无工具，只回答 yes / no
    pub fn decider() -> Self {
        Self {
            role: TaskRole::Decider,
            name: "Decider".into(),
            goal: "Respond only with yes or no given the provided context.".into(),
            backstory: "You are a specialized machine that can only output the words 'yes' or \
                'no'. Your job is to review the given context and decide whether the objective \
                has been met or not."
                .into(),
            tools: Vec::new(),
            allow_delegation: false,
        }
    }

    pub fn can_use(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }
}

/// 四个角色的描述表，按 TaskRole 下标存放
#[derive(Debug, Clone)]
pub struct Roster {
    agents: [RoleAgent; 4],
}

impl Default for Roster {
    fn default() -> Self {
        Self::canonical()
    }
}

impl Roster {
    pub fn canonical() -> Self {
        Self {
            agents: [
                RoleAgent::planner(),
                RoleAgent::executor(),
                RoleAgent::reviewer(),
                RoleAgent::decider(),
            ],
        }
    }

    pub fn get(&self, role: TaskRole) -> &RoleAgent {
        &self.agents[role.index()]
    }

    /// 替换某个角色的描述
    pub fn with_agent(mut self, agent: RoleAgent) -> Self {
        let idx = agent.role.index();
        self.agents[idx] = agent;
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleAgent> {
        self.agents.iter()
    }
}
