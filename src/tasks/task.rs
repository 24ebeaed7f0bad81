//! 任务与角色
//!
//! TaskRole 是固定的四个角色；Task 只有描述与所属角色，没有独立 ID。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::AgentError;

/// 协作角色（账本分区按此枚举索引）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskRole {
    Planner,
    Executor,
    Reviewer,
    Decider,
}

impl TaskRole {
    /// 规范顺序，也是账本分区的下标顺序
    pub const ALL: [TaskRole; 4] = [
        TaskRole::Planner,
        TaskRole::Executor,
        TaskRole::Reviewer,
        TaskRole::Decider,
    ];

    pub fn index(self) -> usize {
        match self {
            TaskRole::Planner => 0,
            TaskRole::Executor => 1,
            TaskRole::Reviewer => 2,
            TaskRole::Decider => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskRole::Planner => "planner",
            TaskRole::Executor => "executor",
            TaskRole::Reviewer => "reviewer",
            TaskRole::Decider => "decider",
        }
    }

    /// 首字母大写的展示名（Planner / Executor ...）
    pub fn title(self) -> &'static str {
        match self {
            TaskRole::Planner => "Planner",
            TaskRole::Executor => "Executor",
            TaskRole::Reviewer => "Reviewer",
            TaskRole::Decider => "Decider",
        }
    }
}

impl fmt::Display for TaskRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskRole {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planner" => Ok(TaskRole::Planner),
            "executor" => Ok(TaskRole::Executor),
            "reviewer" => Ok(TaskRole::Reviewer),
            "decider" => Ok(TaskRole::Decider),
            other => Err(AgentError::validation(format!(
                "Unknown role: '{}', must be one of planner, executor, reviewer, decider",
                other
            ))),
        }
    }
}

/// 一条待办任务：自然语言描述 + 目标角色；创建后不可修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub role: TaskRole,
    pub description: String,
}

impl Task {
    /// 描述为空（或全空白）时返回 Validation 错误
    pub fn new(role: TaskRole, description: impl Into<String>) -> Result<Self, AgentError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(AgentError::validation("Task description cannot be empty"));
        }
        Ok(Self { role, description })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_case_insensitive() {
        assert_eq!("Executor".parse::<TaskRole>().unwrap(), TaskRole::Executor);
        assert_eq!(" decider ".parse::<TaskRole>().unwrap(), TaskRole::Decider);
        assert!("manager".parse::<TaskRole>().is_err());
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, role) in TaskRole::ALL.iter().enumerate() {
            assert_eq!(role.index(), i);
        }
    }

    #[test]
    fn test_empty_description_rejected() {
        assert!(Task::new(TaskRole::Planner, "   ").is_err());
        assert!(Task::new(TaskRole::Planner, "plan it").is_ok());
    }
}
