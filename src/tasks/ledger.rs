//! 任务账本：按角色分区的待办队列
//!
//! 每个角色一个分区，插入顺序即执行顺序；每个分区各自持有一把锁，
//! 协作循环与账本工具（add_task_for_* / clear_all_tasks）通过 `Arc<TaskLedger>` 共享同一实例。

use std::sync::{Mutex, MutexGuard};

use crate::core::AgentError;
use crate::tasks::{Task, TaskRole};

/// 按角色分区的任务账本
#[derive(Debug, Default)]
pub struct TaskLedger {
    partitions: [Mutex<Vec<Task>>; 4],
}

impl TaskLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, role: TaskRole) -> MutexGuard<'_, Vec<Task>> {
        // 分区内只有 Vec 操作，中毒后数据仍然完整，直接取回
        self.partitions[role.index()]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 追加任务到指定角色；描述为空时返回 Validation 错误
    pub fn add_task(&self, role: TaskRole, description: impl Into<String>) -> Result<(), AgentError> {
        let task = Task::new(role, description)?;
        tracing::debug!(role = %role, description = %task.description, "ledger add task");
        self.partition(role).push(task);
        Ok(())
    }

    /// 角色名为字符串的版本（供工具层使用）；未知角色返回 Validation 错误
    pub fn add_task_for(&self, role: &str, description: impl Into<String>) -> Result<(), AgentError> {
        let role: TaskRole = role.parse()?;
        self.add_task(role, description)
    }

    /// 当前分区快照
    pub fn get_tasks(&self, role: TaskRole) -> Vec<Task> {
        self.partition(role).clone()
    }

    /// 所有角色的快照，按 TaskRole::ALL 顺序
    pub fn get_all_tasks(&self) -> Vec<(TaskRole, Vec<Task>)> {
        TaskRole::ALL
            .iter()
            .map(|&role| (role, self.get_tasks(role)))
            .collect()
    }

    /// 清空一个角色；None 时清空全部
    pub fn clear(&self, role: Option<TaskRole>) {
        match role {
            Some(role) => self.partition(role).clear(),
            None => {
                for role in TaskRole::ALL {
                    self.partition(role).clear();
                }
            }
        }
    }

    /// 取出并清空一个分区
    pub fn drain(&self, role: TaskRole) -> Vec<Task> {
        std::mem::take(&mut *self.partition(role))
    }

    pub fn len(&self, role: TaskRole) -> usize {
        self.partition(role).len()
    }

    pub fn is_empty(&self, role: TaskRole) -> bool {
        self.partition(role).is_empty()
    }

    pub fn total_len(&self) -> usize {
        TaskRole::ALL.iter().map(|&r| self.len(r)).sum()
    }

    /// 渲染为 Markdown 片段（供 Planner 的任务描述与 get_current_tasks 工具使用）
    pub fn render(&self) -> String {
        let mut s = String::new();
        for (role, tasks) in self.get_all_tasks() {
            if tasks.is_empty() {
                continue;
            }
            s.push_str(&format!("Tasks for {}:\n", role.title()));
            for t in tasks {
                s.push_str(&format!("- {}\n", t.description));
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_preserves_insertion_order() {
        let ledger = TaskLedger::new();
        ledger.add_task(TaskRole::Executor, "first").unwrap();
        ledger.add_task(TaskRole::Executor, "second").unwrap();
        let tasks = ledger.get_tasks(TaskRole::Executor);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].description, "first");
        assert_eq!(tasks[1].description, "second");
        assert!(ledger.is_empty(TaskRole::Reviewer));
    }

    #[test]
    fn test_clear_one_role() {
        let ledger = TaskLedger::new();
        for role in TaskRole::ALL {
            ledger.add_task(role, "work").unwrap();
        }
        ledger.clear(Some(TaskRole::Reviewer));
        assert!(ledger.get_tasks(TaskRole::Reviewer).is_empty());
        assert_eq!(ledger.total_len(), 3);
    }

    #[test]
    fn test_clear_all_empties_every_role() {
        let ledger = TaskLedger::new();
        for role in TaskRole::ALL {
            ledger.add_task(role, "work").unwrap();
        }
        ledger.clear(None);
        for role in TaskRole::ALL {
            assert!(ledger.get_tasks(role).is_empty());
        }
    }

    #[test]
    fn test_add_rejects_empty_and_unknown_role() {
        let ledger = TaskLedger::new();
        assert!(matches!(
            ledger.add_task(TaskRole::Planner, ""),
            Err(AgentError::Validation(_))
        ));
        assert!(matches!(
            ledger.add_task_for("janitor", "sweep"),
            Err(AgentError::Validation(_))
        ));
        assert_eq!(ledger.total_len(), 0);
    }

    #[test]
    fn test_drain_returns_and_empties() {
        let ledger = TaskLedger::new();
        ledger.add_task_for("planner", "plan").unwrap();
        let drained = ledger.drain(TaskRole::Planner);
        assert_eq!(drained.len(), 1);
        assert!(ledger.is_empty(TaskRole::Planner));
    }

    #[test]
    fn test_get_tasks_is_snapshot() {
        let ledger = TaskLedger::new();
        ledger.add_task(TaskRole::Decider, "decide").unwrap();
        let snapshot = ledger.get_tasks(TaskRole::Decider);
        ledger.clear(None);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_render_skips_empty_roles() {
        let ledger = TaskLedger::new();
        ledger.add_task(TaskRole::Executor, "write 4 to result.txt").unwrap();
        assert_eq!(ledger.render(), "Tasks for Executor:\n- write 4 to result.txt\n");
    }
}
