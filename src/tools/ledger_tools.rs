//! 任务账本工具：add_task_for_* / get_current_tasks / clear_all_tasks
//!
//! 通过 `Arc<TaskLedger>` 操作协作循环正在使用的同一个账本。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::tasks::{TaskLedger, TaskRole};
use crate::tools::registry::{single_string_schema, string_arg};
use crate::tools::Tool;

/// 为某个角色追加任务；每个角色注册一个实例（add_task_for_planner 等）
pub struct AddTaskForRoleTool {
    ledger: Arc<TaskLedger>,
    role: TaskRole,
    name: String,
    description: String,
}

impl AddTaskForRoleTool {
    pub fn new(ledger: Arc<TaskLedger>, role: TaskRole) -> Self {
        Self {
            ledger,
            role,
            name: format!("add_task_for_{}", role),
            description: format!(
                "Adds a task with the provided description for the {}. Args: {{\"description\": \"task\"}}",
                role
            ),
        }
    }
}

#[async_trait]
impl Tool for AddTaskForRoleTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        single_string_schema("description", "what the task should achieve")
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let description = string_arg(&args, "description").unwrap_or("");
        self.ledger
            .add_task(self.role, description)
            .map(|_| format!("Task '{}' added for the {}.", description, self.role))
            .map_err(|e| e.to_string())
    }
}

/// 列出某个角色（或全部角色）的当前任务
pub struct GetCurrentTasksTool {
    ledger: Arc<TaskLedger>,
}

impl GetCurrentTasksTool {
    pub fn new(ledger: Arc<TaskLedger>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Tool for GetCurrentTasksTool {
    fn name(&self) -> &str {
        "get_current_tasks"
    }

    fn description(&self) -> &str {
        "Retrieves the current tasks for a specified role, or all roles if no role is given. Args: {\"role\": \"planner|executor|reviewer|decider\"} (optional)"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "role": { "type": "string" } },
            "required": []
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let role = string_arg(&args, "role")
            .map(str::trim)
            .filter(|r| !r.is_empty());
        match role {
            Some(role) => {
                let role: TaskRole = role.parse().map_err(|e: crate::core::AgentError| {
                    format!("Error retrieving tasks: {}", e)
                })?;
                let tasks = self.ledger.get_tasks(role);
                if tasks.is_empty() {
                    return Ok(format!("No current tasks found for {}.", role));
                }
                let mut lines = vec![format!("Tasks for {}:", role.title())];
                lines.extend(tasks.into_iter().map(|t| t.description));
                Ok(lines.join("\n"))
            }
            None => {
                let rendered = self.ledger.render();
                if rendered.is_empty() {
                    Ok("No current tasks found.".to_string())
                } else {
                    Ok(format!("Tasks for all roles:\n{}", rendered.trim_end()))
                }
            }
        }
    }
}

pub struct ClearAllTasksTool {
    ledger: Arc<TaskLedger>,
}

impl ClearAllTasksTool {
    pub fn new(ledger: Arc<TaskLedger>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Tool for ClearAllTasksTool {
    fn name(&self) -> &str {
        "clear_all_tasks"
    }

    fn description(&self) -> &str {
        "Clears all tasks from every role's queue. Args: {}"
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        self.ledger.clear(None);
        Ok("All tasks cleared.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_then_get_current_tasks() {
        let ledger = Arc::new(TaskLedger::new());
        let add = AddTaskForRoleTool::new(ledger.clone(), TaskRole::Executor);
        assert_eq!(add.name(), "add_task_for_executor");
        let out = add
            .execute(json!({"description": "write 4 to result.txt"}))
            .await
            .unwrap();
        assert_eq!(out, "Task 'write 4 to result.txt' added for the executor.");

        let get = GetCurrentTasksTool::new(ledger.clone());
        assert_eq!(
            get.execute(json!({"role": "executor"})).await.unwrap(),
            "Tasks for Executor:\nwrite 4 to result.txt"
        );
        assert_eq!(
            get.execute(json!({"role": "reviewer"})).await.unwrap(),
            "No current tasks found for reviewer."
        );
        assert_eq!(
            get.execute(json!({})).await.unwrap(),
            "Tasks for all roles:\nTasks for Executor:\n- write 4 to result.txt"
        );
        assert!(get.execute(json!({"role": "boss"})).await.is_err());
    }

    #[tokio::test]
    async fn test_add_empty_description_is_validation_error() {
        let ledger = Arc::new(TaskLedger::new());
        let add = AddTaskForRoleTool::new(ledger.clone(), TaskRole::Planner);
        let err = add.execute(json!({"description": ""})).await.unwrap_err();
        assert!(err.starts_with("Validation Error"));
        assert_eq!(ledger.total_len(), 0);
    }

    #[tokio::test]
    async fn test_clear_all_tasks() {
        let ledger = Arc::new(TaskLedger::new());
        ledger.add_task(TaskRole::Reviewer, "check").unwrap();
        let out = ClearAllTasksTool::new(ledger.clone())
            .execute(Value::Null)
            .await
            .unwrap();
        assert_eq!(out, "All tasks cleared.");
        assert_eq!(ledger.total_len(), 0);
        assert_eq!(
            GetCurrentTasksTool::new(ledger)
                .execute(Value::Null)
                .await
                .unwrap(),
            "No current tasks found."
        );
    }
}
