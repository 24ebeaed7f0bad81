//! 任务记录与上下文工具：read_context / read_tasks / add_task / update_task_status / get_valid_statuses
//!
//! 文件不存在不是错误：返回 "... does not exist." 字符串，由调用方当作空处理。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::AgentError;
use crate::memory::ContextLog;
use crate::tasks::{TaskRecordStore, TaskStatus};
use crate::tools::registry::{single_string_schema, string_arg};
use crate::tools::Tool;

fn sentinel(e: AgentError) -> Result<String, String> {
    match e {
        AgentError::NotFound(what) => Ok(format!("{} does not exist.", what)),
        other => Err(other.to_string()),
    }
}

pub struct ReadContextTool {
    log: Arc<ContextLog>,
}

impl ReadContextTool {
    pub fn new(log: Arc<ContextLog>) -> Self {
        Self { log }
    }
}

#[async_trait]
impl Tool for ReadContextTool {
    fn name(&self) -> &str {
        "read_context"
    }

    fn description(&self) -> &str {
        "Reads the shared context log (objective and every previous cycle's results). Args: {}"
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        self.log.read().or_else(sentinel)
    }
}

pub struct ReadTasksTool {
    store: Arc<TaskRecordStore>,
}

impl ReadTasksTool {
    pub fn new(store: Arc<TaskRecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ReadTasksTool {
    fn name(&self) -> &str {
        "read_tasks"
    }

    fn description(&self) -> &str {
        "Reads the task file and returns every task as JSON objects with id, status and description. Args: {}"
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        match self.store.read_tasks() {
            Ok(records) => serde_json::to_string_pretty(&records).map_err(|e| e.to_string()),
            Err(e) => sentinel(e),
        }
    }
}

pub struct AddTaskRecordTool {
    store: Arc<TaskRecordStore>,
}

impl AddTaskRecordTool {
    pub fn new(store: Arc<TaskRecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for AddTaskRecordTool {
    fn name(&self) -> &str {
        "add_task"
    }

    fn description(&self) -> &str {
        "Adds a new TODO task with the given description to the task file. Args: {\"description\": \"task\"}"
    }

    fn parameters_schema(&self) -> Value {
        single_string_schema("description", "single-line task description")
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let description = string_arg(&args, "description").unwrap_or("");
        self.store
            .add_task(description)
            .map(|id| format!("Task {} added.", id))
            .map_err(|e| e.to_string())
    }
}

pub struct UpdateTaskStatusTool {
    store: Arc<TaskRecordStore>,
}

impl UpdateTaskStatusTool {
    pub fn new(store: Arc<TaskRecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdateTaskStatusTool {
    fn name(&self) -> &str {
        "update_task_status"
    }

    fn description(&self) -> &str {
        "Updates the status of a task by id. Args: {\"task_id\": \"id\", \"new_status\": \"TODO|ACTIVE|REVIEW|DONE\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string" },
                "new_status": { "type": "string", "enum": ["TODO", "ACTIVE", "REVIEW", "DONE"] }
            },
            "required": ["task_id", "new_status"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let task_id = args
            .get("task_id")
            .and_then(|v| v.as_str())
            .ok_or("Validation Error: Missing required field: task_id")?;
        let new_status = args
            .get("new_status")
            .and_then(|v| v.as_str())
            .ok_or("Validation Error: Missing required field: new_status")?;

        match self.store.update_status(task_id, new_status) {
            Ok(true) => {
                let status: TaskStatus = new_status.parse().map_err(|e: AgentError| e.to_string())?;
                Ok(format!("Task {} status updated to {}.", task_id.trim(), status))
            }
            Ok(false) => Ok(format!("Task {} not found; no status changed.", task_id.trim())),
            Err(e) => sentinel(e),
        }
    }
}

pub struct GetValidStatusesTool;

#[async_trait]
impl Tool for GetValidStatusesTool {
    fn name(&self) -> &str {
        "get_valid_statuses"
    }

    fn description(&self) -> &str {
        "Returns the names and descriptions of valid task statuses. Args: {}"
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        let statuses: Vec<Value> = TaskStatus::ALL
            .iter()
            .map(|s| serde_json::json!({"name": s.as_str(), "description": s.description()}))
            .collect();
        serde_json::to_string_pretty(&statuses).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixtures() -> (tempfile::TempDir, Arc<ContextLog>, Arc<TaskRecordStore>) {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(ContextLog::open(dir.path().join("context.md")).unwrap());
        let store = Arc::new(TaskRecordStore::new(dir.path().join("tasks.md")));
        (dir, log, store)
    }

    #[tokio::test]
    async fn test_missing_files_return_sentinel() {
        let (_dir, log, store) = fixtures();
        assert_eq!(
            ReadContextTool::new(log).execute(Value::Null).await.unwrap(),
            "Context file does not exist."
        );
        assert_eq!(
            ReadTasksTool::new(store).execute(Value::Null).await.unwrap(),
            "Task file does not exist."
        );
    }

    #[tokio::test]
    async fn test_add_update_read_flow() {
        let (_dir, _log, store) = fixtures();
        let out = AddTaskRecordTool::new(store.clone())
            .execute(json!({"description": "ship it"}))
            .await
            .unwrap();
        let id = crate::tasks::task_id("ship it");
        assert_eq!(out, format!("Task {} added.", id));

        let update = UpdateTaskStatusTool::new(store.clone());
        assert_eq!(
            update
                .execute(json!({"task_id": id, "new_status": "review"}))
                .await
                .unwrap(),
            format!("Task {} status updated to REVIEW.", id)
        );
        assert!(update
            .execute(json!({"task_id": id, "new_status": "MAYBE"}))
            .await
            .unwrap_err()
            .starts_with("Validation Error"));
        assert_eq!(
            update
                .execute(json!({"task_id": "nope", "new_status": "DONE"}))
                .await
                .unwrap(),
            "Task nope not found; no status changed."
        );

        let listed = ReadTasksTool::new(store).execute(Value::Null).await.unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&listed).unwrap();
        assert_eq!(parsed[0]["status"], "REVIEW");
        assert_eq!(parsed[0]["description"], "ship it");
    }

    #[tokio::test]
    async fn test_valid_statuses_listed() {
        let out = GetValidStatusesTool.execute(Value::Null).await.unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[3]["name"], "DONE");
    }
}
