//! 文件任务记录：tasks.md
//!
//! 每行一条：`- [<STATUS>] <taskId>: <description>`，taskId 为描述的 SHA-256（hex）。
//! 新增时追加一行；更新状态时整体重写文件，只替换匹配行的状态标记，其它行原样保留。
//! 不匹配格式的行在读取时忽略。

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::AgentError;

/// 任务状态；任意状态之间都可以互相切换，由调用方决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Todo,
    Active,
    Review,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::Active,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::Active => "ACTIVE",
            TaskStatus::Review => "REVIEW",
            TaskStatus::Done => "DONE",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TaskStatus::Todo => "A task that needs to be completed",
            TaskStatus::Active => "A task being actively worked on",
            TaskStatus::Review => "A task that needs human review (causing errors, need more info)",
            TaskStatus::Done => "A task that is completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TODO" => Ok(TaskStatus::Todo),
            "ACTIVE" => Ok(TaskStatus::Active),
            "REVIEW" => Ok(TaskStatus::Review),
            "DONE" => Ok(TaskStatus::Done),
            _ => Err(AgentError::validation(format!(
                "Invalid status: {}, must be one of [TODO, ACTIVE, REVIEW, DONE]",
                s.trim()
            ))),
        }
    }
}

/// tasks.md 中的一条记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub status: TaskStatus,
    pub description: String,
}

/// 描述的稳定 ID：SHA-256 hex（同描述同 ID）
pub fn task_id(description: &str) -> String {
    format!("{:x}", Sha256::digest(description.as_bytes()))
}

fn record_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^- \[([A-Za-z]+)\] ([^\s:]+): (.*)$").expect("record line regex is valid")
    })
}

/// 解析单行；格式或状态不对时返回 None
fn parse_line(line: &str) -> Option<TaskRecord> {
    let caps = record_line_re().captures(line)?;
    let status = caps[1].parse::<TaskStatus>().ok()?;
    Some(TaskRecord {
        id: caps[2].to_string(),
        status,
        description: caps[3].to_string(),
    })
}

/// 文件任务记录存储；内部锁串行化同一实例上的读改写
#[derive(Debug)]
pub struct TaskRecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TaskRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 追加一条 TODO 记录，返回 taskId；不做去重
    pub fn add_task(&self, description: &str) -> Result<String, AgentError> {
        if description.trim().is_empty() {
            return Err(AgentError::validation("Task description cannot be empty"));
        }
        if description.contains(['\n', '\r']) {
            return Err(AgentError::validation(
                "Task description must be a single line",
            ));
        }
        let id = task_id(description);
        let _guard = self.lock();
        if let Some(p) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(p)?;
        }
        let line = format!("- [{}] {}: {}\n", TaskStatus::Todo, id, description);
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(line.as_bytes())?;
        tracing::info!(task_id = %id, "task record added");
        Ok(id)
    }

    /// 读取全部记录；文件不存在时返回 NotFound
    pub fn read_tasks(&self) -> Result<Vec<TaskRecord>, AgentError> {
        if !self.path.exists() {
            return Err(AgentError::NotFound("Task file".to_string()));
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(content.lines().filter_map(parse_line).collect())
    }

    /// 更新状态；status 非法时不写文件。返回是否有记录被匹配，未匹配时同样不写文件。
    pub fn update_status(&self, task_id: &str, new_status: &str) -> Result<bool, AgentError> {
        let status: TaskStatus = new_status.parse()?;
        let task_id = task_id.trim();
        if task_id.is_empty() {
            return Err(AgentError::validation("task_id cannot be empty"));
        }

        let _guard = self.lock();
        if !self.path.exists() {
            return Err(AgentError::NotFound("Task file".to_string()));
        }
        let content = std::fs::read_to_string(&self.path)?;

        let mut matched = false;
        let mut rewritten = String::with_capacity(content.len());
        for raw in content.split_inclusive('\n') {
            let (line, ending) = match raw.strip_suffix('\n') {
                Some(l) => (l, "\n"),
                None => (raw, ""),
            };
            match parse_line(line) {
                Some(record) if record.id == task_id => {
                    matched = true;
                    rewritten.push_str(&format!(
                        "- [{}] {}: {}{}",
                        status, record.id, record.description, ending
                    ));
                }
                _ => rewritten.push_str(raw),
            }
        }

        if matched {
            std::fs::write(&self.path, rewritten)?;
            tracing::info!(task_id = %task_id, status = %status, "task status updated");
        } else {
            tracing::warn!(task_id = %task_id, "update_status: no record with this id");
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, TaskRecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskRecordStore::new(dir.path().join("tasks.md"));
        (dir, store)
    }

    #[test]
    fn test_add_then_read_single_todo() {
        let (_dir, store) = store();
        let id = store.add_task("write the README").unwrap();
        let records = store.read_tasks().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].status, TaskStatus::Todo);
        assert_eq!(records[0].description, "write the README");
    }

    #[test]
    fn test_description_with_colon_roundtrips() {
        let (_dir, store) = store();
        store.add_task("fix: parser drops trailing: colons").unwrap();
        let records = store.read_tasks().unwrap();
        assert_eq!(records[0].description, "fix: parser drops trailing: colons");
    }

    #[test]
    fn test_task_id_is_stable() {
        assert_eq!(task_id("a"), task_id("a"));
        assert_ne!(task_id("a"), task_id("b"));
        assert_eq!(task_id("a").len(), 64);
    }

    #[test]
    fn test_duplicate_description_appends_twice() {
        let (_dir, store) = store();
        let a = store.add_task("same").unwrap();
        let b = store.add_task("same").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.read_tasks().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(store.read_tasks(), Err(AgentError::NotFound(_))));
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let (_dir, store) = store();
        std::fs::write(
            store.path(),
            "# Tasks\n- [TODO] abc: keep me\nrandom text\n- [MAYBE] def: bad status\n",
        )
        .unwrap();
        let records = store.read_tasks().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "abc");
    }

    #[test]
    fn test_update_normalizes_and_preserves_other_lines() {
        let (_dir, store) = store();
        let first = store.add_task("first").unwrap();
        store.add_task("second").unwrap();
        let mut before = std::fs::read_to_string(store.path()).unwrap();
        before.push_str("a stray note\n");
        std::fs::write(store.path(), &before).unwrap();

        assert!(store.update_status(&first, "done").unwrap());

        let after = std::fs::read_to_string(store.path()).unwrap();
        let before_lines: Vec<&str> = before.lines().collect();
        let after_lines: Vec<&str> = after.lines().collect();
        assert_eq!(after_lines[0], format!("- [DONE] {}: first", first));
        assert_eq!(&after_lines[1..], &before_lines[1..]);
        assert!(after.ends_with('\n'));
    }

    #[test]
    fn test_invalid_status_does_not_write() {
        let (_dir, store) = store();
        let id = store.add_task("task").unwrap();
        let before = std::fs::read(store.path()).unwrap();
        let err = store.update_status(&id, "MAYBE").unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_unknown_id_reports_no_match() {
        let (_dir, store) = store();
        store.add_task("task").unwrap();
        let before = std::fs::read(store.path()).unwrap();
        assert!(!store.update_status("deadbeef", "ACTIVE").unwrap());
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_multiline_description_rejected() {
        let (_dir, store) = store();
        assert!(store.add_task("line one\nline two").is_err());
        assert!(store.add_task("").is_err());
    }
}
