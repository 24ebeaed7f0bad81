//! 上下文日志：context.md
//!
//! 只追加的 Markdown 文件，每个协作周期的执行结果写成一块 `---\n<result>\n`。
//! 文件中第一个分隔行之前的内容（通常是人写的目标说明）视为前言，不计入块数。
//! Planner 每轮都重新读取整个文件作为共享记忆。

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::core::AgentError;

const DELIMITER: &str = "---";

/// 只由空格加分隔符组成的行
fn is_delimiter_like(line: &str) -> bool {
    line.trim_start_matches(' ') == DELIMITER
}

/// 块内与分隔符相同的行前加一个空格，已转义过的行再加一个，保证可逆
fn escape_block(result: &str) -> String {
    result
        .split('\n')
        .map(|line| {
            if is_delimiter_like(line) {
                format!(" {}", line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn unescape_line(line: &str) -> &str {
    if line.starts_with(' ') && is_delimiter_like(line) {
        &line[1..]
    } else {
        line
    }
}

/// 按分隔行切分文件内容，返回 (前言, 块列表)
fn split_blocks(content: &str) -> (String, Vec<String>) {
    let mut preamble = Vec::new();
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    for line in content.lines() {
        if line == DELIMITER {
            blocks.push(Vec::new());
        } else if let Some(current) = blocks.last_mut() {
            current.push(unescape_line(line));
        } else {
            preamble.push(line);
        }
    }
    (
        preamble.join("\n"),
        blocks.into_iter().map(|b| b.join("\n")).collect(),
    )
}

/// 上下文日志；块列表在内存中镜像一份，保证块数只增不减
#[derive(Debug)]
pub struct ContextLog {
    path: PathBuf,
    blocks: Mutex<Vec<String>>,
}

impl ContextLog {
    /// 打开（不存在则视为空）；已有块会被载入
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AgentError> {
        let path = path.into();
        let blocks = if path.exists() {
            split_blocks(&std::fs::read_to_string(&path)?).1
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            blocks: Mutex::new(blocks),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn blocks(&self) -> MutexGuard<'_, Vec<String>> {
        self.blocks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 追加一块：写入 `---\n<result>\n`
    pub fn append(&self, result: &str) -> Result<(), AgentError> {
        let mut blocks = self.blocks();
        if let Some(p) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(p)?;
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(format!("{}\n{}\n", DELIMITER, escape_block(result)).as_bytes())?;
        blocks.push(result.to_string());
        tracing::info!(blocks = blocks.len(), chars = result.len(), "context log appended");
        Ok(())
    }

    /// 读取整个文件；不存在时返回 NotFound
    pub fn read(&self) -> Result<String, AgentError> {
        if !self.path.exists() {
            return Err(AgentError::NotFound("Context file".to_string()));
        }
        Ok(std::fs::read_to_string(&self.path)?)
    }

    /// 读取整个文件；不存在视为空字符串
    pub fn read_or_empty(&self) -> Result<String, AgentError> {
        match self.read() {
            Ok(s) => Ok(s),
            Err(AgentError::NotFound(_)) => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    /// 前言：第一个分隔行之前的内容
    pub fn preamble(&self) -> Result<String, AgentError> {
        Ok(split_blocks(&self.read_or_empty()?).0)
    }

    pub fn block_count(&self) -> usize {
        self.blocks().len()
    }

    pub fn last_block(&self) -> Option<String> {
        self.blocks().last().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_writes_delimited_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let log = ContextLog::open(dir.path().join("context.md")).unwrap();
        log.append("cycle one").unwrap();
        log.append("cycle two").unwrap();
        assert_eq!(log.read().unwrap(), "---\ncycle one\n---\ncycle two\n");
        assert_eq!(log.block_count(), 2);
        assert_eq!(log.last_block().as_deref(), Some("cycle two"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let log = ContextLog::open(dir.path().join("context.md")).unwrap();
        assert!(matches!(log.read(), Err(AgentError::NotFound(_))));
        assert_eq!(log.read_or_empty().unwrap(), "");
        assert_eq!(log.block_count(), 0);
    }

    #[test]
    fn test_reopen_counts_existing_blocks_not_preamble() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.md");
        std::fs::write(&path, "# Objective\nBuild a page\n").unwrap();
        let log = ContextLog::open(&path).unwrap();
        assert_eq!(log.block_count(), 0);
        log.append("multi\nline result").unwrap();

        let reopened = ContextLog::open(&path).unwrap();
        assert_eq!(reopened.block_count(), 1);
        assert_eq!(reopened.last_block().as_deref(), Some("multi\nline result"));
        assert_eq!(reopened.preamble().unwrap(), "# Objective\nBuild a page");
    }

    #[test]
    fn test_delimiter_lines_inside_result_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.md");
        let log = ContextLog::open(&path).unwrap();
        let result = "## Summary\n---\nDone\n ---";
        log.append(result).unwrap();
        log.append("second").unwrap();
        assert_eq!(
            log.read().unwrap(),
            "---\n## Summary\n ---\nDone\n  ---\n---\nsecond\n"
        );

        let reopened = ContextLog::open(&path).unwrap();
        assert_eq!(reopened.block_count(), 2);
        assert_eq!(
            split_blocks(&reopened.read().unwrap()).1[0],
            result
        );
        assert_eq!(reopened.last_block().as_deref(), Some("second"));
    }

    #[test]
    fn test_block_count_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let log = ContextLog::open(dir.path().join("nested/context.md")).unwrap();
        let mut last = log.block_count();
        for i in 0..4 {
            log.append(&format!("block {}", i)).unwrap();
            assert!(log.block_count() > last);
            last = log.block_count();
        }
    }
}
