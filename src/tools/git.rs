//! Git 工具：git_status / git_branch / git_diff / git_log / git_commit
//!
//! 在 WorkDir 的当前目录下以 argv 方式调用 git（不经过 shell），失败时返回 stderr。

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use crate::tools::filesystem::WorkDir;
use crate::tools::registry::single_string_schema;
use crate::tools::Tool;

/// 只读子命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitQuery {
    Status,
    Branch,
    Diff,
}

impl GitQuery {
    fn tool_name(self) -> &'static str {
        match self {
            GitQuery::Status => "git_status",
            GitQuery::Branch => "git_branch",
            GitQuery::Diff => "git_diff",
        }
    }

    fn subcommand(self) -> &'static str {
        match self {
            GitQuery::Status => "status",
            GitQuery::Branch => "branch",
            GitQuery::Diff => "diff",
        }
    }

    fn description(self) -> &'static str {
        match self {
            GitQuery::Status => "Displays the working tree status. Args: {}",
            GitQuery::Branch => "Lists all local branches. Args: {}",
            GitQuery::Diff => "Shows unstaged changes in the working tree. Args: {}",
        }
    }
}

async fn run_git(dir: &WorkDir, args: &[&str]) -> Result<String, String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir.current())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| format!("Failed to run git: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("Error executing command: {}", stderr.trim()));
    }
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if stdout.trim().is_empty() {
        Ok("Command executed successfully.".to_string())
    } else {
        Ok(stdout)
    }
}

pub struct GitQueryTool {
    dir: WorkDir,
    query: GitQuery,
}

impl GitQueryTool {
    pub fn new(dir: WorkDir, query: GitQuery) -> Self {
        Self { dir, query }
    }
}

#[async_trait]
impl Tool for GitQueryTool {
    fn name(&self) -> &str {
        self.query.tool_name()
    }

    fn description(&self) -> &str {
        self.query.description()
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        run_git(&self.dir, &[self.query.subcommand()]).await
    }
}

pub struct GitLogTool {
    dir: WorkDir,
}

impl GitLogTool {
    pub fn new(dir: WorkDir) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl Tool for GitLogTool {
    fn name(&self) -> &str {
        "git_log"
    }

    fn description(&self) -> &str {
        "Shows the commit log. Args: {\"n\": 10, \"oneline\": true} (both optional; n=0 means no limit)"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "n": { "type": "integer", "minimum": 0 },
                "oneline": { "type": "boolean" }
            },
            "required": []
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let n = args.get("n").and_then(|v| v.as_u64()).unwrap_or(0);
        let oneline = args.get("oneline").and_then(|v| v.as_bool()).unwrap_or(false);
        let git_args = log_args(n, oneline);
        let git_args: Vec<&str> = git_args.iter().map(String::as_str).collect();
        run_git(&self.dir, &git_args).await
    }
}

/// n 为 0 时不限制条数
fn log_args(n: u64, oneline: bool) -> Vec<String> {
    let mut args = vec!["log".to_string()];
    if n > 0 {
        args.push("-n".to_string());
        args.push(n.to_string());
    }
    if oneline {
        args.push("--oneline".to_string());
    }
    args
}

/// 暂存全部改动并提交
pub struct GitCommitTool {
    dir: WorkDir,
}

impl GitCommitTool {
    pub fn new(dir: WorkDir) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl Tool for GitCommitTool {
    fn name(&self) -> &str {
        "git_commit"
    }

    fn description(&self) -> &str {
        "Stages all changes and creates a commit with the given message. Args: {\"message\": \"commit message\"}"
    }

    fn parameters_schema(&self) -> Value {
        single_string_schema("message", "commit message")
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let message = crate::tools::registry::string_arg(&args, "message")
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or("Validation Error: Missing required field: message")?;
        tracing::info!(message = %message, "git_commit tool execute");
        run_git(&self.dir, &["add", "-A"]).await?;
        run_git(&self.dir, &["commit", "-m", message]).await
    }
}
