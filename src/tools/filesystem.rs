//! 沙箱文件系统工具
//!
//! WorkDir 绑定 root，并持有一个显式的「当前目录」（不修改进程 cwd）；同一个 Crew 的文件工具共享同一个 WorkDir。
//! 所有路径相对当前目录解析，做词法规整后必须仍在 root 下（禁止 ../ 逃逸）。
//! 受保护路径（上下文日志、任务记录文件）对所有会修改文件的工具只读。
//! 工具失败时返回描述性字符串，不会中断调用方。

use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::core::AgentError;
use crate::tools::registry::{single_string_schema, string_arg};
use crate::tools::Tool;

/// 规整路径中的 `.` 与 `..`（不访问文件系统，目标可以不存在）
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// 显式工作目录：root 为沙箱根，cwd 由 change_directory 修改
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
    cwd: Arc<Mutex<PathBuf>>,
    protected: Arc<Vec<PathBuf>>,
}

impl WorkDir {
    /// root 不存在时创建
    pub fn new(root: impl AsRef<Path>) -> Result<Self, AgentError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let root = root.canonicalize()?;
        Ok(Self {
            cwd: Arc::new(Mutex::new(root.clone())),
            root,
            protected: Arc::new(Vec::new()),
        })
    }

    /// 登记受保护路径；须在把 WorkDir 交给工具之前调用
    pub fn with_protected(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut protected = self.protected.as_ref().clone();
        protected.extend(paths.into_iter().map(|p| normalize(&p)));
        self.protected = Arc::new(protected);
        self
    }

    pub fn is_protected(&self, path: &Path) -> bool {
        self.protected.iter().any(|p| p == path)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current(&self) -> PathBuf {
        self.cwd
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 相对 base 解析并校验在沙箱内
    fn resolve_from(&self, base: &Path, path: &str) -> Result<PathBuf, AgentError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(AgentError::validation("Path cannot be empty"));
        }
        let joined = if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            base.join(path)
        };
        let normalized = normalize(&joined);
        if normalized.starts_with(&self.root) {
            Ok(normalized)
        } else {
            Err(AgentError::PathEscape(path.to_string()))
        }
    }

    /// 相对当前目录解析
    pub fn resolve(&self, path: &str) -> Result<PathBuf, AgentError> {
        self.resolve_from(&self.current(), path)
    }

    /// 相对沙箱根解析
    pub fn resolve_from_root(&self, path: &str) -> Result<PathBuf, AgentError> {
        self.resolve_from(&self.root, path)
    }

    fn check_writable(&self, target: PathBuf, path: &str) -> Result<PathBuf, AgentError> {
        if self.is_protected(&target) {
            Err(AgentError::ProtectedPath(path.trim().to_string()))
        } else {
            Ok(target)
        }
    }

    /// 相对当前目录解析出可写的目标
    pub fn resolve_writable(&self, path: &str) -> Result<PathBuf, AgentError> {
        let target = self.resolve(path)?;
        self.check_writable(target, path)
    }

    /// 切换当前目录；目标必须是已存在的目录
    pub fn change_dir(&self, path: &str) -> Result<PathBuf, AgentError> {
        let target = self.resolve(path)?;
        if !target.is_dir() {
            return Err(AgentError::ToolExecutionFailed(format!(
                "Not a directory: {}",
                path.trim()
            )));
        }
        *self
            .cwd
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = target.clone();
        Ok(target)
    }
}

fn path_schema() -> Value {
    single_string_schema("path", "path relative to the current directory")
}

fn no_args_schema() -> Value {
    serde_json::json!({"type": "object", "properties": {}, "required": []})
}

/// 校验错误原样输出，其它错误加上操作前缀
fn describe(op: &str, e: AgentError) -> String {
    match e {
        AgentError::Validation(_) => e.to_string(),
        other => format!("Error {}: {}", op, other),
    }
}

pub struct GetCurrentDirectoryTool {
    dir: WorkDir,
}

impl GetCurrentDirectoryTool {
    pub fn new(dir: WorkDir) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl Tool for GetCurrentDirectoryTool {
    fn name(&self) -> &str {
        "get_current_directory"
    }

    fn description(&self) -> &str {
        "Returns the current working directory. Args: {}"
    }

    fn parameters_schema(&self) -> Value {
        no_args_schema()
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        Ok(format!("Current directory: {}", self.dir.current().display()))
    }
}

pub struct ChangeDirectoryTool {
    dir: WorkDir,
}

impl ChangeDirectoryTool {
    pub fn new(dir: WorkDir) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl Tool for ChangeDirectoryTool {
    fn name(&self) -> &str {
        "change_directory"
    }

    fn description(&self) -> &str {
        "Changes the current working directory to the given path. Args: {\"path\": \"dir\"}"
    }

    fn parameters_schema(&self) -> Value {
        path_schema()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let path = string_arg(&args, "path").unwrap_or("");
        tracing::info!(path = %path, "change_directory tool execute");
        self.dir
            .change_dir(path)
            .map(|_| format!("Changed directory to {}.", path.trim()))
            .map_err(|e| describe("changing directory", e))
    }
}

pub struct CreateDirectoryTool {
    dir: WorkDir,
}

impl CreateDirectoryTool {
    pub fn new(dir: WorkDir) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl Tool for CreateDirectoryTool {
    fn name(&self) -> &str {
        "create_directory"
    }

    fn description(&self) -> &str {
        "Creates a new directory (and missing parents) at the specified path. Args: {\"path\": \"dir\"}"
    }

    fn parameters_schema(&self) -> Value {
        path_schema()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let path = string_arg(&args, "path").unwrap_or("");
        let run = || -> Result<(), AgentError> {
            let target = self.dir.resolve_writable(path)?;
            std::fs::create_dir_all(target)?;
            Ok(())
        };
        run()
            .map(|_| format!("Directory '{}' created successfully.", path.trim()))
            .map_err(|e| describe("creating directory", e))
    }
}

/// touch：不存在则创建空文件，存在则不改内容
pub struct CreateFileTool {
    dir: WorkDir,
}

impl CreateFileTool {
    pub fn new(dir: WorkDir) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl Tool for CreateFileTool {
    fn name(&self) -> &str {
        "create_file"
    }

    fn description(&self) -> &str {
        "Equivalent to the Unix 'touch' command. Creates an empty file if it does not exist; existing content is left unchanged. Args: {\"path\": \"file\"}"
    }

    fn parameters_schema(&self) -> Value {
        path_schema()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let path = string_arg(&args, "path").unwrap_or("");
        let run = || -> Result<(), AgentError> {
            let target = self.dir.resolve_writable(path)?;
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(target)?;
            Ok(())
        };
        run()
            .map(|_| format!("File '{}' touched successfully.", path.trim()))
            .map_err(|e| describe("touching file", e))
    }
}

pub struct CheckIfFileExistsTool {
    dir: WorkDir,
}

impl CheckIfFileExistsTool {
    pub fn new(dir: WorkDir) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl Tool for CheckIfFileExistsTool {
    fn name(&self) -> &str {
        "check_if_file_exists"
    }

    fn description(&self) -> &str {
        "Checks if a file or directory exists at the specified path. Args: {\"path\": \"path\"}"
    }

    fn parameters_schema(&self) -> Value {
        path_schema()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let path = string_arg(&args, "path").unwrap_or("");
        let target = self
            .dir
            .resolve(path)
            .map_err(|e| describe("checking path", e))?;
        let label = if target.exists() {
            "Exists"
        } else {
            "Does not exist"
        };
        Ok(format!("{}: {}", label, path.trim()))
    }
}

/// 只列当前目录
pub struct ListFilesTool {
    dir: WorkDir,
}

impl ListFilesTool {
    pub fn new(dir: WorkDir) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "Lists files in the current working directory. Args: {}"
    }

    fn parameters_schema(&self) -> Value {
        no_args_schema()
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        let cwd = self.dir.current();
        let mut names = Vec::new();
        let entries = std::fs::read_dir(&cwd).map_err(|e| format!("Error listing files: {}", e))?;
        for entry in entries {
            let entry = entry.map_err(|e| format!("Error listing files: {}", e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            let suffix = if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                "/"
            } else {
                ""
            };
            names.push(format!("{}{}", name, suffix));
        }
        names.sort();
        Ok(format!("Files in the current directory: {}", names.join(", ")))
    }
}

pub struct ReadFileTool {
    dir: WorkDir,
}

impl ReadFileTool {
    pub fn new(dir: WorkDir) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Reads the whole content of a file at the given path. Args: {\"path\": \"file\"}"
    }

    fn parameters_schema(&self) -> Value {
        path_schema()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let path = string_arg(&args, "path").unwrap_or("");
        tracing::info!(path = %path, "read_file tool execute");
        let run = || -> Result<String, AgentError> {
            let target = self.dir.resolve(path)?;
            Ok(std::fs::read_to_string(target)?)
        };
        run().map_err(|e| describe("reading file", e))
    }
}

/// 追加一行：data + "\n"
pub struct AppendToFileTool {
    dir: WorkDir,
}

impl AppendToFileTool {
    pub fn new(dir: WorkDir) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl Tool for AppendToFileTool {
    fn name(&self) -> &str {
        "append_to_file"
    }

    fn description(&self) -> &str {
        "Appends text (plus a newline) to a file. Args: {\"filename\": \"file\", \"data\": \"text\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "filename": { "type": "string" },
                "data": { "type": "string" }
            },
            "required": ["filename", "data"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let filename = args
            .get("filename")
            .and_then(|v| v.as_str())
            .ok_or("Validation Error: Missing required field: filename")?;
        let data = args
            .get("data")
            .and_then(|v| v.as_str())
            .ok_or("Validation Error: Missing required field: data")?;

        let run = || -> Result<(), AgentError> {
            let target = self.dir.resolve_writable(filename)?;
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(target)?
                .write_all(format!("{}\n", data).as_bytes())?;
            Ok(())
        };
        run()
            .map(|_| format!("Appended content to {}.", filename.trim()))
            .map_err(|e| describe("appending to file", e))
    }
}

/// write_file 的输入：单个字符串 `path|content`
#[derive(Debug, PartialEq, Eq)]
pub struct WriteRequest {
    pub path: String,
    pub content: String,
}

impl WriteRequest {
    /// 按第一个 `|` 切分；没有分隔符或路径为空时返回 Validation 错误。路径中的反引号会被去掉。
    pub fn parse(data: &str) -> Result<Self, AgentError> {
        let (path, content) = data.split_once('|').ok_or_else(|| {
            AgentError::validation("Data must contain a path and content separated by '|'")
        })?;
        let path = path.trim().replace('`', "");
        if path.is_empty() {
            return Err(AgentError::validation("Path cannot be empty"));
        }
        Ok(Self {
            path,
            content: content.to_string(),
        })
    }
}

/// 写文件（覆盖）：相对路径统一放到沙箱根下的命名空间目录（默认 context/）
pub struct WriteFileTool {
    dir: WorkDir,
    namespace: String,
}

impl WriteFileTool {
    pub fn new(dir: WorkDir, namespace: impl Into<String>) -> Self {
        Self {
            dir,
            namespace: namespace.into(),
        }
    }

    /// 相对路径加命名空间前缀（已带前缀的不重复加）
    fn namespaced(&self, path: &str) -> String {
        if Path::new(path).is_absolute() {
            return path.to_string();
        }
        let stripped = path.trim_start_matches("./");
        let ns = self.namespace.trim_matches('/');
        if ns.is_empty() || stripped == ns || stripped.starts_with(&format!("{}/", ns)) {
            stripped.to_string()
        } else {
            format!("{}/{}", ns, stripped)
        }
    }

    fn write(&self, data: &str) -> Result<String, AgentError> {
        let req = WriteRequest::parse(data)?;
        let rel = self.namespaced(&req.path);
        let target = self.dir.resolve_from_root(&rel)?;
        // 相对路径规整后必须仍在命名空间目录内
        let ns = self.namespace.trim_matches('/');
        if !Path::new(&req.path).is_absolute()
            && !ns.is_empty()
            && !target.starts_with(self.dir.root().join(ns))
        {
            return Err(AgentError::PathEscape(req.path));
        }
        let target = self.dir.check_writable(target, &rel)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, req.content)?;
        Ok(rel)
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Writes content to a file, replacing it. Args: {\"data\": \"path|content\"}; relative paths are placed under the context directory."
    }

    fn parameters_schema(&self) -> Value {
        single_string_schema("data", "path and content separated by '|'")
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let data = string_arg(&args, "data").unwrap_or("");
        tracing::info!(chars = data.len(), "write_file tool execute");
        self.write(data)
            .map(|rel| format!("File written to {}.", rel))
            .map_err(|e| describe("writing file", e))
    }
}
