//! 错误类型
//!
//! 工具边界上所有错误都会被转成字符串返回给调用方（LLM 需要文本回复）；
//! 协作循环内部与 Crew 调度失败则以 AgentError 向上传播。

use thiserror::Error;

/// 协作系统运行过程中可能出现的错误（校验、资源缺失、I/O、LLM、工具等）
#[derive(Error, Debug)]
pub enum AgentError {
    /// 工具或账本的输入不合法（空路径、缺少分隔符、未知状态、未知角色等）
    #[error("Validation Error: {0}")]
    Validation(String),

    /// 上下文文件 / 任务文件不存在；调用方应视为「空」而非致命错误
    #[error("{0} does not exist")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    /// LLM 请求了不存在或当前角色无权使用的工具
    #[error("Hallucinated tool: {0}")]
    HallucinatedTool(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Path escape attempt: {0}")]
    PathEscape(String),

    /// 上下文日志与任务记录文件只能经由各自的存储修改，文件工具不可写
    #[error("Protected path: {0}")]
    ProtectedPath(String),
}

impl AgentError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let e = AgentError::validation("Path cannot be empty");
        assert_eq!(e.to_string(), "Validation Error: Path cannot be empty");
    }

    #[test]
    fn test_not_found_reads_as_sentinel() {
        let e = AgentError::NotFound("Task file".into());
        assert_eq!(e.to_string(), "Task file does not exist");
    }
}
