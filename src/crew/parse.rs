//! LLM 输出解析：工具调用或最终回答
//!
//! 工具调用为 JSON：`{"tool": "write_file", "args": {...}}`，可包在 ```json 代码块里；
//! 其它文本一律视为该任务的最终回答。

use serde::{Deserialize, Serialize};

use crate::core::AgentError;

/// LLM 返回的 Tool Call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

#[derive(Debug, Clone)]
pub enum StepOutput {
    /// 任务完成，给出最终回答
    Response(String),
    ToolCall(ToolCall),
}

/// 解析 LLM 输出
///
/// 回复以 `{` 或 ```json 开头却不是合法 Tool Call 时返回 JsonParseError（让 LLM 重试）；
/// 正文中夹带的 `{...}` 只在能解析成 Tool Call 时才按工具调用处理。
pub fn parse_llm_output(output: &str) -> Result<StepOutput, AgentError> {
    let trimmed = output.trim();

    let (json_str, explicit) = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        (rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim()), true)
    } else if trimmed.starts_with('{') {
        match trimmed.rfind('}') {
            Some(end) => (&trimmed[..=end], true),
            None => (trimmed, true),
        }
    } else if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            (&trimmed[start..=end], false)
        } else {
            return Ok(StepOutput::Response(trimmed.to_string()));
        }
    } else {
        return Ok(StepOutput::Response(trimmed.to_string()));
    };

    match serde_json::from_str::<ToolCall>(json_str) {
        Ok(call) if !call.tool.trim().is_empty() => Ok(StepOutput::ToolCall(call)),
        Ok(_) => Ok(StepOutput::Response(trimmed.to_string())),
        Err(e) if explicit => Err(AgentError::JsonParseError(format!("{}: {}", e, json_str))),
        Err(_) => Ok(StepOutput::Response(trimmed.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_response() {
        match parse_llm_output("true").unwrap() {
            StepOutput::Response(s) => assert_eq!(s, "true"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fenced_tool_call() {
        let out = "I'll write it.\n```json\n{\"tool\": \"write_file\", \"args\": {\"data\": \"a|b\"}}\n```";
        match parse_llm_output(out).unwrap() {
            StepOutput::ToolCall(call) => {
                assert_eq!(call.tool, "write_file");
                assert_eq!(call.args["data"], "a|b");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bare_tool_call_without_args() {
        match parse_llm_output(r#"{"tool": "list_files"}"#).unwrap() {
            StepOutput::ToolCall(call) => {
                assert_eq!(call.tool, "list_files");
                assert!(call.args.is_null());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_broken_json_is_error() {
        assert!(matches!(
            parse_llm_output(r#"{"tool": "read_file", "args": "#),
            Err(AgentError::JsonParseError(_))
        ));
    }

    #[test]
    fn test_prose_with_braces_is_response() {
        let out = "Done. The file contains fn main() { println!(\"hi\") }";
        assert!(matches!(
            parse_llm_output(out).unwrap(),
            StepOutput::Response(_)
        ));
    }
}
