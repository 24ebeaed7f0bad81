//! Mock LLM 客户端（无 API Key 时使用）
//!
//! 不调用任何工具：Decider / 评审类提示一律回答 "false"，其它任务回显最后一条 User 消息的首行，
//! 因此协作循环会一直跑到 max_cycles 后以 Inconclusive 结束，便于本地走通流程。

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::{Message, Role};

/// Mock 客户端
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        if last_user.contains("only return true or false") {
            return Ok("false".to_string());
        }
        let first_line = last_user.lines().next().unwrap_or_default();
        Ok(format!("Mock result for: {}", first_line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_answers_false_to_verdict() {
        let out = MockLlmClient
            .complete(&[Message::user(
                "You are a computer program that can only return true or false.",
            )])
            .await
            .unwrap();
        assert_eq!(out, "false");
    }

    #[tokio::test]
    async fn test_mock_echoes_first_line() {
        let out = MockLlmClient
            .complete(&[Message::user("write 4 to result.txt\nmore")])
            .await
            .unwrap();
        assert_eq!(out, "Mock result for: write 4 to result.txt");
    }
}
