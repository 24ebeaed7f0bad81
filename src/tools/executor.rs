//! 工具执行器
//!
//! 持有 ToolRegistry 与全局超时，execute(tool_name, args, allowed) 先检查调用方角色是否有权使用该工具，
//! 再在超时内调用 registry.execute；超时或失败时转为 AgentError；每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::AgentError;
use crate::tools::ToolRegistry;

/// 工具执行器：对每次调用施加超时，并将结果映射为 AgentError
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 执行指定工具；tool_name 不在 allowed 中或未注册时返回 HallucinatedTool
    pub async fn execute(
        &self,
        tool_name: &str,
        args: serde_json::Value,
        allowed: &[String],
    ) -> Result<String, AgentError> {
        if !allowed.iter().any(|t| t == tool_name) || !self.registry.contains(tool_name) {
            tracing::warn!(tool = %tool_name, "tool not available for this role");
            return Err(AgentError::HallucinatedTool(tool_name.to_string()));
        }

        let start = Instant::now();
        let args_preview = args_preview(&args);
        let result = timeout(self.timeout, self.registry.execute(tool_name, args)).await;

        let (ok, outcome): (bool, &str) = match &result {
            Ok(Ok(_)) => (true, "ok"),
            Ok(Err(_)) => (false, "error"),
            Err(_) => (false, "timeout"),
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": duration_ms,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        match result {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(e)) => Err(AgentError::ToolExecutionFailed(e)),
            Err(_) => Err(AgentError::ToolTimeout(tool_name.to_string())),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.len() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::Value;

    struct Slow;

    #[async_trait]
    impl Tool for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Sleeps"
        }

        async fn execute(&self, _args: Value) -> Result<String, String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".into())
        }
    }

    struct Failing;

    #[async_trait]
    impl Tool for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        async fn execute(&self, _args: Value) -> Result<String, String> {
            Err("Validation Error: Path cannot be empty".into())
        }
    }

    fn executor() -> ToolExecutor {
        let mut reg = ToolRegistry::new();
        reg.register(Slow);
        reg.register(Failing);
        ToolExecutor {
            registry: reg,
            timeout: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn test_disallowed_tool_is_hallucinated() {
        let exec = executor();
        let err = exec
            .execute("failing", Value::Null, &["slow".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::HallucinatedTool(_)));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_tool_timeout() {
        let exec = executor();
        let err = exec
            .execute("slow", Value::Null, &["slow".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolTimeout(_)));
    }

    #[tokio::test]
    async fn test_tool_error_string_is_kept() {
        let exec = executor();
        let err = exec
            .execute("failing", Value::Null, &["failing".to_string()])
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Tool execution failed: Validation Error: Path cannot be empty"
        );
    }
}
