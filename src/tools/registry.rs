//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / execute），由 ToolRegistry 按名注册与查找，
//! ToolExecutor 在调用时加超时、检查角色权限并统一转 AgentError。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、异步执行（args 为 JSON）
///
/// 执行失败也只返回字符串（Err 中是给调用方看的错误说明），不会 panic。
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（用于 JSON 中的 "tool" 字段）
    fn name(&self) -> &str;

    /// 工具描述（供 LLM 理解功能）
    fn description(&self) -> &str;

    /// 参数 JSON Schema；默认无参数
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String>;
}

/// 取字符串参数：args 为对象时取 key 字段，args 本身是字符串时直接用
pub fn string_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    match args {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get(key).and_then(|v| v.as_str()),
        _ => None,
    }
}

/// 生成单个字符串参数的 schema
pub fn single_string_schema(key: &str, description: &str) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": { key: { "type": "string", "description": description } },
        "required": [key]
    })
}

/// 工具注册表：按名称存储 Arc<dyn Tool>（有序，便于生成稳定的 prompt）
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<String, String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| format!("Unknown tool: {name}"))?;
        tool.execute(args).await
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// 只包含 names 中的工具的 schema JSON（供某个角色的 system prompt 使用）
    pub fn schema_json_for(&self, names: &[String]) -> String {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .filter(|(name, _)| names.iter().any(|n| n == *name))
            .map(|(name, tool)| {
                serde_json::json!({
                    "name": name,
                    "description": tool.description(),
                    "parameters": tool.parameters_schema()
                })
            })
            .collect();
        serde_json::to_string_pretty(&tools).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo text"
        }

        async fn execute(&self, args: Value) -> Result<String, String> {
            Ok(string_arg(&args, "text").unwrap_or("(empty)").to_string())
        }
    }

    #[test]
    fn test_string_arg_accepts_object_or_string() {
        let obj = serde_json::json!({"path": "a.txt"});
        assert_eq!(string_arg(&obj, "path"), Some("a.txt"));
        let raw = serde_json::json!("b.txt");
        assert_eq!(string_arg(&raw, "path"), Some("b.txt"));
        assert_eq!(string_arg(&serde_json::json!(3), "path"), None);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error() {
        let mut reg = ToolRegistry::new();
        reg.register(Echo);
        assert_eq!(
            reg.execute("echo", serde_json::json!({"text": "hi"})).await,
            Ok("hi".to_string())
        );
        assert!(reg.execute("rm", Value::Null).await.is_err());
    }

    #[test]
    fn test_schema_filtered_by_names() {
        let mut reg = ToolRegistry::new();
        reg.register(Echo);
        assert_eq!(reg.schema_json_for(&[]), "[]");
        assert!(reg.schema_json_for(&["echo".to_string()]).contains("Echo text"));
    }
}
