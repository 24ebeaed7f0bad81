//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `CREW__*` 覆盖（双下划线表示嵌套，如 `CREW__COORDINATION__MAX_CYCLES=5`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::tasks::TaskRole;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub tools: ToolsSection,
    #[serde(default)]
    pub coordination: CoordinationSection,
}

/// [app] 段：应用名、工作目录
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 沙箱根目录，未设置时用 ./workspace
    pub workspace_root: Option<PathBuf>,
}

impl AppSection {
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("workspace"))
    }
}

/// [llm] 段：后端选择
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：openai / mock；无 OPENAI_API_KEY 时退回 mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// 单个任务内最多几轮「LLM -> 工具 -> 观察」
    #[serde(default = "default_max_tool_steps")]
    pub max_tool_steps: usize,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            max_tool_steps: default_max_tool_steps(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tool_steps() -> usize {
    8
}

/// [tools] 段：工具超时、write_file 命名空间
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒）
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    /// write_file 对相对路径自动加的前缀目录
    #[serde(default = "default_write_namespace")]
    pub write_namespace: String,
    /// 是否注册 git 工具
    #[serde(default = "default_enable_git")]
    pub enable_git: bool,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout_secs(),
            write_namespace: default_write_namespace(),
            enable_git: default_enable_git(),
        }
    }
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_write_namespace() -> String {
    "context".to_string()
}

fn default_enable_git() -> bool {
    true
}

/// [coordination] 段：循环上限、上下文 / 任务文件、评审角色
#[derive(Debug, Clone, Deserialize)]
pub struct CoordinationSection {
    /// 命令行未给出目标时使用
    pub objective: Option<String>,
    #[serde(default = "default_max_cycles")]
    pub max_cycles: usize,
    /// 整个循环的墙钟上限（秒），0 表示不限制
    #[serde(default)]
    pub max_duration_secs: u64,
    /// 相对 workspace_root
    #[serde(default = "default_context_file")]
    pub context_file: PathBuf,
    /// 相对 workspace_root
    #[serde(default = "default_task_file")]
    pub task_file: PathBuf,
    /// 给出 true/false 结论的角色：reviewer 或 decider
    #[serde(default = "default_verdict_role")]
    pub verdict_role: String,
}

impl Default for CoordinationSection {
    fn default() -> Self {
        Self {
            objective: None,
            max_cycles: default_max_cycles(),
            max_duration_secs: 0,
            context_file: default_context_file(),
            task_file: default_task_file(),
            verdict_role: default_verdict_role(),
        }
    }
}

impl CoordinationSection {
    pub fn max_duration(&self) -> Option<Duration> {
        (self.max_duration_secs > 0).then(|| Duration::from_secs(self.max_duration_secs))
    }

    /// 解析 verdict_role；只接受 reviewer / decider
    pub fn verdict_role(&self) -> Result<TaskRole, config::ConfigError> {
        match self.verdict_role.parse::<TaskRole>() {
            Ok(role @ (TaskRole::Reviewer | TaskRole::Decider)) => Ok(role),
            _ => Err(config::ConfigError::Message(format!(
                "coordination.verdict_role must be reviewer or decider, got '{}'",
                self.verdict_role
            ))),
        }
    }
}

fn default_max_cycles() -> usize {
    10
}

fn default_context_file() -> PathBuf {
    PathBuf::from("context.md")
}

fn default_task_file() -> PathBuf {
    PathBuf::from("tasks.md")
}

fn default_verdict_role() -> String {
    "reviewer".to_string()
}

/// 从 config 目录加载配置，环境变量 CREW__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 CREW__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CREW")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.coordination.max_cycles, 10);
        assert_eq!(cfg.coordination.max_duration(), None);
        assert_eq!(cfg.tools.write_namespace, "context");
        assert_eq!(cfg.app.workspace_root(), PathBuf::from("workspace"));
    }

    #[test]
    fn test_verdict_role_restricted() {
        let mut section = CoordinationSection::default();
        assert_eq!(section.verdict_role().unwrap(), TaskRole::Reviewer);
        section.verdict_role = "Decider".into();
        assert_eq!(section.verdict_role().unwrap(), TaskRole::Decider);
        section.verdict_role = "executor".into();
        assert!(section.verdict_role().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[coordination]\nmax_cycles = 3\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.coordination.max_cycles, 3);
        assert_eq!(cfg.coordination.context_file, PathBuf::from("context.md"));
        assert_eq!(cfg.llm.max_tool_steps, 8);
    }
}
