//! 编排：按配置装配 LLM、工具、角色表与协作循环
//!
//! 工作目录、账本、上下文日志与任务记录都是显式句柄，由这里创建并分发给工具和循环。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::coordination::{CoordinationLoop, LoopConfig};
use crate::core::AgentError;
use crate::crew::{LlmCrew, Roster};
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient};
use crate::memory::ContextLog;
use crate::tasks::{TaskLedger, TaskRecordStore};
use crate::tools::{build_registry, ToolContext, ToolExecutor, WorkDir};

/// 根据配置与环境变量选择 LLM 后端（OpenAI 兼容 / Mock）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let api_key = std::env::var("OPENAI_API_KEY").ok();

    match api_key {
        Some(key) if provider != "mock" => {
            tracing::info!(model = %cfg.llm.model, "Using OpenAI-compatible LLM");
            Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                &cfg.llm.model,
                Some(&key),
            ))
        }
        _ => {
            tracing::warn!("No API key set or provider is mock, using Mock LLM");
            Arc::new(MockLlmClient)
        }
    }
}

fn under(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// 装配好的运行时：循环本身加上各共享句柄（测试与 CLI 输出用）
pub struct CrewRuntime {
    pub llm: Arc<dyn LlmClient>,
    pub workdir: WorkDir,
    pub ledger: Arc<TaskLedger>,
    pub context_log: Arc<ContextLog>,
    pub records: Arc<TaskRecordStore>,
    pub coordination: CoordinationLoop,
}

/// 用给定 LLM 装配运行时；取消令牌由调用方持有
pub fn build_runtime_with_llm(
    cfg: &AppConfig,
    llm: Arc<dyn LlmClient>,
    cancel_token: CancellationToken,
) -> Result<CrewRuntime, AgentError> {
    let workdir = WorkDir::new(cfg.app.workspace_root())?;
    let root = workdir.root().to_path_buf();
    tracing::info!(workspace = %root.display(), "workspace ready");

    let context_path = under(&root, &cfg.coordination.context_file);
    let task_path = under(&root, &cfg.coordination.task_file);
    // 两个文件只经由各自的存储写入
    let workdir = workdir.with_protected([context_path.clone(), task_path.clone()]);

    let ledger = Arc::new(TaskLedger::new());
    let context_log = Arc::new(ContextLog::open(context_path)?);
    let records = Arc::new(TaskRecordStore::new(task_path));

    let registry = build_registry(&ToolContext {
        dir: workdir.clone(),
        ledger: ledger.clone(),
        context_log: context_log.clone(),
        records: records.clone(),
        write_namespace: cfg.tools.write_namespace.clone(),
        enable_git: cfg.tools.enable_git,
    });
    let executor = Arc::new(ToolExecutor::new(registry, cfg.tools.tool_timeout_secs));
    tracing::info!(tools = executor.tool_names().len(), "tools registered");

    let crew = LlmCrew::new(llm.clone(), executor, Roster::canonical())
        .with_max_steps(cfg.llm.max_tool_steps);
    let coordination = CoordinationLoop::new(
        Arc::new(crew),
        ledger.clone(),
        context_log.clone(),
        LoopConfig::from_section(&cfg.coordination)?,
    )
    .with_cancel_token(cancel_token);

    Ok(CrewRuntime {
        llm,
        workdir,
        ledger,
        context_log,
        records,
        coordination,
    })
}

/// 按配置选择 LLM 并装配运行时
pub fn build_runtime(cfg: &AppConfig, cancel_token: CancellationToken) -> Result<CrewRuntime, AgentError> {
    build_runtime_with_llm(cfg, create_llm_from_config(cfg), cancel_token)
}
