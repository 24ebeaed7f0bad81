//! 外部协作者抽象
//!
//! 协作循环只依赖 Crew：给一批（带角色的）任务和当前上下文，返回一段汇总文本。
//! 调用是阻塞式的：循环会等到整批任务完成才继续。

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::AgentError;
use crate::tasks::Task;

#[async_trait]
pub trait Crew: Send + Sync {
    /// 按顺序执行 tasks，context 为上下文日志全文（可能为空）
    async fn kickoff(&self, tasks: &[Task], context: &str) -> Result<String, AgentError>;
}

#[async_trait]
impl<T: Crew + ?Sized> Crew for Arc<T> {
    async fn kickoff(&self, tasks: &[Task], context: &str) -> Result<String, AgentError> {
        (**self).kickoff(tasks, context).await
    }
}
