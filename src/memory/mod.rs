//! 记忆层：任务内对话记录、跨周期共享的上下文日志（context.md）

pub mod context_log;
pub mod conversation;

pub use context_log::ContextLog;
pub use conversation::{Message, Role, Transcript};
