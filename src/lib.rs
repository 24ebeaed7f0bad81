//! Crewloop - 多角色任务协作循环
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **coordination**: 规划 / 执行 / 评审循环与评审结论解析
//! - **core**: 错误类型与运行时装配
//! - **crew**: 角色描述、Crew 抽象与基于 LLM 的实现
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **memory**: 上下文日志与单任务对话记录
//! - **observability**: 日志初始化
//! - **tasks**: 按角色分区的任务账本与文件任务记录
//! - **tools**: 文件、账本、任务记录、git 工具与执行器

pub mod config;
pub mod coordination;
pub mod core;
pub mod crew;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod tasks;
pub mod tools;

pub use coordination::{CoordinationLoop, CoordinationOutcome, CyclePhase};
pub use core::AgentError;
