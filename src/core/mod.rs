//! 核心层：错误类型与运行时装配

pub mod error;
pub mod orchestrator;

pub use error::AgentError;
pub use orchestrator::{build_runtime, build_runtime_with_llm, create_llm_from_config, CrewRuntime};
