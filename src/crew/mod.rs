//! 协作者层：角色描述、Crew 抽象、LLM 输出解析、基于 LLM 的 Crew 实现

pub mod agent;
pub mod llm_crew;
pub mod parse;
pub mod traits;

pub use agent::{RoleAgent, Roster};
pub use llm_crew::LlmCrew;
pub use parse::{parse_llm_output, StepOutput, ToolCall};
pub use traits::Crew;
