//! 协作循环：阶段、评审结论与主循环

pub mod coordinator;
pub mod state;
pub mod verdict;

pub use coordinator::{CoordinationLoop, LoopConfig, PLANNING_TASK, VERDICT_TASK};
pub use state::{CoordinationOutcome, CyclePhase};
pub use verdict::{parse_verdict, Verdict};
