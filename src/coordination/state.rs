//! 协作循环的阶段与运行结果

use serde::Serialize;

/// 循环阶段；Done / Inconclusive / Cancelled 为终止态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CyclePhase {
    Planning,
    Executing,
    Reviewing,
    /// 评审结论为 true
    Done,
    /// 轮数或时间预算耗尽
    Inconclusive,
    /// 取消令牌被触发
    Cancelled,
}

impl CyclePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Inconclusive | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "PLANNING",
            Self::Executing => "EXECUTING",
            Self::Reviewing => "REVIEWING",
            Self::Done => "DONE",
            Self::Inconclusive => "INCONCLUSIVE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次 run 的结果
#[derive(Clone, Debug, Serialize)]
pub struct CoordinationOutcome {
    /// 终止态
    pub status: CyclePhase,
    /// 进入 Planning 的次数
    pub cycles: usize,
    /// 依次经过的阶段（含终止态）
    pub phases: Vec<CyclePhase>,
    /// 上下文日志最后一块；日志没有块时为全文
    pub result: String,
}

impl CoordinationOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == CyclePhase::Done
    }

    /// 某阶段出现的次数
    pub fn count(&self, phase: CyclePhase) -> usize {
        self.phases.iter().filter(|p| **p == phase).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(!CyclePhase::Planning.is_terminal());
        assert!(!CyclePhase::Reviewing.is_terminal());
        assert!(CyclePhase::Done.is_terminal());
        assert!(CyclePhase::Inconclusive.is_terminal());
        assert!(CyclePhase::Cancelled.is_terminal());
    }

    #[test]
    fn test_outcome_counts() {
        let outcome = CoordinationOutcome {
            status: CyclePhase::Done,
            cycles: 2,
            phases: vec![
                CyclePhase::Planning,
                CyclePhase::Reviewing,
                CyclePhase::Planning,
                CyclePhase::Reviewing,
                CyclePhase::Done,
            ],
            result: String::new(),
        };
        assert!(outcome.is_complete());
        assert_eq!(outcome.count(CyclePhase::Planning), 2);
        assert_eq!(outcome.count(CyclePhase::Executing), 0);
    }
}
