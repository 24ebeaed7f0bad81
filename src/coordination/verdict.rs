//! 评审结论解析

/// 评审角色对「目标是否达成」的回答
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Complete,
    Incomplete,
    /// 既不是 true/yes 也不是 false/no；按未完成处理
    Unclear,
}

impl Verdict {
    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }
}

const STRIP: &[char] = &['"', '\'', '`', '*', '.', '!', '?', ',', ';', ':'];

/// "true"/"yes" => Complete，"false"/"no" => Incomplete；忽略大小写、首尾空白、引号与标点
pub fn parse_verdict(text: &str) -> Verdict {
    let word = text.trim().trim_matches(STRIP).trim().to_lowercase();
    match word.as_str() {
        "true" | "yes" => Verdict::Complete,
        "false" | "no" => Verdict::Incomplete,
        _ => Verdict::Unclear,
    }
}
