//! 单个任务的对话记录
//!
//! LlmCrew 执行一条任务时，把「任务 -> 工具调用 -> 观察」逐条记入 Transcript，
//! 超出上限时丢弃最早的工具往返（保留首条任务消息），再整体交给 LLM。

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 任务对话记录：第一条为任务本身，其后保留最近 max_messages 条
#[derive(Clone, Debug)]
pub struct Transcript {
    messages: Vec<Message>,
    max_messages: usize,
}

impl Transcript {
    pub fn new(task_message: Message, max_messages: usize) -> Self {
        Self {
            messages: vec![task_message],
            max_messages: max_messages.max(2),
        }
    }

    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
        self.prune();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn prune(&mut self) {
        let tail = self.messages.len() - 1;
        if tail > self.max_messages {
            self.messages.drain(1..1 + tail - self.max_messages);
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_keeps_task_message() {
        let mut t = Transcript::new(Message::user("task"), 2);
        for i in 0..5 {
            t.push(Message::assistant(format!("step {}", i)));
        }
        assert_eq!(t.len(), 3);
        assert_eq!(t.messages()[0].content, "task");
        assert_eq!(t.messages()[1].content, "step 3");
        assert_eq!(t.messages()[2].content, "step 4");
    }
}
