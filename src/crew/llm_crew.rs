//! LlmCrew：基于 LlmClient + ToolExecutor 的 Crew 实现
//!
//! 每条任务交给其角色：拼 system prompt（角色、目标、背景、该角色可用工具的 schema），
//! 然后循环「LLM -> Tool Call -> Observation」直到 LLM 给出最终回答或达到步数上限。
//! 工具错误以 "Error: ..." 文本作为 Observation 回喂，不会中断任务。

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::AgentError;
use crate::crew::agent::{RoleAgent, Roster};
use crate::crew::parse::{parse_llm_output, StepOutput};
use crate::crew::Crew;
use crate::llm::LlmClient;
use crate::memory::{Message, Transcript};
use crate::tasks::Task;
use crate::tools::ToolExecutor;

/// Observation 回喂给 LLM 的最大字符数
const OBSERVATION_MAX_CHARS: usize = 8000;

/// 任务消息之后保留的最近消息数（6 个工具往返）
const HISTORY_WINDOW: usize = 12;

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", s.chars().take(max).collect::<String>())
    } else {
        s.to_string()
    }
}

pub struct LlmCrew {
    llm: Arc<dyn LlmClient>,
    executor: Arc<ToolExecutor>,
    roster: Roster,
    max_steps: usize,
    history_window: usize,
}

impl LlmCrew {
    pub fn new(llm: Arc<dyn LlmClient>, executor: Arc<ToolExecutor>, roster: Roster) -> Self {
        Self {
            llm,
            executor,
            roster,
            max_steps: 8,
            history_window: HISTORY_WINDOW,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// 超出后丢弃最早的工具往返，首条任务消息始终保留
    pub fn with_history_window(mut self, messages: usize) -> Self {
        self.history_window = messages.max(2);
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    fn system_prompt(&self, agent: &RoleAgent) -> String {
        let mut s = format!(
            "You are the {}.\nGoal: {}\n\n{}\n\n",
            agent.name,
            agent.goal,
            agent.backstory
        );
        if agent.tools.is_empty() {
            s.push_str("You have no tools. Answer directly in plain text.\n");
        } else {
            s.push_str("## Available tools\n");
            s.push_str(&self.executor.registry().schema_json_for(&agent.tools));
            s.push_str(
                "\n\nTo call a tool reply with ONLY a JSON object: \
                 {\"tool\": \"<name>\", \"args\": {...}}.\n\
                 When the task is finished reply with a plain-text summary of what you did (no JSON).\n",
            );
        }
        s
    }

    /// 执行单条任务，返回该任务的最终回答
    pub async fn run_task(&self, task: &Task, context: &str) -> Result<String, AgentError> {
        let agent = self.roster.get(task.role);
        let system = Message::system(self.system_prompt(agent));
        let mut prompt = task.description.clone();
        if !context.trim().is_empty() {
            prompt.push_str("\n\n## Context\n");
            prompt.push_str(context);
        }
        let mut transcript = Transcript::new(Message::user(prompt), self.history_window);

        for step in 0..self.max_steps {
            let mut messages = vec![system.clone()];
            messages.extend(transcript.messages().iter().cloned());
            let reply = self
                .llm
                .complete(&messages)
                .await
                .map_err(AgentError::LlmError)?;

            match parse_llm_output(&reply) {
                Ok(StepOutput::Response(text)) => {
                    tracing::info!(role = %task.role, step, "task finished");
                    return Ok(text);
                }
                Ok(StepOutput::ToolCall(call)) => {
                    tracing::debug!(role = %task.role, step, tool = %call.tool, "tool call");
                    let observation = match self
                        .executor
                        .execute(&call.tool, call.args.clone(), &agent.tools)
                        .await
                    {
                        Ok(out) => out,
                        Err(AgentError::HallucinatedTool(name)) => format!(
                            "Error: tool '{}' is not available. Only use: {}",
                            name,
                            agent.tools.join(", ")
                        ),
                        Err(e) => format!("Error: {}", e),
                    };
                    transcript.push(Message::assistant(reply));
                    transcript.push(Message::user(format!(
                        "Observation from {}: {}",
                        call.tool,
                        truncate(&observation, OBSERVATION_MAX_CHARS)
                    )));
                }
                Err(e) => {
                    tracing::warn!(role = %task.role, step, error = %e, "unparseable tool call");
                    transcript.push(Message::assistant(reply));
                    transcript.push(Message::user(format!(
                        "{}. Reply with a valid JSON tool call or a plain-text final answer.",
                        e
                    )));
                }
            }
        }

        tracing::warn!(role = %task.role, max_steps = self.max_steps, "task hit step limit");
        Ok(format!(
            "Stopped after {} tool steps without a final answer.",
            self.max_steps
        ))
    }
}

#[async_trait]
impl Crew for LlmCrew {
    /// 单条任务直接返回其回答（评审结论依赖这一点）；多条任务按角色分段汇总
    async fn kickoff(&self, tasks: &[Task], context: &str) -> Result<String, AgentError> {
        let mut sections = Vec::with_capacity(tasks.len());
        for task in tasks {
            let output = self.run_task(task, context).await?;
            if tasks.len() == 1 {
                return Ok(output);
            }
            let headline = task.description.lines().next().unwrap_or_default();
            sections.push(format!("## {}: {}\n{}", task.role.title(), headline, output));
        }
        Ok(sections.join("\n\n"))
    }
}
