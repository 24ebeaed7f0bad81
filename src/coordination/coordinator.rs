//! 协作循环：PLANNING -> EXECUTING -> REVIEWING -> (DONE | PLANNING)
//!
//! 单个异步任务内顺序推进，每次调度都等待 Crew 完成整批任务。
//! 受 max_cycles、可选的 max_duration 与取消令牌约束，预算耗尽为 Inconclusive，取消为 Cancelled。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::CoordinationSection;
use crate::coordination::state::{CoordinationOutcome, CyclePhase};
use crate::coordination::verdict::{parse_verdict, Verdict};
use crate::core::AgentError;
use crate::crew::Crew;
use crate::memory::ContextLog;
use crate::tasks::{Task, TaskLedger, TaskRole};

/// Planner 分区为空时注入的规划任务
pub const PLANNING_TASK: &str = "Achieve the objective by breaking it down into small, actionable \
tasks. Read the context to see what has already been done, then add each remaining task for the \
role best suited to it (executor for doing, reviewer for checking).";

/// 评审任务；「only return true or false」是评审提示的固定措辞
pub const VERDICT_TASK: &str = "You are a computer program that can only return true or false. \
Based on the context, decide whether the objective has been fully met.";

/// 循环预算与评审角色
#[derive(Clone, Debug)]
pub struct LoopConfig {
    pub max_cycles: usize,
    pub max_duration: Option<Duration>,
    /// Reviewer 或 Decider
    pub verdict_role: TaskRole,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_cycles: 10,
            max_duration: None,
            verdict_role: TaskRole::Reviewer,
        }
    }
}

impl LoopConfig {
    pub fn from_section(section: &CoordinationSection) -> Result<Self, AgentError> {
        Ok(Self {
            max_cycles: section.max_cycles.max(1),
            max_duration: section.max_duration(),
            verdict_role: section
                .verdict_role()
                .map_err(|e| AgentError::ConfigError(e.to_string()))?,
        })
    }
}

/// 一次调度的结果：Crew 输出，或被取消 / 超时打断
enum Dispatched {
    Output(String),
    Interrupted(CyclePhase),
}

pub struct CoordinationLoop {
    crew: Arc<dyn Crew>,
    ledger: Arc<TaskLedger>,
    context_log: Arc<ContextLog>,
    config: LoopConfig,
    cancel_token: CancellationToken,
}

impl CoordinationLoop {
    pub fn new(
        crew: Arc<dyn Crew>,
        ledger: Arc<TaskLedger>,
        context_log: Arc<ContextLog>,
        config: LoopConfig,
    ) -> Self {
        Self {
            crew,
            ledger,
            context_log,
            config,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn ledger(&self) -> &Arc<TaskLedger> {
        &self.ledger
    }

    pub fn context_log(&self) -> &Arc<ContextLog> {
        &self.context_log
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// 驱动循环直到终止态；Crew 失败以 AgentError 返回
    pub async fn run(&self, objective: &str) -> Result<CoordinationOutcome, AgentError> {
        let objective = objective.trim();
        if objective.is_empty() {
            return Err(AgentError::validation("Objective cannot be empty"));
        }
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("coordination", %run_id);
        self.run_inner(objective).instrument(span).await
    }

    async fn run_inner(&self, objective: &str) -> Result<CoordinationOutcome, AgentError> {
        let deadline = self.config.max_duration.map(|d| Instant::now() + d);
        let mut phases = Vec::new();
        let mut cycles = 0usize;
        let mut phase = CyclePhase::Planning;

        tracing::info!(
            max_cycles = self.config.max_cycles,
            verdict_role = %self.config.verdict_role,
            "coordination started"
        );

        while !phase.is_terminal() {
            if self.cancel_token.is_cancelled() {
                phase = CyclePhase::Cancelled;
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::warn!(cycles, "time budget exhausted");
                phase = CyclePhase::Inconclusive;
                break;
            }
            phases.push(phase);

            phase = match phase {
                CyclePhase::Planning => {
                    cycles += 1;
                    tracing::info!(cycle = cycles, "planning");
                    match self.plan(objective, deadline).await? {
                        Dispatched::Interrupted(p) => p,
                        Dispatched::Output(_) if self.ledger.is_empty(TaskRole::Executor) => {
                            tracing::info!(cycle = cycles, "no executor tasks planned");
                            CyclePhase::Reviewing
                        }
                        Dispatched::Output(_) => CyclePhase::Executing,
                    }
                }
                CyclePhase::Executing => match self.execute(deadline).await? {
                    Dispatched::Interrupted(p) => p,
                    Dispatched::Output(_) => CyclePhase::Reviewing,
                },
                CyclePhase::Reviewing => match self.review(objective, deadline).await? {
                    Dispatched::Interrupted(p) => p,
                    Dispatched::Output(answer) => {
                        let verdict = parse_verdict(&answer);
                        if verdict == Verdict::Unclear {
                            tracing::warn!(answer = %answer, "unrecognized verdict, treating as false");
                        }
                        if verdict.is_complete() {
                            CyclePhase::Done
                        } else {
                            self.ledger.clear(None);
                            if cycles >= self.config.max_cycles {
                                tracing::warn!(cycles, "cycle budget exhausted");
                                CyclePhase::Inconclusive
                            } else {
                                CyclePhase::Planning
                            }
                        }
                    }
                },
                terminal => terminal,
            };
        }

        phases.push(phase);
        let result = match self.context_log.last_block() {
            Some(block) => block,
            None => self.context_log.read_or_empty()?,
        };
        tracing::info!(status = %phase, cycles, "coordination finished");
        Ok(CoordinationOutcome {
            status: phase,
            cycles,
            phases,
            result,
        })
    }

    /// 取出 Planner 分区（为空则注入规划任务），附上目标与账本快照后调度
    async fn plan(&self, objective: &str, deadline: Option<Instant>) -> Result<Dispatched, AgentError> {
        let mut pending = self.ledger.drain(TaskRole::Planner);
        if pending.is_empty() {
            pending.push(Task::new(TaskRole::Planner, PLANNING_TASK)?);
        }
        let snapshot = match self.ledger.render() {
            s if s.is_empty() => "There are no pending tasks.".to_string(),
            s => s,
        };
        let tasks = pending
            .into_iter()
            .map(|t| {
                Task::new(
                    TaskRole::Planner,
                    format!(
                        "{}\n\nObjective: {}\n\nCurrent task ledger:\n{}",
                        t.description, objective, snapshot
                    ),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.dispatch(&tasks, deadline).await
    }

    /// Executor 与 Reviewer 分区作为一批调度，结果追加到上下文日志后清空两个分区
    async fn execute(&self, deadline: Option<Instant>) -> Result<Dispatched, AgentError> {
        let mut tasks = self.ledger.get_tasks(TaskRole::Executor);
        tasks.extend(self.ledger.get_tasks(TaskRole::Reviewer));
        tracing::info!(tasks = tasks.len(), "executing");

        let dispatched = self.dispatch(&tasks, deadline).await?;
        if let Dispatched::Output(result) = &dispatched {
            self.context_log.append(result)?;
            self.ledger.clear(Some(TaskRole::Executor));
            self.ledger.clear(Some(TaskRole::Reviewer));
        }
        Ok(dispatched)
    }

    async fn review(&self, objective: &str, deadline: Option<Instant>) -> Result<Dispatched, AgentError> {
        let task = Task::new(
            self.config.verdict_role,
            format!(
                "{}\n\nObjective: {}\n\nAnswer with exactly one word: true or false.",
                VERDICT_TASK, objective
            ),
        )?;
        self.dispatch(std::slice::from_ref(&task), deadline).await
    }

    /// 带上下文日志全文调度给 Crew；取消或到达截止时间时中止等待
    async fn dispatch(&self, tasks: &[Task], deadline: Option<Instant>) -> Result<Dispatched, AgentError> {
        let context = self.context_log.read_or_empty()?;
        let out_of_time = async {
            match deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => {
                tracing::info!("coordination cancelled during dispatch");
                Ok(Dispatched::Interrupted(CyclePhase::Cancelled))
            }
            _ = out_of_time => {
                tracing::warn!("time budget exhausted during dispatch");
                Ok(Dispatched::Interrupted(CyclePhase::Inconclusive))
            }
            out = self.crew.kickoff(tasks, &context) => out.map(Dispatched::Output),
        }
    }
}
