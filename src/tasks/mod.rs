//! 任务层：角色与任务、按角色分区的内存账本、文件任务记录（tasks.md）

pub mod ledger;
pub mod record_store;
pub mod task;

pub use ledger::TaskLedger;
pub use record_store::{task_id, TaskRecord, TaskRecordStore, TaskStatus};
pub use task::{Task, TaskRole};
