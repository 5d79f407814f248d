//! 核心编排层：错误分类、会话状态、调度器、流水线编排

pub mod dispatch;
pub mod error;
pub mod orchestrator;
pub mod state;

pub use dispatch::{dispatch_task, Dispatcher};
pub use error::AgentError;
pub use orchestrator::{Orchestrator, PipelineStages};
pub use state::{PendingTask, SessionState};
