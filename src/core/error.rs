//! 错误分类
//!
//! 只有会中止一次编排的失败出现在这里：阶段调用失败/超时、非法调度模式、配置错误。
//! 分类响应解析失败与知识库检索失败在各自模块内就地吸收，不进入公共错误类型。

use thiserror::Error;

use crate::stage::StageRole;

/// 编排过程中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 阶段调用失败：上抛给调用方，当前任务中止，待恢复任务被清除
    #[error("Stage {stage} failed: {reason}")]
    StageFailed { stage: StageRole, reason: String },

    /// 阶段调用超时，视同阶段失败
    #[error("Stage {stage} timed out after {secs}s")]
    StageTimeout { stage: StageRole, secs: u64 },

    /// 闲聊模式 LLM 调用失败
    #[error("Chat failed: {0}")]
    ChatFailed(String),

    /// 调度边界收到契约之外的模式，属编程错误
    #[error("Unknown routing mode: {0}")]
    UnknownMode(String),

    #[error("Config error: {0}")]
    Config(String),
}
