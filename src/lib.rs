//! Hive - Rust 多智能体任务编排系统
//!
//! 模块划分：
//! - **chat**: 闲聊模式（带会话历史窗口的对话 Agent）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类、会话状态、调度器、流水线编排
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）与嵌入提供方
//! - **memory**: 各阶段对话记忆与持久化共享知识库
//! - **router**: 输入路由（恢复优先 → 邮件快径 → 模型分类兜底）
//! - **stage**: 流水线阶段抽象（planner / researcher / summarizer / email）

pub mod chat;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod router;
pub mod stage;
