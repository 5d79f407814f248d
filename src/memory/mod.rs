//! 记忆层：各阶段对话记忆（会话内）与持久化共享知识库（跨会话检索）

pub mod agent;
pub mod conversation;
pub mod shared;

pub use agent::{AgentIdentity, AgentMemoryStore};
pub use conversation::{Message, Role};
pub use shared::{SharedFact, SharedKnowledgeStore, NO_KNOWLEDGE_SENTINEL};
