//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 LlmClient：complete 拿一段消息、回一段文本。

use async_trait::async_trait;

use crate::memory::Message;

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 完成一次对话请求；失败时返回错误字符串
    async fn complete(&self, messages: &[Message]) -> Result<String, String>;
}
