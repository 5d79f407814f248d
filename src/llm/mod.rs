//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Mock），以及嵌入提供方

pub mod embedding;
pub mod mock;
pub mod openai;
pub mod traits;

pub use embedding::{create_embedder_from_config, EmbeddingProvider, HashEmbedder, OpenAiEmbedder};
pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use traits::LlmClient;

use std::sync::Arc;

use crate::config::AppConfig;

/// 根据配置与环境变量选择 LLM 后端；无 API Key 时退回 Mock
pub fn create_llm_from_config(cfg: &AppConfig, model: &str) -> Arc<dyn LlmClient> {
    if std::env::var("OPENAI_API_KEY").is_ok() {
        tracing::info!("Using OpenAI-compatible LLM ({})", model);
        Arc::new(OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            model,
            std::env::var("OPENAI_API_KEY").ok().as_deref(),
        ))
    } else {
        tracing::warn!("No OPENAI_API_KEY set, using Mock LLM");
        Arc::new(MockLlmClient)
    }
}
