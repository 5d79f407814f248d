//! 嵌入提供方：供共享知识库做相似检索
//!
//! OpenAiEmbedder 调用 OpenAI 兼容的 /embeddings 端点；HashEmbedder 为确定性的
//! 本地词袋散列实现，无 Key 环境与测试中使用（同一文本任何进程得到同一向量）。

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use async_openai::types::embeddings::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;

use crate::config::AppConfig;

/// 嵌入提供方 trait：文本 → 向量；失败时返回错误字符串
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String>;
}

/// 使用 async-openai 调用 OpenAI 兼容的 embeddings API
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    /// 与 LLM 共用 OPENAI_API_KEY / base_url
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(vec![]);
        }
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::String(text.to_string()))
            .build()
            .map_err(|e| e.to_string())?;
        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| e.to_string())?;
        let vec = response
            .data
            .first()
            .map(|e| e.embedding.clone())
            .unwrap_or_default();
        Ok(vec)
    }
}

/// 本地确定性嵌入：小写分词后按散列投入固定维度的词袋向量
#[derive(Clone, Debug)]
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(vec![]);
        }
        let mut v = vec![0.0f32; self.dims];
        for token in text.split_whitespace() {
            let token: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if token.len() < 2 {
                continue;
            }
            // DefaultHasher::new() 用固定密钥，跨进程稳定
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dims as u64) as usize;
            v[bucket] += 1.0;
        }
        Ok(v)
    }
}

/// 从配置创建嵌入提供方：有 OPENAI_API_KEY 用远端嵌入，否则用本地散列嵌入
pub fn create_embedder_from_config(cfg: &AppConfig) -> Arc<dyn EmbeddingProvider> {
    let key = std::env::var("OPENAI_API_KEY").ok();
    if key.as_deref().unwrap_or("").is_empty() {
        tracing::debug!("no OPENAI_API_KEY, using local hash embedder");
        Arc::new(HashEmbedder::default())
    } else {
        Arc::new(OpenAiEmbedder::new(
            cfg.llm.base_url.as_deref(),
            &cfg.embedding.model,
            key.as_deref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let e = HashEmbedder::default();
        let a = e.embed("rust borrow checker").await.unwrap();
        let b = e.embed("rust borrow checker").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn overlapping_text_shares_buckets() {
        let e = HashEmbedder::default();
        let a = e.embed("tokio async runtime").await.unwrap();
        let b = e.embed("the tokio runtime").await.unwrap();
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        assert!(dot > 0.0);
    }

    #[tokio::test]
    async fn empty_text_embeds_to_empty() {
        let e = HashEmbedder::default();
        assert!(e.embed("   ").await.unwrap().is_empty());
    }
}
