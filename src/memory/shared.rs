//! 共享知识库：持久化、可相似检索的事实存储
//!
//! 事实写入后不可变，只追加、只检索；每次 save_fact 全量重写持久化文件
//! （事实很小、写入频率低，暂不需要 WAL）。检索或持久化失败只记日志并降级，
//! 不中断上层的流水线执行。

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::EmbeddingProvider;

/// 库为空或检索失败时返回的固定文案
pub const NO_KNOWLEDGE_SENTINEL: &str = "No relevant past knowledge found.";

/// 首次建库时写入的种子事实
const SEED_FACT: &str = "Shared knowledge base initialized.";

const FACTS_FILE: &str = "facts.json";

/// 单条共享事实：文本 + 嵌入向量，写入后不再修改
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SharedFact {
    pub text: String,
    pub embedding: Vec<f32>,
    pub saved_at: DateTime<Utc>,
}

/// 共享知识库：加载或初始化持久化目录，提供 context / save_fact
///
/// 内部用 RwLock 保护事实表；持久化写入在写锁内完成，并发 append 不会丢更新。
pub struct SharedKnowledgeStore {
    path: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    facts: RwLock<Vec<SharedFact>>,
}

impl SharedKnowledgeStore {
    /// 打开知识库：目录存在持久化文件则加载，否则写入种子事实并立即持久化。
    /// 重复对同一目录 open 得到等价的检索结果。
    pub async fn open(
        dir: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
    ) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(FACTS_FILE);

        let facts = if path.exists() {
            match Self::load(&path) {
                Ok(facts) => facts,
                Err(e) => {
                    tracing::warn!("knowledge store at {:?} unreadable ({}), reseeding", path, e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let store = Self {
            path,
            embedder,
            top_k,
            facts: RwLock::new(facts),
        };

        if store.facts.read().unwrap().is_empty() {
            let embedding = match store.embedder.embed(SEED_FACT).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!("seed fact embedding failed: {}", e);
                    Vec::new()
                }
            };
            let mut facts = store.facts.write().unwrap();
            facts.push(SharedFact {
                text: SEED_FACT.to_string(),
                embedding,
                saved_at: Utc::now(),
            });
            store.persist_locked(&facts)?;
        }

        Ok(store)
    }

    fn load(path: &Path) -> anyhow::Result<Vec<SharedFact>> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// 写锁内全量重写持久化文件
    fn persist_locked(&self, facts: &[SharedFact]) -> anyhow::Result<()> {
        std::fs::write(&self.path, serde_json::to_string_pretty(facts)?)?;
        Ok(())
    }

    /// 检索与 query 最相似的 top_k 条事实，格式化为可读文本块；
    /// 库为空、无匹配或检索失败时返回固定文案。
    pub async fn context(&self, query: &str) -> String {
        let query_embedding = match self.embedder.embed(query).await {
            Ok(v) if !v.is_empty() => v,
            Ok(_) => return NO_KNOWLEDGE_SENTINEL.to_string(),
            Err(e) => {
                tracing::warn!("knowledge retrieval degraded: {}", e);
                return NO_KNOWLEDGE_SENTINEL.to_string();
            }
        };

        let facts = self.facts.read().unwrap();
        let mut scored: Vec<(f32, &SharedFact)> = facts
            .iter()
            .map(|f| (cosine_similarity(&query_embedding, &f.embedding), f))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        if scored.is_empty() {
            return NO_KNOWLEDGE_SENTINEL.to_string();
        }

        let mut context = String::from("Shared Knowledge Base:\n");
        for (i, (_, fact)) in scored.iter().take(self.top_k).enumerate() {
            context.push_str(&format!("{}. {}\n", i + 1, fact.text));
        }
        context
    }

    /// 嵌入并追加一条事实，随后全量重持久化；任何一步失败只记日志。
    pub async fn save_fact(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let embedding = match self.embedder.embed(text).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("fact embedding failed, fact dropped: {}", e);
                return;
            }
        };

        let mut facts = self.facts.write().unwrap();
        facts.push(SharedFact {
            text: text.to_string(),
            embedding,
            saved_at: Utc::now(),
        });
        if let Err(e) = self.persist_locked(&facts) {
            tracing::warn!("knowledge store persist failed: {}", e);
        }
        tracing::info!(
            "Saved to shared knowledge: {}...",
            text.chars().take(50).collect::<String>()
        );
    }

    /// 当前事实条数（含种子）
    pub fn len(&self) -> usize {
        self.facts.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 余弦相似度；维度不一致或零向量时返回 0
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// 按关键词返回 one-hot 向量的脚本嵌入器，保证检索结果可预测
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
            let t = text.to_lowercase();
            let mut v = vec![0.0_f32; 4];
            if t.contains("lifetimes") {
                v[0] = 1.0;
            }
            if t.contains("tokio") {
                v[1] = 1.0;
            }
            if t.contains("knowledge base initialized") {
                v[2] = 1.0;
            }
            if v.iter().all(|x| *x == 0.0) {
                v[3] = 1.0;
            }
            Ok(v)
        }
    }

    fn embedder() -> Arc<dyn EmbeddingProvider> {
        Arc::new(KeywordEmbedder)
    }

    #[tokio::test]
    async fn fresh_store_returns_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let store = SharedKnowledgeStore::open(dir.path(), embedder(), 3)
            .await
            .unwrap();
        // 种子事实与无关查询不重叠，检索降级为固定文案
        let ctx = store.context("rust borrow checker lifetimes").await;
        assert_eq!(ctx, NO_KNOWLEDGE_SENTINEL);
    }

    #[tokio::test]
    async fn saved_fact_is_retrievable() {
        let dir = tempfile::tempdir().unwrap();
        let store = SharedKnowledgeStore::open(dir.path(), embedder(), 3)
            .await
            .unwrap();
        store
            .save_fact("Q: rust lifetimes | Key facts: borrow checker enforces scopes | Summary: scopes bound references")
            .await;

        let ctx = store.context("what are rust lifetimes").await;
        assert!(ctx.starts_with("Shared Knowledge Base:"));
        assert!(ctx.contains("borrow checker"));
    }

    #[tokio::test]
    async fn reload_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SharedKnowledgeStore::open(dir.path(), embedder(), 3)
                .await
                .unwrap();
            store.save_fact("Q: tokio | Key facts: async runtime for rust | Summary: runtime").await;
            assert_eq!(store.len(), 2);
        }

        let first = SharedKnowledgeStore::open(dir.path(), embedder(), 3)
            .await
            .unwrap();
        let second = SharedKnowledgeStore::open(dir.path(), embedder(), 3)
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(
            first.context("tokio async runtime").await,
            second.context("tokio async runtime").await
        );
    }

    #[tokio::test]
    async fn empty_fact_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = SharedKnowledgeStore::open(dir.path(), embedder(), 3)
            .await
            .unwrap();
        store.save_fact("   ").await;
        assert_eq!(store.len(), 1); // 只有种子
    }

    #[test]
    fn cosine_basics() {
        let a = vec![1.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0, 0.0]), 0.0);
    }
}
