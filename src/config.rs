//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `HIVE__*` 覆盖（双下划线表示嵌套，如 `HIVE__LLM__MODEL=gpt-4o`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub embedding: EmbeddingSection,
    #[serde(default)]
    pub memory: MemorySection,
    #[serde(default)]
    pub pipeline: PipelineSection,
}

/// [app] 段：应用名、闲聊历史窗口
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// 闲聊模式拼入上下文的最近消息条数
    #[serde(default = "default_max_chat_messages")]
    pub max_chat_messages: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            max_chat_messages: default_max_chat_messages(),
        }
    }
}

fn default_max_chat_messages() -> usize {
    10
}

/// [llm] 段：后端选择与模型名
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// 路由分类用的轻量模型，未设置时与 model 相同
    pub router_model: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            router_model: None,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// [embedding] 段：共享知识库使用的嵌入模型
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSection {
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

/// [memory] 段：共享知识库目录与检索条数
#[derive(Debug, Clone, Deserialize)]
pub struct MemorySection {
    /// 共享知识库持久化目录，未设置时用 ./knowledge
    #[serde(default = "default_knowledge_dir")]
    pub knowledge_dir: PathBuf,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            knowledge_dir: default_knowledge_dir(),
            top_k: default_top_k(),
        }
    }
}

fn default_knowledge_dir() -> PathBuf {
    PathBuf::from("./knowledge")
}

fn default_top_k() -> usize {
    3
}

/// [pipeline] 段：阶段调用超时
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// 单个阶段调用超时（秒），超时视同阶段失败
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            stage_timeout_secs: default_stage_timeout_secs(),
        }
    }
}

fn default_stage_timeout_secs() -> u64 {
    120
}

/// 加载配置：TOML（可选路径覆盖默认查找）+ `HIVE__*` 环境变量
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("HIVE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.max_chat_messages, 10);
        assert_eq!(cfg.memory.top_k, 3);
        assert_eq!(cfg.pipeline.stage_timeout_secs, 120);
        assert_eq!(cfg.llm.provider, "openai");
    }
}
