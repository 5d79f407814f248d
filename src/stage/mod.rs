//! 流水线阶段抽象
//!
//! 每个阶段（planner / researcher / summarizer / email）实现统一的 StageInvoker：
//! 输入拼装好的上下文文本，输出阶段文本。编排器只按角色持有实例，从不探查内部。

pub mod prompts;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::Message;

/// 流水线阶段角色
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageRole {
    Planner,
    Researcher,
    Summarizer,
    EmailComposer,
}

impl StageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageRole::Planner => "planner",
            StageRole::Researcher => "researcher",
            StageRole::Summarizer => "summarizer",
            StageRole::EmailComposer => "email-composer",
        }
    }
}

impl fmt::Display for StageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 阶段调用能力：上下文文本 → 阶段输出文本；错误原样上抛，由编排器决定处置
#[async_trait]
pub trait StageInvoker: Send + Sync {
    fn role(&self) -> StageRole;

    async fn invoke(&self, context: &str) -> Result<String, String>;
}

/// LLM 支撑的阶段：角色专属 system prompt + 共享 LLM 客户端
pub struct LlmStage {
    role: StageRole,
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl LlmStage {
    pub fn new(role: StageRole, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            role,
            llm,
            system_prompt: prompts::for_role(role).to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

#[async_trait]
impl StageInvoker for LlmStage {
    fn role(&self) -> StageRole {
        self.role
    }

    async fn invoke(&self, context: &str) -> Result<String, String> {
        let messages = vec![
            Message::system(self.system_prompt.clone()),
            Message::user(context.to_string()),
        ];
        self.llm.complete(&messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[tokio::test]
    async fn llm_stage_forwards_context() {
        let stage = LlmStage::new(StageRole::Planner, Arc::new(MockLlmClient));
        let out = stage.invoke("plan this task").await.unwrap();
        assert!(out.contains("plan this task"));
        assert_eq!(stage.role(), StageRole::Planner);
    }

    #[test]
    fn roles_render_lowercase() {
        assert_eq!(StageRole::EmailComposer.to_string(), "email-composer");
        assert_eq!(StageRole::Planner.to_string(), "planner");
    }
}
