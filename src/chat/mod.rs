//! 闲聊模式
//!
//! 普通对话不进流水线：带最近历史窗口直接调 LLM，回复后把一问一答写回会话历史。

use std::sync::Arc;

use crate::core::{AgentError, SessionState};
use crate::llm::LlmClient;
use crate::memory::Message;

const CHAT_SYSTEM_PROMPT: &str = "\
You are a friendly conversational AI.

Rules:
- Respond naturally and briefly.
- Maintain conversation context.
- Do NOT perform tasks.
- Do NOT offer to run tools or workflows.
";

/// 闲聊 Agent：LLM + 历史窗口大小
pub struct ChatAgent {
    llm: Arc<dyn LlmClient>,
    max_history: usize,
}

impl ChatAgent {
    pub fn new(llm: Arc<dyn LlmClient>, max_history: usize) -> Self {
        Self { llm, max_history }
    }

    /// 生成一条闲聊回复并更新会话历史
    pub async fn respond(
        &self,
        input: &str,
        session: &mut SessionState,
    ) -> Result<String, AgentError> {
        let mut messages = vec![Message::system(CHAT_SYSTEM_PROMPT)];
        messages.extend(session.recent_chat(self.max_history).to_vec());
        messages.push(Message::user(input));

        let reply = self
            .llm
            .complete(&messages)
            .await
            .map_err(AgentError::ChatFailed)?;

        session.chat_history.push(Message::user(input));
        session.chat_history.push(Message::assistant(reply.clone()));

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[tokio::test]
    async fn chat_updates_history() {
        let agent = ChatAgent::new(Arc::new(MockLlmClient), 10);
        let mut session = SessionState::new();
        let reply = agent.respond("hello", &mut session).await.unwrap();
        assert!(reply.contains("hello"));
        assert_eq!(session.chat_history.len(), 2);
        assert_eq!(session.chat_history[0].content, "hello");
    }
}
