//! 输入路由
//!
//! 分层决策：待恢复任务优先 → 邮件意图快径（纯词法，低延迟确定性处理）→
//! 模型分类兜底。分类响应解析失败一律安全兜底到 COMPLEX_TASK，宁可多执行也不沉默。

use std::sync::Arc;

use serde::Deserialize;

use crate::core::SessionState;
use crate::llm::LlmClient;
use crate::memory::Message;

/// 邮件意图关键词（命中任一即视为邮件任务）
const EMAIL_KEYWORDS: [&str; 4] = ["email", "mail", "compose", "draft"];

/// 邮件上下文提示词：收件人/主题线索，命中说明信息已够用
const EMAIL_CONTEXT_HINTS: [&str; 12] = [
    "to ",
    "about ",
    "regarding ",
    "for ",
    "manager",
    "hr",
    "client",
    "team",
    "meeting",
    "project",
    "internship",
    "delay",
];

/// 邮件意图但缺上下文时的固定追问
pub const CLARIFY_EMAIL_QUESTION: &str = "Who is the email for and what is it about?";

/// CLARIFY 响应缺 question 字段时的兜底追问
const FALLBACK_CLARIFY_QUESTION: &str = "Could you clarify?";

const ROUTER_SYSTEM_PROMPT: &str = "\
You are an INPUT ROUTER for an AI system.

Your job is to decide HOW the system should respond to the user.

Choose exactly ONE mode:

CHAT
- Casual conversation
- Greetings, opinions, acknowledgements
- No task execution required

CLARIFY
- User wants a task done
- Required information is missing
- Ask ONE clear follow-up question

COMPLEX_TASK
- Any executable task
- Email writing
- Multi-step reasoning

Respond ONLY in valid JSON.
";

/// 路由决策；逐条输入产生，不持久化
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutingDecision {
    Chat,
    Clarify { question: String },
    Resume,
    ComplexTask,
}

impl RoutingDecision {
    pub fn name(&self) -> &'static str {
        match self {
            RoutingDecision::Chat => "CHAT",
            RoutingDecision::Clarify { .. } => "CLARIFY",
            RoutingDecision::Resume => "RESUME",
            RoutingDecision::ComplexTask => "COMPLEX_TASK",
        }
    }
}

/// 输入是否带有邮件意图（编排器的邮件格式化门控也用这一判定）
pub fn has_email_intent(text: &str) -> bool {
    let text = text.to_lowercase();
    EMAIL_KEYWORDS.iter().any(|k| text.contains(k))
}

/// 输入路由器：持有分类用的轻量 LLM
pub struct InputRouter {
    llm: Arc<dyn LlmClient>,
}

/// 模型分类的 JSON 响应形状
#[derive(Debug, Deserialize)]
struct RouterVerdict {
    mode: String,
    question: Option<String>,
}

impl InputRouter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// 分类一条输入。优先级：
    /// 1. 有待恢复任务 → RESUME（无条件，已承诺的任务意图不可被悄悄丢弃）
    /// 2. 邮件快径：有邮件关键词、无上下文提示且 ≤5 个词 → 固定追问；
    ///    有上下文（提示词命中或 >5 个词）→ 直接 COMPLEX_TASK
    /// 3. 模型分类，解析失败一律兜底 COMPLEX_TASK
    pub async fn classify(&self, input: &str, session: &SessionState) -> RoutingDecision {
        if session.pending_task.is_some() {
            return RoutingDecision::Resume;
        }

        let text = input.to_lowercase();
        let is_email = EMAIL_KEYWORDS.iter().any(|k| text.contains(k));
        let has_context = EMAIL_CONTEXT_HINTS.iter().any(|h| text.contains(h))
            || text.split_whitespace().count() > 5;

        if is_email && !has_context {
            return RoutingDecision::Clarify {
                question: CLARIFY_EMAIL_QUESTION.to_string(),
            };
        }
        if is_email {
            return RoutingDecision::ComplexTask;
        }

        self.llm_classify(input).await
    }

    async fn llm_classify(&self, input: &str) -> RoutingDecision {
        let prompt = format!(
            "{}\nUser message:\n\"\"\"{}\"\"\"\n\nJSON Response Format:\n{{\n  \"mode\": \"CHAT | CLARIFY | COMPLEX_TASK\",\n  \"question\": \"<only if mode is CLARIFY>\"\n}}",
            ROUTER_SYSTEM_PROMPT, input
        );

        let response = match self.llm.complete(&[Message::user(prompt)]).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("router classification failed ({}), failing open", e);
                return RoutingDecision::ComplexTask;
            }
        };

        parse_verdict(&response)
    }
}

/// 从模型回复中提取 JSON 并解析为决策；任何不符合预期之处都兜底 COMPLEX_TASK
fn parse_verdict(raw: &str) -> RoutingDecision {
    let trimmed = raw.trim();
    let json_str = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => {
            tracing::warn!("router response has no JSON object, failing open");
            return RoutingDecision::ComplexTask;
        }
    };

    let verdict: RouterVerdict = match serde_json::from_str(json_str) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("router response unparseable ({}), failing open", e);
            return RoutingDecision::ComplexTask;
        }
    };

    match verdict.mode.as_str() {
        "CHAT" => RoutingDecision::Chat,
        "CLARIFY" => RoutingDecision::Clarify {
            question: verdict
                .question
                .unwrap_or_else(|| FALLBACK_CLARIFY_QUESTION.to_string()),
        },
        "COMPLEX_TASK" => RoutingDecision::ComplexTask,
        other => {
            tracing::warn!("router returned unknown mode {:?}, failing open", other);
            RoutingDecision::ComplexTask
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionState;
    use async_trait::async_trait;

    /// 固定返回脚本文本的分类 LLM
    struct ScriptedLlm(String);

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, _messages: &[Message]) -> Result<String, String> {
            Ok(self.0.clone())
        }
    }

    fn router_with(reply: &str) -> InputRouter {
        InputRouter::new(Arc::new(ScriptedLlm(reply.to_string())))
    }

    #[tokio::test]
    async fn pending_task_always_resumes() {
        let router = router_with(r#"{"mode": "CHAT"}"#);
        let mut session = SessionState::new();
        session.set_pending("draft an email");
        for input in ["hello", "email", "what is 2+2?"] {
            assert_eq!(
                router.classify(input, &session).await,
                RoutingDecision::Resume
            );
        }
    }

    #[tokio::test]
    async fn short_email_without_context_clarifies() {
        let router = router_with(r#"{"mode": "CHAT"}"#);
        let session = SessionState::new();
        let decision = router.classify("email", &session).await;
        assert_eq!(
            decision,
            RoutingDecision::Clarify {
                question: CLARIFY_EMAIL_QUESTION.to_string()
            }
        );
    }

    #[tokio::test]
    async fn email_with_context_hint_is_complex_task() {
        let router = router_with(r#"{"mode": "CHAT"}"#);
        let session = SessionState::new();
        let decision = router
            .classify("Draft an email to my manager about project delay", &session)
            .await;
        assert_eq!(decision, RoutingDecision::ComplexTask);
    }

    #[tokio::test]
    async fn long_email_request_skips_clarification() {
        let router = router_with(r#"{"mode": "CHAT"}"#);
        let session = SessionState::new();
        // 超过 5 个词即视为上下文足够
        let decision = router
            .classify("compose something nice please thank you kindly", &session)
            .await;
        assert_eq!(decision, RoutingDecision::ComplexTask);
    }

    #[tokio::test]
    async fn classifier_verdict_is_honored() {
        let session = SessionState::new();
        let chat = router_with(r#"{"mode": "CHAT"}"#);
        assert_eq!(
            chat.classify("hello there", &session).await,
            RoutingDecision::Chat
        );

        let clarify = router_with(r#"{"mode": "CLARIFY", "question": "Which file?"}"#);
        assert_eq!(
            clarify.classify("fix it", &session).await,
            RoutingDecision::Clarify {
                question: "Which file?".to_string()
            }
        );
    }

    #[test]
    fn malformed_json_fails_open() {
        assert_eq!(parse_verdict("not json at all"), RoutingDecision::ComplexTask);
        assert_eq!(parse_verdict("{broken"), RoutingDecision::ComplexTask);
        assert_eq!(
            parse_verdict(r#"{"mode": "SOMETHING_ELSE"}"#),
            RoutingDecision::ComplexTask
        );
    }

    #[test]
    fn clarify_without_question_gets_fallback() {
        assert_eq!(
            parse_verdict(r#"{"mode": "CLARIFY"}"#),
            RoutingDecision::Clarify {
                question: FALLBACK_CLARIFY_QUESTION.to_string()
            }
        );
    }

    #[test]
    fn json_is_extracted_from_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"mode\": \"CHAT\"}\n```";
        assert_eq!(parse_verdict(reply), RoutingDecision::Chat);
    }

    #[test]
    fn email_intent_is_lexical() {
        assert!(has_email_intent("Draft an EMAIL to the team"));
        assert!(has_email_intent("compose a note"));
        assert!(!has_email_intent("what's the weather"));
    }
}
