//! 流水线编排器
//!
//! 固定流水线：planner →（可跳过的）researcher → summarizer →（按邮件意图触发的）
//! email 格式化。各阶段严格串行，后一阶段的输入依赖前一阶段的输出。
//! 阶段完成即写入其记忆，后续阶段失败不回滚已写入的记忆。

use std::sync::Arc;
use std::time::Duration;

use crate::core::AgentError;
use crate::memory::{AgentIdentity, AgentMemoryStore, Message, Role, SharedKnowledgeStore};
use crate::router::has_email_intent;
use crate::stage::{StageInvoker, StageRole};

/// 计划文本中出现任一短语（不区分大小写）即跳过研究阶段
const SKIP_RESEARCH_PHRASES: [&str; 4] = [
    "no research required",
    "research not required",
    "research not needed",
    "generate the answer directly",
];

/// 跳过研究时充当 raw_data 的固定文本
const DIRECT_ANSWER_SENTINEL: &str = "No research required. Generate answer directly.";

/// 研究阶段输出为空白时的兜底文本
const NO_RESEARCH_DATA: &str = "No research data available.";

/// 四个阶段的句柄，编排器按角色持有、从不探查内部
pub struct PipelineStages {
    pub planner: Arc<dyn StageInvoker>,
    pub researcher: Arc<dyn StageInvoker>,
    pub summarizer: Arc<dyn StageInvoker>,
    pub email_composer: Arc<dyn StageInvoker>,
}

/// 流水线编排器：持有阶段句柄、各阶段记忆与共享知识库
pub struct Orchestrator {
    stages: PipelineStages,
    shared: Arc<SharedKnowledgeStore>,
    memory: AgentMemoryStore,
    session_id: String,
    stage_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        stages: PipelineStages,
        shared: Arc<SharedKnowledgeStore>,
        stage_timeout: Duration,
    ) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        Self {
            stages,
            shared,
            memory: AgentMemoryStore::new(),
            session_id,
            stage_timeout,
        }
    }

    fn identity(&self, role: StageRole) -> AgentIdentity {
        AgentIdentity::new(self.session_id.clone(), role)
    }

    /// 执行一次完整的任务流水线，返回最终回答
    pub async fn run_task(&mut self, query: &str) -> Result<String, AgentError> {
        tracing::info!("Processing task: {}", query);

        // 共享知识检索失败在库内降级为固定文案，不中断流水线
        let shared_context = self.shared.context(query).await;

        // 阶段 1：planner（最近 3 条记忆 + 共享知识 + 原始问题）
        let planner_id = self.identity(StageRole::Planner);
        let planner_context = format!(
            "Previous conversations: {}\nShared knowledge: {}\n\nUser Query: {}\n\nPlan execution steps for the research stage.",
            render_window(self.memory.recent_window(&planner_id, 3)),
            shared_context,
            query
        );
        let plan = self.invoke_stage(&self.stages.planner, &planner_context).await?;
        self.memory.append(&planner_id, Role::User, query);
        self.memory.append(&planner_id, Role::Assistant, plan.clone());
        tracing::debug!("planner output: {}", plan);

        // 跳研判定：计划声明无需研究时直接走生成路径
        let plan_lower = plan.to_lowercase();
        let skip_research = SKIP_RESEARCH_PHRASES.iter().any(|p| plan_lower.contains(p));

        // 阶段 2：researcher（条件执行；最近 2 条记忆 + 共享知识 + 计划）
        let raw_data = if skip_research {
            tracing::info!("research skipped per plan");
            DIRECT_ANSWER_SENTINEL.to_string()
        } else {
            let researcher_id = self.identity(StageRole::Researcher);
            let researcher_context = format!(
                "Previous research: {}\nShared knowledge: {}\n\nExecution Plan: {}\n\nExecute the research steps and return raw data only.",
                render_window(self.memory.recent_window(&researcher_id, 2)),
                shared_context,
                plan
            );
            let mut raw = self
                .invoke_stage(&self.stages.researcher, &researcher_context)
                .await?;
            if raw.trim().is_empty() {
                raw = NO_RESEARCH_DATA.to_string();
            }
            self.memory.append(&researcher_id, Role::User, plan.clone());
            self.memory.append(&researcher_id, Role::Assistant, raw.clone());
            tracing::debug!("research output: {}", raw);
            raw
        };

        // 阶段 3：summarizer
        let summarizer_id = self.identity(StageRole::Summarizer);
        let summarizer_context = if skip_research {
            format!(
                "Original Query: {}\n\nNo research data was collected. Generate the answer directly.",
                query
            )
        } else {
            format!(
                "Original Query: {}\nShared Knowledge: {}\nResearch Data: {}\n\nCreate a polished final answer.",
                query, shared_context, raw_data
            )
        };
        let mut final_answer = self
            .invoke_stage(&self.stages.summarizer, &summarizer_context)
            .await?;
        self.memory.append(&summarizer_id, Role::User, raw_data.clone());
        self.memory
            .append(&summarizer_id, Role::Assistant, final_answer.clone());

        // 阶段 4：邮件格式化（按「原始问题」的词法邮件意图触发，与路由快径相互独立）
        let email_formatted = has_email_intent(query);
        if email_formatted {
            let email_context = format!(
                "Content:\n{}\n\nConvert the content above into a professional email. Use square-bracket placeholders for any missing specifics.",
                final_answer
            );
            final_answer = self
                .invoke_stage(&self.stages.email_composer, &email_context)
                .await?;
        }

        // 阶段 5：事实沉淀。仅当研究阶段实际执行且未做邮件化改写时入库。
        if !skip_research && !email_formatted {
            let fact = format!(
                "Q: {}... | Key facts: {}... | Summary: {}...",
                truncate_chars(query, 50),
                truncate_chars(&raw_data, 100),
                truncate_chars(&final_answer, 50)
            );
            self.shared.save_fact(&fact).await;
        }

        Ok(final_answer)
    }

    /// 带超时的阶段调用；超时视同阶段失败
    async fn invoke_stage(
        &self,
        stage: &Arc<dyn StageInvoker>,
        context: &str,
    ) -> Result<String, AgentError> {
        let secs = self.stage_timeout.as_secs();
        match tokio::time::timeout(self.stage_timeout, stage.invoke(context)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(reason)) => Err(AgentError::StageFailed {
                stage: stage.role(),
                reason,
            }),
            Err(_) => Err(AgentError::StageTimeout {
                stage: stage.role(),
                secs,
            }),
        }
    }
}

/// 记忆窗口渲染为可读文本；空窗口渲染为 "None"
fn render_window(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "None".to_string();
    }
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 按字符截断，避免在多字节字符中间切断
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_phrases_are_case_insensitive() {
        let plan = "1. No Research Required. Proceed.";
        let lower = plan.to_lowercase();
        assert!(SKIP_RESEARCH_PHRASES.iter().any(|p| lower.contains(p)));
    }

    #[test]
    fn render_window_empty_is_none() {
        assert_eq!(render_window(&[]), "None");
        let msgs = vec![Message::user("hi"), Message::assistant("hello")];
        let rendered = render_window(&msgs);
        assert!(rendered.contains("user: hi"));
        assert!(rendered.contains("assistant: hello"));
    }

    #[test]
    fn truncation_is_char_safe() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 50), "short");
    }
}
