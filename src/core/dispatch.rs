//! 调度器：把路由决策落到会话上
//!
//! RESUME 语义：合并原问题与新输入、在重新分发前清除待恢复任务（否则再次暂停会
//! 造成无限恢复循环）、对合并文本重新分类并执行。COMPLEX_TASK 的输出若以问号
//! 结尾，则用合并前的原问题重新挂起，让澄清循环可以继续。

use crate::chat::ChatAgent;
use crate::core::{AgentError, Orchestrator, SessionState};
use crate::router::{InputRouter, RoutingDecision};

/// 会话调度器：路由 → 闲聊 / 追问 / 恢复 / 任务流水线
pub struct Dispatcher {
    router: InputRouter,
    chat: ChatAgent,
    orchestrator: Orchestrator,
}

impl Dispatcher {
    pub fn new(router: InputRouter, chat: ChatAgent, orchestrator: Orchestrator) -> Self {
        Self {
            router,
            chat,
            orchestrator,
        }
    }

    /// 处理一条用户输入，返回要展示的回复。
    /// 阶段失败时清除待恢复任务后上抛，调用方报告错误即可继续接收输入。
    pub async fn handle(
        &mut self,
        input: &str,
        session: &mut SessionState,
    ) -> Result<String, AgentError> {
        let decision = self.router.classify(input, session).await;
        tracing::debug!("routed {:?} as {}", input, decision.name());

        let result = match decision {
            RoutingDecision::Resume => {
                // take 先清除再分发，重新分类此时不可能再得到 RESUME
                let original = session
                    .take_pending()
                    .map(|p| p.original_query)
                    .unwrap_or_default();
                let merged = format!("{} {}", original, input);
                let redecision = self.router.classify(&merged, session).await;
                tracing::info!("resumed task reclassified as {}", redecision.name());
                self.execute(redecision, &merged, Some(&original), session)
                    .await
            }
            other => self.execute(other, input, None, session).await,
        };

        if result.is_err() {
            // 失败的运行不能留下半截的恢复状态
            session.pending_task = None;
        }
        result
    }

    /// 执行一个（非 RESUME 的）决策。rearm_query 是合并前的原问题，
    /// 任务输出以问号结尾时用它重新挂起。
    async fn execute(
        &mut self,
        decision: RoutingDecision,
        query: &str,
        rearm_query: Option<&str>,
        session: &mut SessionState,
    ) -> Result<String, AgentError> {
        match decision {
            RoutingDecision::Chat => self.chat.respond(query, session).await,
            RoutingDecision::Clarify { question } => {
                session.set_pending(query);
                Ok(question)
            }
            RoutingDecision::ComplexTask => {
                let answer = self.orchestrator.run_task(query).await?;
                if answer.trim_end().ends_with('?') {
                    session.set_pending(rearm_query.unwrap_or(query));
                }
                Ok(answer)
            }
            // classify 的契约保证 RESUME 只在有待恢复任务时出现，
            // 而 handle 在进入这里之前已清除它
            RoutingDecision::Resume => Err(AgentError::UnknownMode("RESUME".to_string())),
        }
    }
}

/// 独立于路由的任务入口：只认 COMPLEX_TASK，其余模式一律报错
pub async fn dispatch_task(
    orchestrator: &mut Orchestrator,
    query: &str,
    decision: &RoutingDecision,
) -> Result<String, AgentError> {
    match decision {
        RoutingDecision::ComplexTask => orchestrator.run_task(query).await,
        other => Err(AgentError::UnknownMode(other.name().to_string())),
    }
}
