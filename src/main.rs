//! Hive - 多智能体任务编排
//!
//! 入口：初始化日志与配置，组装路由器 / 闲聊 Agent / 流水线编排器，
//! 运行逐行对话循环（`exit` 退出，`clear` 重置会话）。

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use hive::chat::ChatAgent;
use hive::config::load_config;
use hive::core::{Dispatcher, Orchestrator, PipelineStages, SessionState};
use hive::llm::{create_embedder_from_config, create_llm_from_config};
use hive::memory::SharedKnowledgeStore;
use hive::router::InputRouter;
use hive::stage::{LlmStage, StageRole};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hive::observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        hive::config::AppConfig::default()
    });

    let llm = create_llm_from_config(&cfg, &cfg.llm.model);
    let router_model = cfg.llm.router_model.clone().unwrap_or_else(|| cfg.llm.model.clone());
    let router_llm = create_llm_from_config(&cfg, &router_model);

    let embedder = create_embedder_from_config(&cfg);
    let shared = Arc::new(
        SharedKnowledgeStore::open(&cfg.memory.knowledge_dir, embedder, cfg.memory.top_k)
            .await
            .context("Failed to open shared knowledge store")?,
    );

    let stages = PipelineStages {
        planner: Arc::new(LlmStage::new(StageRole::Planner, llm.clone())),
        researcher: Arc::new(LlmStage::new(StageRole::Researcher, llm.clone())),
        summarizer: Arc::new(LlmStage::new(StageRole::Summarizer, llm.clone())),
        email_composer: Arc::new(LlmStage::new(StageRole::EmailComposer, llm.clone())),
    };
    let orchestrator = Orchestrator::new(
        stages,
        shared,
        Duration::from_secs(cfg.pipeline.stage_timeout_secs),
    );

    let mut dispatcher = Dispatcher::new(
        InputRouter::new(router_llm),
        ChatAgent::new(llm, cfg.app.max_chat_messages),
        orchestrator,
    );
    let mut session = SessionState::new();

    println!("Hive multi-agent orchestration. Type 'exit' to quit, 'clear' to reset.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        // 哨兵命令先于路由识别
        if input.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }
        if input.eq_ignore_ascii_case("clear") {
            session.clear();
            println!("Session cleared.");
            continue;
        }

        match dispatcher.handle(input, &mut session).await {
            Ok(reply) => println!("agent: {}\n", reply),
            Err(e) => {
                // 阶段失败只中止当前任务，会话循环继续
                tracing::error!("task failed: {}", e);
                println!("agent error: {}\n", e);
            }
        }
    }

    Ok(())
}
