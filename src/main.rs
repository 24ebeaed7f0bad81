//! Crewloop 命令行入口：`crewloop <objective>`
//!
//! 初始化日志与配置，装配运行时，跑协作循环并打印结果。Ctrl+C 取消。

use anyhow::Context;
use crewloop::{config::load_config, core::build_runtime, observability};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(std::env::var_os("CREW_CONFIG").map(Into::into))
        .context("Failed to load config")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let objective = if args.is_empty() {
        cfg.coordination.objective.clone().unwrap_or_default()
    } else {
        args.join(" ")
    };
    if objective.trim().is_empty() {
        anyhow::bail!("usage: crewloop <objective> (or set coordination.objective in config)");
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                tracing::info!("Received Ctrl+C, cancelling...");
                cancel.cancel();
            }
        });
    }

    let runtime = build_runtime(&cfg, cancel).context("Failed to build runtime")?;
    let outcome = runtime
        .coordination
        .run(&objective)
        .await
        .context("Coordination failed")?;

    let (prompt_tokens, completion_tokens, total_tokens) = runtime.llm.token_usage();
    tracing::info!(prompt_tokens, completion_tokens, total_tokens, "token usage");

    println!("Status: {} after {} cycle(s)", outcome.status, outcome.cycles);
    println!(
        "Context log: {} ({} blocks)",
        runtime.context_log.path().display(),
        runtime.context_log.block_count()
    );
    if !outcome.result.trim().is_empty() {
        println!("\n{}", outcome.result.trim_end());
    }
    Ok(())
}
