use anyhow::Result;
use clap::Parser;

use flowgate_core::config::FlowgateConfig;
use flowgate_daemon::cli::DaemonCli;
use flowgate_daemon::logging;
use flowgate_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // 설정 로드: 파일 → 환경변수 → CLI 순으로 덮어씀
    let mut config = FlowgateConfig::from_file(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load {}: {}", cli.config.display(), e))?;
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "flowgate-daemon starting"
    );

    let mut orchestrator = Orchestrator::build_from_config(config)?;
    let result = orchestrator.run().await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "flowgate-daemon exited with error");
    }
    result
}
