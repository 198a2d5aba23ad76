use anyhow::{bail, Context};
use clap::Parser;
use std::sync::Arc;

use pagespeed_monitor::cli::{Cli, Command, Menu};
use pagespeed_monitor::{
    logging, LogSink, MonitorConfig, PageSpeedClient, ResultSink, Scheduler, ServiceAccountKey,
    ServiceAccountTokenProvider, SheetsSink, TargetList, TaskRunner,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = MonitorConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    logging::init(&config.log_file, cli.verbose)?;
    tracing::info!(
        config = %cli.config.display(),
        targets = config.targets.len(),
        workers = config.workers,
        dry_run = cli.dry_run,
        "PageSpeed Monitor started"
    );

    let targets = TargetList::from_urls(&config.targets).context("Invalid configured target")?;

    match cli.command() {
        Command::Targets => {
            for url in targets.snapshot().await {
                println!("{}", url);
            }
            Ok(())
        }
        command => execute(command, &config, targets, cli.dry_run).await,
    }
}

/// Commands that audit, and so need the client, sink and runner
async fn execute(
    command: Command,
    config: &MonitorConfig,
    targets: TargetList,
    dry_run: bool,
) -> anyhow::Result<()> {
    let client = PageSpeedClient::new(config.pagespeed())?;
    if config.api_key.is_empty() {
        tracing::warn!("No PageSpeed API key configured, requests are subject to anonymous quota");
    }
    let sink = build_sink(config, dry_run)?;
    let runner = Arc::new(TaskRunner::new(config.runner(), Arc::new(client), sink));

    match command {
        Command::Menu => {
            let scheduler = Scheduler::new(runner.clone(), targets.clone(), config.scheduler());
            let menu = Menu::new(runner.clone(), targets, scheduler);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let result = menu.run(stdin, tokio::io::stdout()).await;
            menu.scheduler().stop().await;
            drop(menu);
            runner.shutdown_shared().await;
            result?;
        }
        Command::Run { targets: extra } => {
            for url in &extra {
                targets.add(url).await?;
            }
            if targets.is_empty().await {
                bail!("No targets configured; add some to the config file or pass --target");
            }

            let summary = runner.run_cycle(&targets).await.wait().await;
            println!(
                "Cycle {}: {} completed, {} failed",
                summary.cycle_id, summary.completed, summary.failed
            );
            runner.shutdown_shared().await;
        }
        Command::Watch => {
            let scheduler = Scheduler::new(runner.clone(), targets, config.scheduler());
            scheduler.start().await;
            let signal = tokio::signal::ctrl_c().await;
            scheduler.stop().await;
            drop(scheduler);
            tracing::info!("Stopped by user");
            runner.shutdown_shared().await;
            signal.context("Failed to listen for Ctrl-C")?;
        }
        Command::Targets => {}
    }

    Ok(())
}

fn build_sink(config: &MonitorConfig, dry_run: bool) -> anyhow::Result<Arc<dyn ResultSink>> {
    if dry_run {
        tracing::info!("Dry run: rows are logged, not appended");
        return Ok(Arc::new(LogSink));
    }

    let Some(path) = config.credentials_file.as_ref() else {
        bail!("credentials_file is required unless --dry-run is given");
    };
    let key = ServiceAccountKey::from_file(path)?;
    let tokens = ServiceAccountTokenProvider::new(key, config.scopes.clone())?;
    tracing::info!(
        client_email = tokens.client_email(),
        sheet_id = %config.sheet_id,
        "Using Google Sheets sink"
    );

    Ok(Arc::new(SheetsSink::new(config.sheets(), Arc::new(tokens))?))
}
