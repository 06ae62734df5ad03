//! job-feed-bot: binary entrypoint.
//! Loads config, wires the pipeline, and runs the scheduler with the admin API
//! or a single delivery cycle.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use job_feed_bot::api::{self, AppState};
use job_feed_bot::config::{AppConfig, TelegramSecrets};
use job_feed_bot::jobs::fetch::{HttpFetcher, PageFetcher};
use job_feed_bot::metrics::Metrics;
use job_feed_bot::notify::{LogNotifier, Notifier, TelegramNotifier};
use job_feed_bot::DeliveryLoop;

#[derive(Parser, Debug)]
#[command(name = "job-feed-bot", about = "Relay new job postings to a Telegram chat")]
struct Cli {
    /// Config file (TOML); defaults to config/job_bot.toml when present
    #[arg(long, env = "JOB_BOT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log messages instead of sending them to Telegram
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Scheduler plus admin API (default)
    Run,
    /// One delivery cycle, then exit
    Once,
    /// Validate configuration and exit
    CheckConfig,
}

/// LOG_FORMAT=json switches to JSON lines; RUST_LOG overrides the default level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

/// Fetcher, notifier and delivery loop; also returns the chat shown on /status.
fn wire(cfg: &AppConfig, dry_run: bool) -> Result<(Arc<DeliveryLoop>, String)> {
    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&cfg.user_agent, cfg.http_timeout())?);
    let (notifier, target_chat) = build_notifier(dry_run)?;
    let delivery = job_feed_bot::build_delivery_loop(cfg, fetcher, notifier)?;
    Ok((Arc::new(delivery), target_chat))
}

fn build_notifier(dry_run: bool) -> Result<(Arc<dyn Notifier>, String)> {
    if dry_run {
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        return Ok((notifier, "(dry run)".to_string()));
    }
    let secrets = TelegramSecrets::from_env().context("telegram credentials")?;
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(&secrets));
    Ok((notifier, secrets.chat_id))
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = AppConfig::load(cli.config.as_deref())?;
    let command = cli.command.unwrap_or(Command::Run);

    match command {
        Command::CheckConfig => {
            let sites = job_feed_bot::jobs::sites::build_extractors(&cfg.sites)?;
            tracing::info!(
                sites = sites.len(),
                queries = cfg.search_queries.len(),
                state = %cfg.state_path.display(),
                "config ok"
            );
        }
        Command::Once => {
            let (delivery, _) = wire(&cfg, cli.dry_run)?;
            let jobs = delivery.run_once().await;
            tracing::info!(delivered = jobs.len(), "single cycle done");
        }
        Command::Run => {
            // recorder first, so metric descriptions land in it
            let metrics = Metrics::init()?;
            let (delivery, target_chat) = wire(&cfg, cli.dry_run)?;
            let scheduler = Arc::clone(&delivery).spawn_scheduler();

            let state = AppState {
                delivery,
                target_chat,
            };
            let app = api::create_router(state).merge(metrics.router());
            let listener = tokio::net::TcpListener::bind(&cfg.api_bind)
                .await
                .with_context(|| format!("binding {}", cfg.api_bind))?;
            tracing::info!(addr = %cfg.api_bind, "bot started");

            tokio::select! {
                res = axum::serve(listener, app) => res.context("admin api server")?,
                _ = tokio::signal::ctrl_c() => tracing::info!("bot stopped"),
            }
            scheduler.abort();
        }
    }
    Ok(())
}
