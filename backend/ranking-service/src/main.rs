use anyhow::{bail, Context};
use content_cache::{CacheMetrics, Clock, ContentCache, RedisCache, SystemClock};
use content_ranking::{
    config::LogFormat,
    jobs::{build_inspection_report, ScoreBatchConfig, ScoreBatchJob},
    Config, ContentRankingService, PgPostStore, PostStore,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, PartialEq)]
enum Mode {
    ScoreBatch { force: bool },
    Inspect { limit: usize },
    Config,
}

fn parse_args(args: &[String]) -> anyhow::Result<Mode> {
    let mut mode = "score-batch".to_string();
    let mut force = false;
    let mut limit = 10usize;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--mode" => mode = iter.next().context("--mode needs a value")?.clone(),
            "--force" => force = true,
            "--limit" => {
                limit = iter
                    .next()
                    .context("--limit needs a value")?
                    .parse()
                    .context("--limit must be a non-negative integer")?
            }
            other => bail!("unknown argument {other}"),
        }
    }

    match mode.as_str() {
        "score-batch" => Ok(Mode::ScoreBatch { force }),
        "inspect" => Ok(Mode::Inspect { limit }),
        "config" => Ok(Mode::Config),
        other => bail!("unknown mode {other}; expected score-batch, inspect or config"),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load config")?;
    init_tracing(config.service.log_format);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = parse_args(&args)?;

    info!(service = %config.service.service_name, ?mode, "Starting");

    let authority = Arc::new(config.ranking.load_authority_table()?);

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to Postgres")?;
    let store: Arc<dyn PostStore> = Arc::new(PgPostStore::new(pool));

    let redis = RedisCache::connect(&config.redis.url)
        .await
        .context("Failed to connect to Redis")?;
    redis.ping().await.context("Redis did not answer PING")?;
    CacheMetrics::register_default().context("Failed to register cache metrics")?;
    let cache = ContentCache::with_metrics(Arc::new(redis), CacheMetrics::new());

    let service = Arc::new(ContentRankingService::new(
        store.clone(),
        cache,
        authority,
        config.ranking.clone(),
    ));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match mode {
        Mode::ScoreBatch { force } => {
            let mut batch_config = ScoreBatchConfig::from_env();
            batch_config.force |= force;

            let job = ScoreBatchJob::new(batch_config, service, store, clock);
            let stats = job.run().await?;
            info!(
                processed = stats.posts_processed,
                succeeded = stats.posts_succeeded,
                failed = stats.posts_failed,
                "Score batch job completed"
            );
        }
        Mode::Inspect { limit } => {
            let report = build_inspection_report(
                &service,
                store.as_ref(),
                limit,
                config.ranking.thresholds.trending_hours,
                clock.now(),
            )
            .await?;
            if report.is_empty() {
                warn!("No published posts found");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Mode::Config => {
            let configuration = service.get_configuration(clock.now());
            println!("{}", serde_json::to_string_pretty(&configuration)?);
        }
    }

    Ok(())
}
