//! versehound daemon: wires the crawler and the acquisition pipeline.
//!
//! One-shot modes (`crawl`, `acquire`, `run`) do their work and exit;
//! daemon mode repeats the full crawl-then-acquire cycle once a day, the
//! way the mirror is meant to be operated.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use versehound_core::{
    load_config, validate_config, AcquisitionPipeline, Config, ConverterError, Crawler,
    HttpPageFetcher, OnyxConverter, PageFetcher, RetryPolicy, SongConverter, SongStore,
    SqliteStore,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("VERSEHOUND_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration; a missing file just means defaults.
    let config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        info!("No config file at {:?}, using defaults", config_path);
        Config::default()
    };

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    // Compute config hash for the startup log
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));

    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "versehound starting"
    );
    info!("Database path: {:?}", config.database.path);
    info!("Listing source: {}", config.source.base_url);

    // Create the SQLite song store
    let store: Arc<dyn SongStore> = Arc::new(
        SqliteStore::new(&config.database.path).context("Failed to create song store")?,
    );
    info!("Song store initialized");

    let policy = RetryPolicy::from_config(&config.retry);

    // Create the listing fetcher
    let fetcher: Arc<dyn PageFetcher> = Arc::new(
        HttpPageFetcher::new(config.source.clone(), policy.clone())
            .context("Failed to create page fetcher")?,
    );

    // Create the converter
    let converter: Arc<dyn SongConverter> =
        Arc::new(OnyxConverter::new(config.converter.clone()));

    let crawler = Crawler::new(
        config.crawler.clone(),
        Arc::clone(&fetcher),
        Arc::clone(&store),
    );

    let pipeline = AcquisitionPipeline::new(
        config.acquisition.clone(),
        Arc::clone(&store),
        Arc::clone(&converter),
        policy,
    )
    .context("Failed to create acquisition pipeline")?;

    let mode = std::env::args().nth(1).unwrap_or_else(|| "run".to_string());
    match mode.as_str() {
        "crawl" => {
            run_crawl(&crawler).await?;
        }
        "acquire" => {
            run_acquire(&pipeline, converter.as_ref()).await?;
        }
        "run" if config.daemon.enabled => {
            daemon_loop(&crawler, &pipeline, converter.as_ref()).await?;
        }
        "run" => {
            run_cycle(&crawler, &pipeline, converter.as_ref()).await?;
        }
        "daemon" => {
            daemon_loop(&crawler, &pipeline, converter.as_ref()).await?;
        }
        other => {
            anyhow::bail!(
                "unknown command '{}' (expected crawl, acquire, run or daemon)",
                other
            );
        }
    }

    Ok(())
}

/// Runs one crawl and logs the outcome.
async fn run_crawl(crawler: &Crawler) -> Result<()> {
    let summary = crawler.run().await.context("Crawl run failed")?;
    info!(
        outcome = ?summary.outcome,
        pages = summary.pages_processed,
        new_records = summary.new_records,
        "crawl finished"
    );
    Ok(())
}

/// Runs one acquisition pass, skipping it when the converter is absent.
async fn run_acquire(pipeline: &AcquisitionPipeline, converter: &dyn SongConverter) -> Result<()> {
    match converter.validate().await {
        Ok(()) => {}
        Err(ConverterError::ToolNotFound { path }) => {
            warn!(
                path = %path.display(),
                "converter binary not found, skipping acquisition"
            );
            return Ok(());
        }
        Err(e) => return Err(e).context("Converter validation failed"),
    }

    let summary = pipeline.run().await.context("Acquisition run failed")?;
    info!(
        attempted = summary.attempted,
        completed = summary.completed,
        skipped = summary.skipped,
        failed = summary.failed,
        "acquisition finished"
    );
    Ok(())
}

/// One full mirror cycle: crawl, then acquire.
async fn run_cycle(
    crawler: &Crawler,
    pipeline: &AcquisitionPipeline,
    converter: &dyn SongConverter,
) -> Result<()> {
    run_crawl(crawler).await?;
    run_acquire(pipeline, converter).await?;
    Ok(())
}

/// Repeats the mirror cycle once a day until interrupted.
async fn daemon_loop(
    crawler: &Crawler,
    pipeline: &AcquisitionPipeline,
    converter: &dyn SongConverter,
) -> Result<()> {
    info!("Daemon mode: updating once a day");
    loop {
        // A failed cycle keeps the daemon alive; progress is durable and
        // the next cycle resumes where this one stopped.
        if let Err(e) = run_cycle(crawler, pipeline, converter).await {
            error!("Daily update failed: {:#}", e);
        }

        let sleep = time_until_midnight();
        info!(
            sleep_secs = sleep.as_secs(),
            "daily update complete, sleeping until midnight"
        );

        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                return Ok(());
            }
            _ = tokio::time::sleep(sleep) => {}
        }
    }
}

/// Duration until the next local midnight.
fn time_until_midnight() -> Duration {
    let now = chrono::Local::now().naive_local();
    let midnight = now
        .date()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0));

    match midnight {
        Some(m) => (m - now).to_std().unwrap_or(Duration::from_secs(60)),
        // Only reachable at the end of representable time.
        None => Duration::from_secs(24 * 3600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_until_midnight_is_within_a_day() {
        let until = time_until_midnight();
        assert!(until <= Duration::from_secs(24 * 3600));
        assert!(until > Duration::ZERO);
    }
}
