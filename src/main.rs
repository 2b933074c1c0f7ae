use anyhow::Context;
use rental_sync::config::AppConfig;
use rental_sync::engine::{SyncEngine, SyncReport};
use rental_sync::feeds::HttpFeedClient;
use rental_sync::ledger::{apply_seed, SeedFile, SqliteLedger};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🏠 Rental Sync - calendar reconciliation");
    info!("========================================");

    let config = AppConfig::from_env().context("Invalid configuration")?;

    let ledger = SqliteLedger::open(&config.db_path).context("Failed to open booking ledger")?;
    if let Some(seed_path) = &config.seed_file {
        let seed = SeedFile::load(seed_path).context("Failed to load seed file")?;
        apply_seed(&ledger, &seed).context("Failed to apply seed file")?;
    }

    let client = HttpFeedClient::new(config.feed_timeout)?;
    let engine = SyncEngine::new(Arc::new(ledger), Arc::new(client), config.lookback_days);

    let Some(interval) = config.sync_interval else {
        let report = engine.run().await.context("Sync failed")?;
        return publish(&report, &config).await;
    };

    info!("Syncing every {}s, Ctrl-C to stop", interval.as_secs());
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match engine.run().await {
                    Ok(report) => publish(&report, &config).await?,
                    Err(e) => error!("Sync failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping");
                return Ok(());
            }
        }
    }
}

/// Print a summary and save the reconciled view as JSON
async fn publish(report: &SyncReport, config: &AppConfig) -> anyhow::Result<()> {
    info!(
        "✅ {} occupancies across {} properties",
        report.occupancies.len(),
        report.properties.len()
    );

    for occupancy in &report.occupancies {
        println!(
            "{} → {}  {:<8} {} ({})",
            occupancy.start,
            occupancy.end,
            occupancy.provenance.as_str(),
            occupancy.property_name,
            occupancy.title
        );
    }

    let persistence = &report.persistence;
    println!();
    println!(
        "Ledger: {} new, {} already ingested, {} unresolved",
        persistence.inserted, persistence.already_ingested, persistence.unresolved
    );
    if let Some(err) = &persistence.error {
        println!("Ledger write FAILED: {}", err);
    }

    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(&config.output_path, json)
        .await
        .with_context(|| format!("Failed to write {}", config.output_path.display()))?;
    info!("💾 Saved occupancy view to {}", config.output_path.display());

    Ok(())
}
