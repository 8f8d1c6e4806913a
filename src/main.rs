//! Fleetwatch driver binary.
//!
//! Loads the TOML configuration, builds the pipeline context and either
//! prints one processed report (`--once`) or runs collection cycles until
//! interrupted.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use fleetwatch::config::load_config;
use fleetwatch::observability::{logging, metrics};
use fleetwatch::processor::Severity;
use fleetwatch::MonitorContext;

#[derive(Parser)]
#[command(name = "fleetwatch")]
#[command(about = "Health-metrics collection and scoring for a fleet of targets", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "fleetwatch.toml")]
    config: PathBuf,

    /// Collect one batch, print the processed report as JSON, and exit.
    #[arg(long)]
    once: bool,

    /// Restrict collection to the named targets.
    #[arg(long, value_delimiter = ',')]
    targets: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.observability);

    tracing::info!(
        config = %cli.config.display(),
        targets = config.targets.len(),
        cache_ttl_secs = config.collector.cache_ttl_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // Shortest configured interval paces the collection loop.
    let interval_ms = config
        .targets
        .iter()
        .map(|t| t.check_interval_ms)
        .min()
        .unwrap_or(15_000);

    let context = MonitorContext::new(config);

    if cli.once {
        let samples = if cli.targets.is_empty() {
            context.collect_all().await
        } else {
            context.collect_specific(&cli.targets).await?
        };
        let report = context.process(&samples);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    tracing::info!(interval_ms, "Starting collection loop");
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_cycle(&context).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received, exiting");
                break;
            }
        }
    }

    Ok(())
}

async fn run_cycle(context: &MonitorContext) {
    let report = context.snapshot().await;

    tracing::info!(
        score = report.summary.overall_health_score,
        healthy = report.summary.healthy_count,
        degraded = report.summary.degraded_count,
        unhealthy = report.summary.unhealthy_count,
        data_quality = report.data_quality_score,
        "Collection cycle complete"
    );

    for alert in &report.alerts {
        match alert.severity {
            Severity::Critical => tracing::error!(
                target = %alert.target,
                metric = ?alert.metric,
                "{}",
                alert.message
            ),
            Severity::Warning => tracing::warn!(
                target = %alert.target,
                metric = ?alert.metric,
                "{}",
                alert.message
            ),
            Severity::Info => tracing::info!(
                target = %alert.target,
                metric = ?alert.metric,
                "{}",
                alert.message
            ),
        }
    }

    for recommendation in &report.recommendations {
        tracing::info!(
            priority = ?recommendation.priority,
            targets = ?recommendation.affected_targets,
            "{}",
            recommendation.title
        );
    }
}
