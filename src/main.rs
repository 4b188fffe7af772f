use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

use rso_catalog::config::CatalogConfig;
use rso_catalog::infra::LocationFetcher;
use rso_catalog::logging;
use rso_catalog::metrics::install_prometheus_exporter;
use rso_catalog::pipeline::Pipeline;
use rso_catalog::storage::FsCatalogStore;

#[derive(Parser)]
#[command(name = "rso_catalog")]
#[command(about = "Reconcile multi-source orbital element catalogs into one table")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, reconcile and write the catalog tables
    Run {
        /// Path to the catalog configuration (TOML)
        #[arg(long, default_value = "catalog.toml")]
        config: PathBuf,
        /// Override the configured output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Serve Prometheus metrics on this address while running
        #[arg(long)]
        metrics_addr: Option<SocketAddr>,
    },
    /// Validate the configuration and print the resolved sources
    CheckConfig {
        #[arg(long, default_value = "catalog.toml")]
        config: PathBuf,
    },
}

/// Relative source locations resolve against the config file's directory
fn config_root(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

async fn run(config_path: &Path, output_dir: Option<PathBuf>, metrics_addr: Option<SocketAddr>) -> anyhow::Result<()> {
    if let Some(addr) = metrics_addr {
        install_prometheus_exporter(addr)?;
    }

    let mut config = CatalogConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }

    let root = config_root(config_path);
    let output_dir = root.join(&config.output_dir);
    let fetcher = LocationFetcher::new(root, Duration::from_secs(config.http_timeout_secs))?;
    let store = FsCatalogStore::new(&output_dir);

    println!("🛰️  Reconciling {} source(s)...", config.sources.len());
    let pipeline = Pipeline::new(config, Arc::new(fetcher));
    let result = pipeline
        .run_with_store(&store)
        .await
        .context("writing catalog output")?;
    let report = &result.report;

    println!("\n📊 Catalog Results:");
    for source in &report.sources {
        println!(
            "   [{}] rows: {}, malformed: {}, invalid: {}, keyless: {}, won: {}",
            source.source_id,
            source.rows_loaded,
            source.malformed_rows,
            source.invalid_records,
            source.keyless_records,
            source.objects_won
        );
    }
    println!("   Reconciled objects: {}", report.reconciled_objects);
    println!("   Emitted objects: {}", report.emitted_objects);
    println!("   Dropped (unresolved source): {}", report.unresolved.len());
    println!("   Output: {}", output_dir.display());

    if !report.failures.is_empty() {
        println!("\n⚠️  Sources that contributed nothing:");
        for failure in &report.failures {
            println!("   - {} {} ({:?}): {}", failure.source_id, failure.location, failure.stage, failure.reason);
        }
    }
    Ok(())
}

fn check_config(config_path: &Path) -> anyhow::Result<()> {
    let config = CatalogConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    println!("✅ {} is valid", config_path.display());
    println!("   Priority: {}", config.source_priority.join(" > "));
    for source in &config.sources {
        println!(
            "   [{}] {} ({:?}, {:?}) <- {}",
            source.id,
            source.name,
            source.angle_unit,
            source.element_representation,
            source.locations.join(", ")
        );
    }
    if let Some(table) = &config.descriptor_table {
        println!("   Descriptors: {}", table);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            config,
            output_dir,
            metrics_addr,
        } => run(&config, output_dir, metrics_addr).await,
        Commands::CheckConfig { config } => check_config(&config),
    };

    if let Err(e) = &outcome {
        error!("Run failed: {:#}", e);
    }
    outcome
}
