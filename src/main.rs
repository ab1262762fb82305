//! CLI entry point for the transit smart-card ETL.
//!
//! `run` executes the daily pipeline once, `init-db` (re)creates the
//! transaction and report tables.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use transit_etl::{
    config::PipelineConfig,
    loader::CsvDirectory,
    pipeline::Pipeline,
    sink::{MemoryStore, PostgresStore, Store},
};

#[derive(Parser)]
#[command(name = "transit_etl")]
#[command(about = "Daily ETL for transit smart-card transactions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once: load, normalize, link, aggregate and export
    Run {
        /// JSON config file. Defaults and environment variables are used when absent
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write tables to memory instead of PostgreSQL (CSV reports are still written)
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Drop and recreate the transaction and report tables
    InitDb {
        /// JSON config file. Defaults and environment variables are used when absent
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/transit_etl.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("transit_etl.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run { config, dry_run } => {
            let config = load_config(config.as_deref())?;
            if dry_run {
                info!("Dry run: tables are kept in memory");
                run(config, MemoryStore::new()).await
            } else {
                let store = PostgresStore::connect(&config.database.url())
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                run(config, store).await
            }
        }
        Commands::InitDb { config } => {
            let config = load_config(config.as_deref())?;
            let store = PostgresStore::connect(&config.database.url())
                .await
                .context("Failed to connect to PostgreSQL")?;
            let source = CsvDirectory::from_config(&config);
            Pipeline::new(config, source, store)
                .init_schema()
                .await
                .map_err(anyhow::Error::from)
        }
    };

    if let Err(e) = &outcome {
        error!(error = %e, "ETL failed");
    }
    outcome
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::from_env()?,
    };
    info!(
        source_dir = %config.source_dir().display(),
        output_dir = %config.output_dir().display(),
        "Config loaded"
    );
    Ok(config)
}

async fn run<S: Store>(config: PipelineConfig, store: S) -> Result<()> {
    let source = CsvDirectory::from_config(&config);
    let pipeline = Pipeline::new(config, source, store);
    let summary = pipeline.run().await?;

    info!(summary = %serde_json::to_string(&summary)?, "Run summary");
    info!("ETL completed successfully");
    Ok(())
}
