//! eventseries-linker - batch entry point
//!
//! Loads cached knowledge-graph query results from the root folder, completes
//! missing attributes, runs the matcher cascade and writes accepted
//! event→series links into the completion cache.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eventseries_common::config;
use eventseries_linker::sources::{InMemoryDblp, QueryResultSource};
use eventseries_linker::store::open_backend;
use eventseries_linker::{Pipeline, Repository};

/// Command-line arguments for eventseries-linker
#[derive(Parser, Debug)]
#[command(name = "eventseries-linker")]
#[command(about = "Link academic events to their event series")]
#[command(version)]
struct Args {
    /// Root folder holding query results and the completion cache
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, env = "EVENTSERIES_CONFIG")]
    config: Option<PathBuf>,

    /// Directory with cached query results (defaults to <root>/queries)
    #[arg(long)]
    query_dir: Option<PathBuf>,

    /// JSON dump of parsed DBLP pages; enables the DBLP matcher
    #[arg(long)]
    dblp_dump: Option<PathBuf>,

    /// Skip volume title lookups against CEUR-WS
    #[arg(long)]
    offline: bool,

    /// Number of strategies that must agree on a link
    #[arg(long)]
    required_to_pass: Option<usize>,

    /// Save the effective configuration to the config file before running
    #[arg(long)]
    write_config: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(config::default_config_path);
    let mut toml_config = config::load_or_default(config_path.as_deref());
    if let Some(required) = args.required_to_pass {
        toml_config.matching.required_to_pass = required;
    }

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| toml_config.logging.level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting eventseries-linker {}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Config: {}", path.display());
    }
    if args.write_config {
        match &config_path {
            Some(path) => match config::write_toml_config(&toml_config, path) {
                Ok(()) => info!(path = %path.display(), "Wrote configuration"),
                Err(e) => warn!(error = %e, "Could not write configuration, continuing"),
            },
            None => warn!("No config path to write the configuration to"),
        }
    }

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    std::fs::create_dir_all(&root_folder)
        .with_context(|| format!("Failed to create root folder {}", root_folder.display()))?;
    info!("Root folder: {}", root_folder.display());

    let query_dir = args.query_dir.unwrap_or_else(|| root_folder.join("queries"));
    let store = QueryResultSource::new(&query_dir)
        .load_store()
        .with_context(|| format!("Failed to load query results from {}", query_dir.display()))?;

    let backend = open_backend(toml_config.cache.backend, &root_folder)
        .await
        .context("Failed to open cache backend")?;
    let mut repo = Repository::open(store, backend)
        .await
        .context("Failed to load completion cache")?;

    if let Some(dump) = &args.dblp_dump {
        let dblp = InMemoryDblp::from_json_file(dump)
            .with_context(|| format!("Failed to load DBLP dump {}", dump.display()))?;
        repo = repo.with_dblp(Arc::new(dblp));
    }

    let mut pipeline = Pipeline::from_config(&toml_config, args.offline)
        .context("Failed to build pipeline")?;
    let report = pipeline
        .run_and_close(&mut repo)
        .await
        .context("Pipeline run failed")?;

    for (strategy, count) in &report.proposals {
        info!(strategy = %strategy, proposals = count, "Strategy proposals");
    }
    info!(
        completions = report.completion.total(),
        failed_lookups = report.completion.failed_lookups,
        events = report.events_considered,
        accepted = report.accepted_matches,
        new = report.new_matches,
        "Done"
    );
    Ok(())
}
