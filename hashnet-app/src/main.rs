use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use hashnet_common::observability::init_logging;
use hashnet_config::{HashnetConfig, HashnetConfigLoader};

use cli::{Cli, DEFAULT_CONFIG, PhasePlan};

mod cli;
mod pipeline;
mod report;

fn load_config(path: &Path) -> Result<HashnetConfig> {
    let loader = HashnetConfigLoader::new();
    let loader = if path.exists() {
        loader.with_file(path)
    } else if path == Path::new(DEFAULT_CONFIG) {
        // defaults plus HASHNET_* overrides
        loader.with_optional_file(path)
    } else {
        bail!("config file {} not found", path.display());
    };
    loader
        .load()
        .with_context(|| format!("load config {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg = load_config(&cli.config)?;

    // 2) Logging from the `logging` section
    let log_file = init_logging(cfg.logging.to_log_config())?;
    tracing::info!(
        phase = ?cli.phase,
        config = %cli.config.display(),
        log_file = %log_file.display(),
        "run.start"
    );

    let plan = PhasePlan::for_cli(cli.phase, cli.skip_collection);
    if let Err(err) = pipeline::run(cfg, plan, cli.output_dir).await {
        tracing::error!(error = %format!("{err:#}"), "run.failed");
        return Err(err);
    }
    Ok(())
}
