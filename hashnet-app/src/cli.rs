use std::path::PathBuf;

use clap::{Parser, ValueEnum};

pub const DEFAULT_CONFIG: &str = "hashnet.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Phase {
    /// Fetch posts for the configured hashtags and store them
    Collect,
    /// Build graphs, compute metrics and export graph JSON
    Analyze,
    /// Render charts and the HTML dashboard
    Visualize,
    /// Collect, analyze and visualize, then write the report
    All,
    /// Verify credentials, database and API connectivity
    Check,
}

#[derive(Debug, Parser)]
#[command(name = "hashnet")]
#[command(about = "Hashtag and mention network analysis over social media posts")]
pub struct Cli {
    /// Which phase to run
    #[arg(long, value_enum, default_value_t = Phase::All)]
    pub phase: Phase,

    /// Skip the collect phase when running `all`
    #[arg(long)]
    pub skip_collection: bool,

    /// YAML configuration file
    #[arg(long, env = "HASHNET_CONFIG", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Override `analysis.output_dir`
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// Steps a run performs, derived from the phase flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhasePlan {
    pub check: bool,
    pub collect: bool,
    pub analyze: bool,
    pub visualize: bool,
}

impl PhasePlan {
    pub fn for_cli(phase: Phase, skip_collection: bool) -> Self {
        match phase {
            Phase::Check => Self {
                check: true,
                ..Self::default()
            },
            Phase::Collect => Self {
                collect: true,
                ..Self::default()
            },
            Phase::Analyze => Self {
                analyze: true,
                ..Self::default()
            },
            Phase::Visualize => Self {
                visualize: true,
                ..Self::default()
            },
            Phase::All => Self {
                check: false,
                collect: !skip_collection,
                analyze: true,
                visualize: true,
            },
        }
    }

    /// Credentials matter only when the search API is called.
    pub fn needs_credentials(&self) -> bool {
        self.check || self.collect
    }

    /// The report summarises a data run; `check` alone does not produce one.
    pub fn writes_report(&self) -> bool {
        self.collect || self.analyze || self.visualize
    }
}
