//! Command-line arguments

use std::path::PathBuf;

use cfgmgmt::CfgTarget;
use cfgmgmt::RotationMethod;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "cfgmgmt")]
#[command(about = "Credential compliance reports and rotation for configuration directories")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (TOML); defaults to ./cfgmgmt.toml when present
    #[arg(long, global = true, env = "CFGMGMT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Configuration directory holding elements and metadata files
    #[arg(long, global = true)]
    pub cfg_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, global = true, value_parser = ["pretty", "compact", "json"])]
    pub log_format: Option<String>,
}

impl Cli {
    pub fn log_config(&self) -> cfgmgmt_log::Config {
        let mut config = cfgmgmt_log::Config::from_env().with_version(env!("CARGO_PKG_VERSION"));
        match self.verbose {
            0 => {}
            1 => config = config.with_level("info,cfgmgmt=debug"),
            _ => config = config.with_level("debug,cfgmgmt=trace"),
        }
        if let Some(format) = self.log_format.as_deref().and_then(|f| f.parse().ok()) {
            config = config.with_format(format);
        }
        config
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a compliance report for every element
    Report(ReportArgs),

    /// List elements whose policy requires rotation now
    Candidates(SelectArgs),

    /// Rotate due credentials and queue the old ones for deletion
    Rotate(RotateArgs),

    /// Delete queued credentials whose grace period is over
    DrainQueue(DrainArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[arg(long, value_enum, default_value_t)]
    pub output: OutputFormat,

    /// Name recorded as the storage of every element
    #[arg(long)]
    pub storage: Option<String>,

    /// Only print the aggregated counts
    #[arg(long)]
    pub summary: bool,

    /// Also send the records to the configured metrics sink
    #[arg(long)]
    pub send_metrics: bool,
}

#[derive(Debug, Clone, Args)]
pub struct SelectArgs {
    /// Only this element, as `type/name`
    #[arg(long, value_parser = parse_target)]
    pub target: Option<CfgTarget>,

    /// Only elements whose policy uses this rotation method
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,
}

#[derive(Debug, Args)]
pub struct RotateArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Upper bound of rotations in this run
    #[arg(long)]
    pub max_rotations: Option<usize>,
}

#[derive(Debug, Args)]
pub struct DrainArgs {
    /// Only entries of this element, as `type/name`
    #[arg(long, value_parser = parse_target)]
    pub target: Option<CfgTarget>,

    /// List due entries without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Manual,
    Automated,
}

impl From<MethodArg> for RotationMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::Manual => Self::Manual,
            MethodArg::Automated => Self::Automated,
        }
    }
}

fn parse_target(raw: &str) -> Result<CfgTarget, String> {
    CfgTarget::parse_reference(raw).ok_or_else(|| format!("expected `type/name`, got {raw:?}"))
}
