//! Subcommand handlers

mod candidates;
mod drain;
mod report;
mod rotate;

use std::io::Write;

use anyhow::Context as _;
use cfgmgmt::{CfgDir, CfgMetadata, DirElementStore};
use serde::Serialize;
use tracing::warn;

use crate::cli::{Cli, Command, OutputFormat};
use crate::config::Settings;

/// Run the selected subcommand; returns the process exit code
pub async fn run(cli: Cli) -> anyhow::Result<u8> {
    let settings = Settings::load(&cli)?;
    match cli.command {
        Command::Report(args) => report::run(&settings, &args).await,
        Command::Candidates(args) => candidates::run(&settings, &args),
        Command::Rotate(args) => rotate::run(&settings, &args).await,
        Command::DrainQueue(args) => drain::run(&settings, &args).await,
    }
}

/// Element store and metadata of the configured directory
pub(crate) struct Workspace {
    pub cfg: CfgDir,
    pub store: DirElementStore,
    pub metadata: CfgMetadata,
}

impl Workspace {
    pub fn open(settings: &Settings) -> anyhow::Result<Self> {
        let cfg = CfgDir::new(&settings.cfg_dir);
        let store = DirElementStore::open(&settings.cfg_dir)
            .with_context(|| format!("cannot read elements from {}", settings.cfg_dir.display()))?;
        let metadata = cfg.load_metadata().context("cannot load metadata")?;
        for issue in metadata.inconsistencies() {
            warn!(cfg_dir = %settings.cfg_dir.display(), "{issue}");
        }
        Ok(Self {
            cfg,
            store,
            metadata,
        })
    }
}

pub(crate) fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("cfgmgmt/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("cannot build HTTP client")
}

pub(crate) fn print<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(value)?;
            json.push('\n');
            json
        }
    };
    std::io::stdout()
        .lock()
        .write_all(rendered.as_bytes())
        .context("cannot write to stdout")
}
