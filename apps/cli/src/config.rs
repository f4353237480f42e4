//! Layered settings: defaults, `cfgmgmt.toml`, `CFGMGMT_*` environment, flags

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use cfgmgmt::providers::gcp::DEFAULT_IAM_ENDPOINT;
use cfgmgmt::rotation::DEFAULT_KEY_CREATE_TIMEOUT;
use cfgmgmt::runner::DEFAULT_MAX_ROTATIONS;
use figment::Figment;
use figment::providers::{Env, Format as _, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Settings file looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "cfgmgmt.toml";

/// Environment variables read by other layers
const RESERVED_ENV_KEYS: [&str; 5] = ["config", "log", "log_format", "service", "env"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSettings {
    pub endpoint: String,
    #[serde(default = "default_metrics_index")]
    pub index: String,
}

fn default_metrics_index() -> String {
    "cfg_compliance".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub cfg_dir: PathBuf,
    pub max_rotations: usize,
    #[serde(with = "humantime_serde")]
    pub key_create_timeout: Duration,
    pub iam_endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cfg_dir: PathBuf::from("."),
            max_rotations: DEFAULT_MAX_ROTATIONS,
            key_create_timeout: DEFAULT_KEY_CREATE_TIMEOUT,
            iam_endpoint: DEFAULT_IAM_ENDPOINT.to_string(),
            metrics: None,
        }
    }
}

impl Settings {
    /// Merge all layers below the command-line flags
    pub fn figment(settings_file: Option<&Path>) -> Figment {
        let file = settings_file.map_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE), Path::to_path_buf);
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("CFGMGMT_").ignore(&RESERVED_ENV_KEYS).split("__"))
    }

    /// Load settings and apply global flags
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        if let Some(path) = &cli.config {
            anyhow::ensure!(path.is_file(), "settings file {} does not exist", path.display());
        }
        let mut settings: Self = Self::figment(cli.config.as_deref())
            .extract()
            .context("invalid settings")?;
        if let Some(cfg_dir) = &cli.cfg_dir {
            settings.cfg_dir.clone_from(cfg_dir);
        }
        Ok(settings)
    }
}
