//! Logger configuration

mod presets;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::LogError;

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Multi-line human readable output
    Pretty,
    /// Single-line human readable output
    #[default]
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl FromStr for Format {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(LogError::Format(other.to_string())),
        }
    }
}

/// Toggles for the decorations of each line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub colors: bool,
    pub time: bool,
    pub source: bool,
    pub target: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            time: true,
            source: false,
            target: true,
        }
    }
}

/// Global fields attached to a root span
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fields {
    pub service: Option<String>,
    pub env: Option<String>,
    pub version: Option<String>,
}

impl Fields {
    /// Read `CFGMGMT_SERVICE` and `CFGMGMT_ENV`
    pub fn from_env() -> Self {
        Self {
            service: std::env::var("CFGMGMT_SERVICE").ok(),
            env: std::env::var("CFGMGMT_ENV").ok(),
            version: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.service.is_none() && self.env.is_none() && self.version.is_none()
    }
}

/// Complete logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// `EnvFilter` directive, e.g. `info,cfgmgmt=debug`
    pub level: String,
    pub format: Format,
    pub display: DisplayConfig,
    pub fields: Fields,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Compact,
            display: DisplayConfig::default(),
            fields: Fields::default(),
        }
    }
}

impl Config {
    /// Override the filter directive
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Override the output format
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Tag the root span with the running binary's version
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.fields.version = Some(version.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("pretty", Format::Pretty)]
    #[case("JSON", Format::Json)]
    #[case(" compact ", Format::Compact)]
    #[case("text", Format::Compact)]
    fn parses_format_names(#[case] input: &str, #[case] expected: Format) {
        assert_eq!(input.parse::<Format>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_format() {
        let err = "xml".parse::<Format>().unwrap_err();
        assert!(matches!(err, LogError::Format(name) if name == "xml"));
    }

    #[test]
    fn builder_style_overrides() {
        let config = Config::default()
            .with_level("debug")
            .with_format(Format::Json)
            .with_version("1.2.3");
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.fields.version.as_deref(), Some("1.2.3"));
        assert!(!config.fields.is_empty());
    }

    #[test]
    fn empty_fields() {
        assert!(Fields::default().is_empty());
        let fields = Fields {
            service: Some("cfgmgmt".into()),
            ..Fields::default()
        };
        assert!(!fields.is_empty());
    }
}
