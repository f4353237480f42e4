//! Logger builder implementation

use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Format};
use crate::core::{LogError, LogResult};

/// Logger builder
#[derive(Debug)]
pub struct LoggerBuilder {
    config: Config,
}

/// Guard that keeps the root span entered
///
/// Drop it at the end of `main`.
#[derive(Debug)]
pub struct LoggerGuard {
    #[allow(dead_code)]
    root_span: Option<tracing::span::EnteredSpan>,
}

/// Avoids repeating the registry + filter + fmt chain per format.
macro_rules! init_subscriber {
    ($filter:expr, $fmt_layer:expr) => {
        Registry::default()
            .with($filter)
            .with($fmt_layer)
            .try_init()
            .map_err(|e| LogError::AlreadyInitialised(e.to_string()))
    };
}

impl LoggerBuilder {
    /// Create builder from config
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Build and install the global subscriber
    ///
    /// Fails if the filter does not parse or a subscriber is already set.
    pub fn build(self) -> LogResult<LoggerGuard> {
        let filter = EnvFilter::try_new(&self.config.level)
            .map_err(|e| LogError::Filter(format!("{}: {}", self.config.level, e)))?;
        let display = &self.config.display;

        match self.config.format {
            Format::Pretty => {
                let layer = tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(display.colors)
                    .with_target(display.target)
                    .with_file(display.source)
                    .with_line_number(display.source)
                    .with_writer(std::io::stderr);
                init_subscriber!(filter, layer)?;
            }
            Format::Compact => {
                let layer = tracing_subscriber::fmt::layer()
                    .compact()
                    .with_ansi(display.colors)
                    .with_target(display.target)
                    .with_file(display.source)
                    .with_line_number(display.source)
                    .with_writer(std::io::stderr);
                if display.time {
                    init_subscriber!(filter, layer)?;
                } else {
                    init_subscriber!(filter, layer.without_time())?;
                }
            }
            Format::Json => {
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(display.target)
                    .with_file(display.source)
                    .with_line_number(display.source)
                    .with_writer(std::io::stderr);
                init_subscriber!(filter, layer)?;
            }
        }

        let root_span = if self.config.fields.is_empty() {
            None
        } else {
            let fields = &self.config.fields;
            let span = tracing::info_span!(
                "app",
                service = fields.service.as_deref().unwrap_or(""),
                env = fields.env.as_deref().unwrap_or(""),
                version = fields.version.as_deref().unwrap_or("")
            );
            Some(span.entered())
        };

        Ok(LoggerGuard { root_span })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_is_reported() {
        let config = Config::default().with_level("cfgmgmt=verbose");
        let err = LoggerBuilder::from_config(config).build().unwrap_err();
        assert!(matches!(err, LogError::Filter(_)));
    }
}
