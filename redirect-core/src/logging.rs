use crate::error::RedirectError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration shared by every host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Whether to include timestamps in logs
    pub include_timestamp: bool,

    /// Whether to include file and line number information
    pub include_file_info: bool,

    /// Whether to enable colored output
    pub enable_colors: bool,

    /// Module-specific log levels
    pub module_levels: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let mut module_levels = BTreeMap::new();
        module_levels.insert("redirect_core".to_string(), "info".to_string());

        Self {
            level: "info".to_string(),
            include_timestamp: true,
            include_file_info: false,
            enable_colors: true,
            module_levels,
        }
    }
}

impl LoggingConfig {
    /// Config for hosts without a terminal or a wall clock (the browser console).
    pub fn console() -> Self {
        Self {
            include_timestamp: false,
            enable_colors: false,
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}

/// Build the env filter described by `config`.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if !levels::is_valid_level(&config.level) {
        return Err(RedirectError::Configuration(format!(
            "Invalid log level: {}",
            config.level
        )));
    }

    let mut filter = EnvFilter::new(&config.level);
    for (module, level) in &config.module_levels {
        let directive = format!("{}={}", module, level);
        filter = filter.add_directive(directive.parse().map_err(|e| {
            RedirectError::Configuration(format!("Invalid log directive {}: {}", directive, e))
        })?);
    }
    Ok(filter)
}

/// Initialize logging to stdout
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    init_logging_with_writer(config, std::io::stdout)
}

/// Initialize logging with a custom writer. Repeated initialization is ignored.
pub fn init_logging_with_writer<W>(config: &LoggingConfig, writer: W) -> Result<()>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = build_filter(config)?;
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_file(config.include_file_info)
        .with_line_number(config.include_file_info)
        .with_ansi(config.enable_colors);

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.include_timestamp {
        registry.with(layer).try_init()
    } else {
        registry.with(layer.without_time()).try_init()
    };

    match result {
        Ok(_) => tracing::debug!("Logging initialized with level: {}", config.level),
        Err(_) => tracing::debug!("Logging already initialized, skipping"),
    }
    Ok(())
}

/// Log level utilities
pub mod levels {
    /// Check if a log level string is valid
    pub fn is_valid_level(level: &str) -> bool {
        matches!(
            level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error" | "off"
        )
    }
}
