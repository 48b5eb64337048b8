//! Configuration types and utilities

use crate::error::RedirectError;
use crate::pattern::UrlPattern;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_WATCH_PATTERN: &str = "*://*.youtube.com/watch?*";
pub const DEFAULT_PLAYER_PATTERN: &str = "*://*.youtube.com/*/player?*";
pub const DEFAULT_MARKER_PARAM: &str = "themeRefresh";
pub const DEFAULT_MARKER_VALUE: &str = "1";
pub const DEFAULT_SEEN_TTL_MS: u64 = 60_000;
pub const DEFAULT_SEEN_MAX_ENTRIES: usize = 4096;

/// Top-level interceptor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RedirectConfig {
    pub watch: WatchConfig,
    pub player: PlayerConfig,
    pub seen: SeenConfig,
}

/// Watch-page rewriter settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    /// URL match patterns the rewriter listens on
    pub patterns: Vec<String>,
    /// Query parameter appended to rewritten URLs
    pub marker_param: String,
    pub marker_value: String,
    /// Only rewrite GET navigations
    pub get_only: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            patterns: vec![DEFAULT_WATCH_PATTERN.to_string()],
            marker_param: DEFAULT_MARKER_PARAM.to_string(),
            marker_value: DEFAULT_MARKER_VALUE.to_string(),
            get_only: true,
        }
    }
}

/// Player-endpoint redirector settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub patterns: Vec<String>,
    /// Append the watch marker to synthesized watch URLs
    pub carry_marker: bool,
    pub suppress_autoplay: bool,
    pub suppress_autonav: bool,
    /// Referer path prefixes for which the in-page transition is kept
    pub suppressed_referer_prefixes: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            patterns: vec![DEFAULT_PLAYER_PATTERN.to_string()],
            carry_marker: true,
            suppress_autoplay: true,
            suppress_autonav: true,
            suppressed_referer_prefixes: vec![
                "/embed".to_string(),
                "/watch".to_string(),
                "/@".to_string(),
            ],
        }
    }
}

/// Idempotency store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeenConfig {
    pub ttl_ms: u64,
    pub max_entries: usize,
}

impl Default for SeenConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_SEEN_TTL_MS,
            max_entries: DEFAULT_SEEN_MAX_ENTRIES,
        }
    }
}

impl RedirectConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| RedirectError::Configuration(format!("Failed to parse config: {}", e)))
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Apply `REDIRECT_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (environment-shaped keys).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(param) = lookup("REDIRECT_MARKER_PARAM") {
            self.watch.marker_param = param;
        }
        if let Some(value) = lookup("REDIRECT_WATCH_GET_ONLY") {
            self.watch.get_only = parse_bool("REDIRECT_WATCH_GET_ONLY", &value)?;
        }
        if let Some(value) = lookup("REDIRECT_CARRY_MARKER") {
            self.player.carry_marker = parse_bool("REDIRECT_CARRY_MARKER", &value)?;
        }
        if let Some(value) = lookup("REDIRECT_SUPPRESSED_REFERERS") {
            self.player.suppressed_referer_prefixes = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(value) = lookup("REDIRECT_SEEN_TTL_MS") {
            self.seen.ttl_ms = value.parse().map_err(|_| {
                RedirectError::Configuration(format!("Invalid REDIRECT_SEEN_TTL_MS: {}", value))
            })?;
        }
        if let Some(value) = lookup("REDIRECT_SEEN_MAX_ENTRIES") {
            self.seen.max_entries = value.parse().map_err(|_| {
                RedirectError::Configuration(format!(
                    "Invalid REDIRECT_SEEN_MAX_ENTRIES: {}",
                    value
                ))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.watch.patterns.is_empty() {
            return Err(RedirectError::Configuration(
                "watch.patterns must not be empty".to_string(),
            ));
        }
        if self.player.patterns.is_empty() {
            return Err(RedirectError::Configuration(
                "player.patterns must not be empty".to_string(),
            ));
        }
        UrlPattern::parse_all(&self.watch.patterns)?;
        UrlPattern::parse_all(&self.player.patterns)?;

        if self.watch.marker_param.trim().is_empty() {
            return Err(RedirectError::Configuration(
                "watch.marker_param must not be empty".to_string(),
            ));
        }
        if self.seen.ttl_ms == 0 {
            return Err(RedirectError::Configuration(
                "seen.ttl_ms must be greater than zero".to_string(),
            ));
        }
        if self.seen.max_entries == 0 {
            return Err(RedirectError::Configuration(
                "seen.max_entries must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RedirectError::Configuration(format!(
            "Invalid boolean for {}: {}",
            key, value
        ))),
    }
}
