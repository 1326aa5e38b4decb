//! Server configuration.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `BACKGAMMON_*` environment variables (a `.env` file is loaded first by
//! the binary), then command-line flags.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Prefix of the environment variables that override the file.
pub const ENV_PREFIX: &str = "BACKGAMMON_";

/// Configuration for the match server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[setters(into)]
    host: String,

    /// Port to bind.
    port: u16,

    /// Seconds a disconnected player has to resume before forfeiting.
    grace_period_secs: u64,

    /// Fixed dice seed for reproducible runs; entropy when unset.
    #[setters(strip_option)]
    dice_seed: Option<u64>,

    /// Messages buffered per connection before new ones are dropped.
    outbox_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            grace_period_secs: 30,
            dice_seed: None,
            outbox_capacity: 64,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file; missing keys keep defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Applies `BACKGAMMON_*` variables from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Applies `BACKGAMMON_*` overrides read through `lookup`.
    ///
    /// Recognised keys: `HOST`, `PORT`, `GRACE_PERIOD_SECS`, `DICE_SEED`,
    /// `OUTBOX_CAPACITY`.
    #[instrument(skip(self, lookup))]
    pub fn apply_env_with(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(host) = var("HOST") {
            self.host = host;
        }
        if let Some(port) = var("PORT") {
            self.port = parse_var("PORT", &port)?;
        }
        if let Some(secs) = var("GRACE_PERIOD_SECS") {
            self.grace_period_secs = parse_var("GRACE_PERIOD_SECS", &secs)?;
        }
        if let Some(seed) = var("DICE_SEED") {
            self.dice_seed = Some(parse_var("DICE_SEED", &seed)?);
        }
        if let Some(capacity) = var("OUTBOX_CAPACITY") {
            self.outbox_capacity = parse_var("OUTBOX_CAPACITY", &capacity)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outbox_capacity == 0 {
            return Err(ConfigError::new("outbox_capacity must be at least 1".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::new("host must not be empty".to_string()));
        }
        Ok(())
    }

    /// Grace period as a duration.
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::new(format!("Failed to render config: {}", e)))
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::new(format!("{ENV_PREFIX}{name}={raw:?}: {e}")))
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
