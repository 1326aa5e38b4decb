//! Command-line interface for the match server.

use crate::config::{ConfigError, ServerConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::instrument;

/// Strictly Backgammon - authoritative backgammon match server
#[derive(Parser, Debug)]
#[command(name = "strictly_backgammon_server")]
#[command(about = "Matchmaking and authoritative backgammon over WebSocket", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the WebSocket match server
    Serve(ConfigArgs),

    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

/// Configuration sources shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Seconds a disconnected player may take to resume
    #[arg(long)]
    pub grace_secs: Option<u64>,

    /// Fixed dice seed for reproducible games
    #[arg(long)]
    pub dice_seed: Option<u64>,
}

impl ConfigArgs {
    /// Resolves defaults, file, environment and flags, in that order.
    #[instrument(skip(self), fields(config = ?self.config))]
    pub fn resolve(&self) -> Result<ServerConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };
        let config = self.apply_flags(base.apply_env()?);
        config.validate()?;
        Ok(config)
    }

    /// Overlays whatever flags were given onto `config`.
    pub fn apply_flags(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(host) = &self.host {
            config = config.with_host(host.clone());
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(secs) = self.grace_secs {
            config = config.with_grace_period_secs(secs);
        }
        if let Some(seed) = self.dice_seed {
            config = config.with_dice_seed(seed);
        }
        config
    }
}
