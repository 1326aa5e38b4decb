//! Strictly Backgammon server - matchmaking and live matches
//!
//! Pairs players from a FIFO queue, runs each match on the authoritative
//! engine in `strictly_backgammon`, and speaks a small JSON protocol over
//! WebSocket.
//!
//! # Architecture
//!
//! - **Protocol**: tagged inbound intents and outbound messages
//! - **Adapter**: wire coordinates, snapshots and reject codes
//! - **Session**: queue, per-match locking, broadcast, disconnect grace
//! - **Transport**: axum router with `/ws` and `/healthz`
//! - **Config**: TOML file, environment and flags
//!
//! # Example
//!
//! ```no_run
//! use strictly_server::{router, ServerConfig, SessionManager};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::default().with_port(4000);
//! let manager = SessionManager::from_config(config);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:4000").await?;
//! axum::serve(listener, router(manager)).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod cli;
mod config;
mod error;
mod session;
mod transport;

pub mod adapter;
pub mod protocol;

// Crate-level exports - Configuration and CLI
pub use cli::{Cli, Command, ConfigArgs};
pub use config::{ConfigError, ServerConfig, ENV_PREFIX};

// Crate-level exports - Errors
pub use error::SessionError;

// Crate-level exports - Sessions
pub use session::{Connection, Outbox, SessionManager};

// Crate-level exports - Transport
pub use transport::{handle_text, router};

// Crate-level exports - Wire types
pub use protocol::{
    ClientMessage, ColorPair, MatchId, ParticipantId, RejectCode, ResumeToken, ServerMessage,
    Snapshot,
};
