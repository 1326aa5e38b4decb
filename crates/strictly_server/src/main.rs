//! Strictly Backgammon - match server binary

use anyhow::Result;
use clap::Parser;
use strictly_server::{router, Cli, Command, ConfigArgs, SessionManager};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => run_server(args).await,
        Command::Config(args) => print_config(args),
    }
}

/// Run the WebSocket match server
#[instrument(skip_all)]
async fn run_server(args: ConfigArgs) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = args.resolve()?;
    info!(
        host = %config.host(),
        port = config.port(),
        grace_secs = config.grace_period_secs(),
        seeded = config.dice_seed().is_some(),
        "Starting backgammon server"
    );

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    let manager = SessionManager::from_config(config);
    let app = router(manager);

    info!(addr = %listener.local_addr()?, "Server ready, accepting connections on /ws");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Print the effective configuration
fn print_config(args: ConfigArgs) -> Result<()> {
    let config = args.resolve()?;
    print!("{}", config.to_toml()?);
    Ok(())
}
