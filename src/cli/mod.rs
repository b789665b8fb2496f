use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use crate::app::app;
use crate::config::{AppConfig, StorageBackend};
use crate::database::{open_store, DatabaseManager};
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "contact-api")]
#[command(about = "Multi-user contact book REST API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Bind address, overrides HOST")]
        host: Option<String>,
        #[arg(long, help = "Bind port, overrides PORT")]
        port: Option<u16>,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = crate::config::config().clone();

    match cli.command.unwrap_or(Commands::Serve { host: None, port: None }) {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Commands::Migrate => migrate(config).await,
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    config.check().map_err(anyhow::Error::msg)?;
    info!(
        "Starting contact API in {:?} mode with {:?} storage",
        config.environment, config.database.backend
    );

    let store = open_store(&config).await.context("failed to open storage")?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Contact API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app(AppState::new(store, config)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    if config.database.backend != StorageBackend::Postgres {
        bail!("migrate requires the postgres storage backend (set DATABASE_URL)");
    }
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    DatabaseManager::migrate(&pool).await.context("failed to apply migrations")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["contact-api"]);
        assert!(cli.command.is_none());

        let cli = Cli::parse_from(["contact-api", "serve", "--port", "4000"]);
        assert!(matches!(cli.command, Some(Commands::Serve { port: Some(4000), .. })));

        let cli = Cli::parse_from(["contact-api", "migrate"]);
        assert!(matches!(cli.command, Some(Commands::Migrate)));
    }
}
