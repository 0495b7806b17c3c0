//! Notecast CLI entry point

mod cli;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use clap::Parser;
use notecast::auth::{token_ttl_from_secs, CredentialHasher};
use notecast::server::{NotesServer, NotesServerConfig};
use notecast::storage::{MemoryStore, NoteStore, PostgresConfig, PostgresStore, UserStore};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Resolved lazily so `serve --memory` works without a database
    let get_db_config = || -> Result<PostgresConfig> {
        let config = match &cli.database_url {
            Some(url) => PostgresConfig::from_url(url).context("Invalid DATABASE_URL")?,
            None => PostgresConfig::from_env().context("DATABASE_URL not set")?,
        };
        Ok(match cli.db_tls {
            Some(mode) => config.with_tls(mode),
            None => config,
        })
    };

    match cli.command {
        Commands::Serve {
            bind,
            port,
            secret,
            token_ttl,
            hash_memory_kib,
            hash_iterations,
            bus_buffer,
            memory,
        } => {
            let ip: IpAddr = bind.parse().context("Invalid bind address")?;
            if secret.is_empty() {
                anyhow::bail!("--secret must not be empty");
            }
            let Some(token_ttl) = token_ttl_from_secs(token_ttl) else {
                anyhow::bail!("--token-ttl must be a positive number of seconds within range");
            };

            let config = NotesServerConfig {
                bind_addr: SocketAddr::new(ip, port),
                token_secret: secret.into_bytes(),
                token_ttl,
                hasher: CredentialHasher::new(hash_memory_kib, hash_iterations)
                    .map_err(anyhow::Error::msg)?,
                subscriber_buffer: bus_buffer,
            };

            if memory {
                warn!("Using in-memory storage; all data is lost on exit");
                let store = Arc::new(MemoryStore::new());
                serve(config, store.clone(), store).await
            } else {
                let store = Arc::new(PostgresStore::new(get_db_config()?).await?);
                serve(config, store.clone(), store).await
            }
        }
        Commands::Init => init(get_db_config()?).await,
        Commands::Status => status(get_db_config()?).await,
    }
}

async fn serve(
    config: NotesServerConfig,
    users: Arc<dyn UserStore>,
    notes: Arc<dyn NoteStore>,
) -> Result<()> {
    let server = NotesServer::new(config, users, notes).context("Failed to build server")?;

    info!("Starting Notecast server...");
    server.run().await
}

async fn init(db_config: PostgresConfig) -> Result<()> {
    let _store = PostgresStore::new(db_config).await?;
    println!("Database schema initialized successfully");
    Ok(())
}

async fn status(db_config: PostgresConfig) -> Result<()> {
    let tls = db_config.tls;
    let store = PostgresStore::new(db_config).await?;

    let users = store.count_users().await?;
    let notes = store.count_notes().await?;

    println!("Notecast Status");
    println!("===============");
    println!("Database: Connected (tls: {})", tls);
    println!("Users:    {}", users);
    println!("Notes:    {}", notes);

    Ok(())
}
