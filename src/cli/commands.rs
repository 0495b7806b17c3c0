//! CLI command definitions

use clap::{Parser, Subcommand};
use notecast::auth::CredentialHasher;
use notecast::bus::DEFAULT_SUBSCRIBER_BUFFER;
use notecast::storage::DbTlsMode;

#[derive(Parser)]
#[command(name = "notecast")]
#[command(about = "Multi-user notes service with real-time updates", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database URL
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// TLS for database connections: disable, require (unverified) or verify
    #[arg(long, env = "DATABASE_TLS", global = true)]
    pub db_tls: Option<DbTlsMode>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the notes server
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "0.0.0.0", env = "NOTECAST_BIND")]
        bind: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = 3000, env = "PORT")]
        port: u16,

        /// Token signing secret
        #[arg(long, env = "NOTECAST_SECRET")]
        secret: String,

        /// Session token lifetime in seconds
        #[arg(long, default_value_t = 3600, env = "NOTECAST_TOKEN_TTL")]
        token_ttl: i64,

        /// Argon2 memory cost in KiB
        #[arg(long, default_value_t = CredentialHasher::DEFAULT_MEMORY_KIB, env = "NOTECAST_HASH_MEMORY_KIB")]
        hash_memory_kib: u32,

        /// Argon2 iteration count
        #[arg(long, default_value_t = CredentialHasher::DEFAULT_ITERATIONS, env = "NOTECAST_HASH_ITERATIONS")]
        hash_iterations: u32,

        /// Queue length per real-time subscriber
        #[arg(long, default_value_t = DEFAULT_SUBSCRIBER_BUFFER, env = "NOTECAST_BUS_BUFFER")]
        bus_buffer: usize,

        /// Keep everything in memory instead of Postgres (data is lost on exit)
        #[arg(long)]
        memory: bool,
    },

    /// Initialize the database schema
    Init,

    /// Show database connectivity and record counts
    Status,
}
