//! Server assembly: shared state, routes, and the listen loop

use crate::auth::{CredentialHasher, CredentialStore, SessionIssuer, DEFAULT_TOKEN_TTL};
use crate::bus::{NotificationBus, DEFAULT_SUBSCRIBER_BUFFER};
use crate::error::Result;
use crate::notes::NoteService;
use crate::server::{api, websocket};
use crate::storage::{NoteStore, UserStore};

use axum::routing::{get, post, put};
use axum::Router;
use chrono::Duration;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub sessions: SessionIssuer,
    pub notes: NoteService,
    pub bus: NotificationBus,
}

/// Notecast server configuration
pub struct NotesServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,
    /// Secret for signing session tokens
    pub token_secret: Vec<u8>,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
    /// Password hashing cost
    pub hasher: CredentialHasher,
    /// Queue length per real-time subscriber
    pub subscriber_buffer: usize,
}

impl NotesServerConfig {
    pub fn new(bind_addr: SocketAddr, token_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            bind_addr,
            token_secret: token_secret.into(),
            token_ttl: DEFAULT_TOKEN_TTL,
            hasher: CredentialHasher::default(),
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

/// The notes HTTP + WebSocket server
pub struct NotesServer {
    bind_addr: SocketAddr,
    state: AppState,
}

impl NotesServer {
    pub fn new(
        config: NotesServerConfig,
        users: Arc<dyn UserStore>,
        notes: Arc<dyn NoteStore>,
    ) -> Result<Self> {
        let bus = NotificationBus::new(config.subscriber_buffer);
        let credentials = CredentialStore::new(users, config.hasher)?;
        let sessions = SessionIssuer::new(credentials.clone(), config.token_secret, config.token_ttl);

        let state = AppState {
            credentials,
            sessions,
            notes: NoteService::new(notes, bus.clone()),
            bus,
        };

        Ok(Self {
            bind_addr: config.bind_addr,
            state,
        })
    }

    /// Get the notification bus (for subscribing from outside)
    pub fn bus(&self) -> NotificationBus {
        self.state.bus.clone()
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Serve until Ctrl-C or SIGTERM
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        info!(addr = %listener.local_addr()?, "Notecast server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Notecast server stopped");
        Ok(())
    }
}

/// Build the HTTP router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(api::register))
        .route("/login", post(api::login))
        .route("/notes", get(api::list_notes).post(api::create_note))
        .route("/notes/{id}", put(api::update_note).delete(api::delete_note))
        .route("/ws", get(websocket::ws_handler))
        .route("/health", get(api::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
