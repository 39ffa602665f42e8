// Ai3D HTTP server
// Shared application state, router construction and the serve loop

mod admin;
mod error;
mod handlers;
mod interactions;
mod middleware;
pub mod schemas;

pub use error::ServerError;
pub use handlers::create_router;
pub use middleware::{AdminSession, CurrentUser};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AdminAuth, Authenticator};
use crate::config::Config;
use crate::errors;
use crate::providers::{create_dispatcher, Dispatcher};
use crate::store::SqliteStore;

/// Everything a handler needs, built once at startup
#[derive(Debug)]
pub struct AppState {
    pub store: SqliteStore,
    pub dispatcher: Dispatcher,
    pub auth: Authenticator,
    pub admin: AdminAuth,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: SqliteStore, dispatcher: Dispatcher, auth: Authenticator) -> Self {
        let admin = AdminAuth::new(auth.clone());
        Self {
            store,
            dispatcher,
            auth,
            admin,
        }
    }
}

/// Build the authenticator, generating a throwaway signing key if none is set.
pub fn authenticator_from_config(config: &Config) -> Authenticator {
    let auth = &config.auth;
    let secret = if auth.secret_key.is_empty() {
        tracing::warn!("no secret_key configured; tokens will not survive a restart");
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    } else {
        auth.secret_key.clone()
    };
    Authenticator::new(&secret, auth.access_token_minutes, auth.bcrypt_cost)
}

pub struct Ai3dServer {
    state: SharedState,
    bind_address: String,
}

impl Ai3dServer {
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = SqliteStore::connect(&config.database_url)
            .await
            .with_context(|| errors::database_open_error(&config.database_url))?;
        let dispatcher = create_dispatcher(config).context("Failed to set up providers")?;
        let auth = authenticator_from_config(config);

        Ok(Self {
            state: Arc::new(AppState::new(store, dispatcher, auth)),
            bind_address: config.bind_address.clone(),
        })
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Serve until SIGINT/SIGTERM, then close the database pool.
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.bind_address))?;

        let app = create_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| errors::bind_error(&self.bind_address))?;
        tracing::info!(%addr, "Ai3D server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.state.store.close().await;
        tracing::info!("Ai3D server stopped");
        Ok(())
    }
}

/// Resolves on SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => tracing::warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
