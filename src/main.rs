// Ai3D - interaction and message backend
// Main entry point

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::prelude::*;

use ai3d::cli::{create_superuser, TerminalPrompt};
use ai3d::config::{load_config, Config};
use ai3d::errors;
use ai3d::server::{authenticator_from_config, Ai3dServer};
use ai3d::store::SqliteStore;

#[derive(Parser, Debug)]
#[command(name = "ai3d")]
#[command(about = "Interaction and message backend for chat-completion providers", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Bind address (overrides config and AI3D_BIND)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Create an admin account interactively
    CreateSuperuser,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config()?;

    init_tracing(&config);

    match args.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            run_server(config).await
        }
        Command::CreateSuperuser => run_create_superuser(config).await,
    }
}

/// Initialize tracing: `RUST_LOG` wins, then the configured level, then `info`.
fn init_tracing(config: &Config) {
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match config.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: invalid log_level '{}' ({}); falling back to 'info'",
                    config.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }

    // Bridge log crate -> tracing (for dependencies using log crate)
    tracing_log::LogTracer::init().ok();
}

async fn run_server(config: Config) -> Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ai3d starting");
    let server = Ai3dServer::from_config(&config).await?;
    server.serve().await
}

async fn run_create_superuser(config: Config) -> Result<()> {
    let store = SqliteStore::connect(&config.database_url)
        .await
        .with_context(|| errors::database_open_error(&config.database_url))?;
    let auth = authenticator_from_config(&config);

    let outcome = create_superuser(&store, &auth, &mut TerminalPrompt).await;
    store.close().await;
    outcome.map(|_| ())
}
