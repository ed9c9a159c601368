//! foodgram - recipe publishing service
//!
//! `foodgram serve` (the default) runs the HTTP API; the other subcommands
//! are operator tools working on the same database.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use foodgram_api::{admin, build_router, AppState};
use foodgram_common::config::{ConfigOverrides, ServiceConfig, TomlConfig};
use foodgram_common::db::{init_database, NewUser};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for foodgram
#[derive(Parser, Debug)]
#[command(name = "foodgram")]
#[command(about = "Recipe publishing service")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "FOODGRAM_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the database
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// Database file (overrides <root folder>/foodgram.db)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Load reference ingredients and tags from JSON files
    LoadData {
        /// `[{"name", "measurement_unit"}]`
        #[arg(long)]
        ingredients: Option<PathBuf>,

        /// `[{"name", "color", "slug"}]`
        #[arg(long)]
        tags: Option<PathBuf>,
    },

    /// Create a user and print their API key
    CreateUser {
        username: String,
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },

    /// Delete a user with their recipes, tokens and subscriptions
    DeleteUser { username: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    });

    let (host, port) = match &command {
        Command::Serve { host, port } => (host.clone(), *port),
        _ => (None, None),
    };
    let overrides = ConfigOverrides {
        root_folder: args.root_folder,
        database_path: args.database,
        host,
        port,
    };

    let config_source = TomlConfig::locate(args.config.as_deref());
    let toml_config = match &config_source {
        Some(path) => TomlConfig::load(path).context("Failed to load configuration")?,
        None => TomlConfig::default(),
    };
    let config = ServiceConfig::resolve(&overrides, &toml_config)
        .context("Invalid configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting foodgram v{}", env!("CARGO_PKG_VERSION"));
    match &config_source {
        Some(path) => info!("Configuration file: {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }
    info!("Root folder: {}", config.root_folder.display());
    info!("Database path: {}", config.database_path.display());

    config.ensure_root_folder()?;
    let pool = init_database(&config.database_path)
        .await
        .context("Failed to open database")?;

    match command {
        Command::Serve { .. } => serve(pool, &config).await,
        Command::LoadData { ingredients, tags } => {
            if ingredients.is_none() && tags.is_none() {
                bail!("Nothing to load: pass --ingredients and/or --tags");
            }
            if let Some(path) = ingredients {
                let summary = admin::load_ingredients(&pool, &path).await?;
                println!(
                    "Ingredients: {} created, {} already present",
                    summary.created, summary.existing
                );
            }
            if let Some(path) = tags {
                let summary = admin::load_tags(&pool, &path).await?;
                println!(
                    "Tags: {} created, {} already present",
                    summary.created, summary.existing
                );
            }
            Ok(())
        }
        Command::CreateUser {
            username,
            email,
            first_name,
            last_name,
        } => {
            let created = admin::create_user(
                &pool,
                &NewUser {
                    username,
                    email,
                    first_name,
                    last_name,
                },
            )
            .await?;
            println!("Created user {} (id {})", created.user.username, created.user.id);
            println!("API token: {}", created.token);
            Ok(())
        }
        Command::DeleteUser { username } => {
            if !admin::delete_user(&pool, &username).await? {
                bail!("No user named '{}'", username);
            }
            println!("Deleted user {}", username);
            Ok(())
        }
    }
}

async fn serve(pool: sqlx::SqlitePool, config: &ServiceConfig) -> Result<()> {
    let app = build_router(AppState::new(pool));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("foodgram listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
