use clap::{Parser, Subcommand};
use std::net::SocketAddr;

use crate::app;
use crate::auth::hash_password;
use crate::config::AppConfig;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "jsp-api")]
#[command(about = "JSP website API - catalog, uploads, contact form and admin auth")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Print a bcrypt hash for seeding a user row by hand")]
    HashPassword {
        #[arg(help = "Password to hash")]
        password: String,
    },
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config.clone()).await,
        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    config.validate()?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::connect(config).await?;
    let database = state.database.clone();
    let app = app::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("JSP API listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(db) = database {
        db.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
