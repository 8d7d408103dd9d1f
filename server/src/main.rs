//! Category Server Entry Point
//!
//! Serves the recommendation API over HTTP by default. The `match`,
//! `register-user` and `show-user` subcommands run one-off operations
//! against the same model and preference store.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use category_server::config::{Cli, Command, ServerConfig};
use category_server::startup::{load_matcher, open_store};
use category_server::{create_api_router, AppState, RecommendationService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local overrides first; dotenv never replaces variables already set
    dotenv::from_filename(".env.local").ok();
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "category_server=info,category_matcher=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ServerConfig::from_options(&cli.options)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Match { text, top_n } => {
            let matcher = load_matcher(&config).await.context("Failed to load matcher")?;
            let top_n = top_n.unwrap_or(config.default_top_n);
            for scored in matcher.recommend_scored(&text, top_n)? {
                println!("{:>8.4}  {}", scored.score, scored.label);
            }
            Ok(())
        }
        Command::RegisterUser { user_id } => {
            let store = open_store(&config)?;
            if store.register_user(&user_id)? {
                println!("Registered {}", user_id);
            } else {
                println!("{} already registered", user_id);
            }
            Ok(())
        }
        Command::ShowUser { user_id } => {
            let store = open_store(&config)?;
            match store.get(&user_id)? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => anyhow::bail!("No preference record for {}", user_id),
            }
            Ok(())
        }
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting category server");

    // Model failures abort startup
    let matcher = load_matcher(&config)
        .await
        .context("Failed to load embedding model")?;
    let store = open_store(&config).context("Failed to open preference store")?;

    let service = RecommendationService::new(matcher, store, config.default_top_n)
        .with_request_timeout(config.request_timeout);
    let state = AppState {
        service: std::sync::Arc::new(service),
    };
    let app = create_api_router(state, config.cors_origins.clone());

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!("Listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
