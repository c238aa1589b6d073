//! GoalForge gateway binary

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use goalforge_gateway::{config::Args, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("goalforge={},info", log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  GoalForge - habit staking gateway");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("App URL: {}", args.app_url);
    info!("GitHub API: {}", args.github_api_url);
    info!(
        "Google Fit OAuth: {}",
        if args.fitness_oauth_configured() { "configured" } else { "not configured" }
    );
    info!(
        "LLM judge: {} ({})",
        if args.openrouter_api_key.is_some() { "configured" } else { "not configured" },
        args.llm_model
    );
    info!("Treasury: {} / escrow: {}", args.treasury_account, args.escrow_account);
    info!("======================================");

    let state = Arc::new(server::AppState::new(args));

    if let Err(e) = server::run(state).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
