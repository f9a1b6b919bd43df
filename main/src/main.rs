use std::sync::Arc;

use agent::{ChatBackend, CoachAgent, ToolRegistry};
use api_router::{api_routes, api_state::ApiState};
use axum::Router;
use common::{storage::store::StorageManager, utils::config::get_config};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    // Assemble the process-wide agent
    let registry = ToolRegistry::from_config(&config, &openai_client);
    info!(tools = registry.len(), "Agent tool registry assembled");
    let coach = Arc::new(CoachAgent::new(
        ChatBackend::new_openai(openai_client, config.chat_model.clone()),
        registry,
    ));

    // Create global storage manager
    let storage = StorageManager::new(&config).await?;

    let api_state = ApiState::new(&config, storage, coach).await?;
    let app = build_router(api_state);

    let serve_address = format!("0.0.0.0:{}", config.http_port);
    info!("Starting server listening on {serve_address}");
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The browser client runs on another origin, so the whole API surface is
/// served behind a permissive CORS layer.
fn build_router(api_state: ApiState) -> Router {
    Router::new()
        .nest("/api", api_routes(&api_state))
        .layer(CorsLayer::permissive())
        .with_state(api_state)
}
