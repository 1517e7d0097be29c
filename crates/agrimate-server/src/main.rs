#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod api;
mod config;

use agrimate_core::{GatewayCore, OllamaClient, WeatherClient};
use config::ServerConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,agrimate_server=debug,agrimate_core=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting Agrimate gateway");

    let config = ServerConfig::load()?;

    let generator = OllamaClient::new()?
        .with_base_url(&config.ollama_url)
        .with_model(&config.model);
    let weather = match config.weather_timeout {
        Some(timeout) => WeatherClient::with_timeout(&config.weather_api_key, timeout)?,
        None => WeatherClient::new(&config.weather_api_key)?,
    }
    .with_base_url(&config.weather_url);

    tracing::info!(
        ollama_url = %config.ollama_url,
        model = %config.model,
        "Generation service configured"
    );

    let core = Arc::new(GatewayCore::new(Arc::new(generator), weather));
    let app = api::build_router(core);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|err| anyhow::anyhow!("Failed to bind to {}: {}", address, err))?;

    tracing::info!("Agrimate running on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}
