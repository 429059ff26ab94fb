//! HTTP Server for the campaign dashboard
//! Simple HTTP server using tokio and basic HTTP handling

use campaign_dashboard::cache::DatasetCache;
use campaign_dashboard::config::DashboardConfig;
use campaign_dashboard::http::handle_request;
use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const READ_BUFFER_SIZE: usize = 8192;

/// Configuration and dataset cache shared by every connection
struct AppState {
    config: DashboardConfig,
    cache: DatasetCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DashboardConfig::from_env().context("Invalid dashboard configuration")?;
    let state = Arc::new(AppState {
        cache: DatasetCache::new(config.data_path.clone()),
        config,
    });

    info!("Starting campaign dashboard on http://{}", state.config.bind_addr);

    // A bad report is logged, not fatal: /api/reload picks up a fixed file
    match state.cache.get() {
        Ok(dataset) => info!(
            "Campaign report ready: {} rows from {}",
            dataset.height(),
            state.cache.path().display()
        ),
        Err(e) => warn!("Campaign report not loaded yet: {}", e),
    }

    let listener = TcpListener::bind(state.config.bind_addr.as_str()).await?;
    info!("Server listening on {}", state.config.bind_addr);

    loop {
        let (stream, addr) = listener.accept().await?;
        info!("New connection from: {}", addr);
        tokio::spawn(handle_connection(stream, Arc::clone(&state)));
    }
}

async fn handle_connection(mut stream: TcpStream, state: Arc<AppState>) {
    let mut buffer = vec![0; READ_BUFFER_SIZE];

    match stream.read(&mut buffer).await {
        Ok(0) => {}
        Ok(size) => {
            let request = String::from_utf8_lossy(&buffer[..size]).into_owned();
            // The pipeline is synchronous; keep it off the async workers
            let response = tokio::task::spawn_blocking(move || {
                handle_request(&request, &state.cache, &state.config)
            })
            .await;

            match response {
                Ok(response) => {
                    if let Err(e) = stream.write_all(response.as_bytes()).await {
                        error!("Failed to write response: {}", e);
                    }
                }
                Err(e) => error!("Request handler panicked: {}", e),
            }
        }
        Err(e) => {
            error!("Failed to read from stream: {}", e);
        }
    }
}
