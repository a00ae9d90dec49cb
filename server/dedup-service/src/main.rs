//! Binary entrypoint for the dedup service.

use std::net::SocketAddr;
use std::sync::Arc;

use dedup_service::{AppState, ServiceConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let config = ServiceConfig::from_env()?;

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  if config.log_json {
    tracing_subscriber::fmt().with_env_filter(filter).json().init();
  } else {
    tracing_subscriber::fmt().with_env_filter(filter).init();
  }

  let state = Arc::new(AppState::from_config(&config)?);
  let app = dedup_service::router(state);

  let addr = SocketAddr::new(config.bind_addr, config.port);
  info!("dedup-service listening on http://{}", addr);

  let listener = tokio::net::TcpListener::bind(addr).await?;
  axum::serve(listener, app).await?;

  Ok(())
}
