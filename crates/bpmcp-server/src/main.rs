//! Binary entrypoint for the blueprint action server.
//!
//! Configuration comes from environment variables, see [`bpmcp_server::config`].

use std::sync::Arc;

use bpmcp_backend::{GraphBackend, MemoryBackend};
use bpmcp_server::config::Config;
use bpmcp_server::error::ServerError;
use bpmcp_server::owner::OwnerContext;
use bpmcp_server::server::McpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let backend: Arc<dyn GraphBackend> = match &config.db_path {
        Some(path) => {
            tracing::info!("persisting saved assets to {}", path);
            Arc::new(MemoryBackend::open(path)?)
        }
        None => Arc::new(MemoryBackend::in_memory()?),
    };

    let owner = OwnerContext::spawn().map_err(ServerError::OwnerStart)?;
    let server = McpServer::new(backend, owner.handle(), config.allow_writes);
    server.start(config.port).await?;
    if !config.allow_writes {
        tracing::info!("write actions are disabled; set BPMCP_ALLOW_WRITES=1 to enable");
    }

    tokio::signal::ctrl_c().await?;
    server.stop().await;
    tokio::task::spawn_blocking(move || owner.shutdown()).await?;
    Ok(())
}
