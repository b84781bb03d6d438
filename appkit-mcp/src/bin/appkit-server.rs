//! Showcase MCP Apps server.
//!
//! Serves the todo, globe and clock tool families with their UI bundles.
//! Logs go to stderr so stdout stays free for the stdio transport.

use anyhow::Context;
use appkit_mcp::config::ServerConfig;
use appkit_mcp::server::McpServer;
use appkit_mcp::showcase::{Showcase, SERVER_NAME};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::parse();
    tracing::info!(
        transport = ?config.transport,
        bundle_dir = ?config.bundle_dir,
        "starting {}",
        SERVER_NAME
    );

    let showcase = Showcase::new(config.bundles());
    let server = McpServer::builder(SERVER_NAME)
        .with_title("MCP Apps Showcase")
        .with_description("Todo list, geolocation globe and clock, each with an interactive UI")
        .register_with(|tools, resources| showcase.register(tools, resources))
        .build()
        .context("failed to build showcase server")?;

    server
        .serve(config.server_transport())
        .await
        .context("server stopped with an error")?;

    tracing::info!("server stopped");
    Ok(())
}
