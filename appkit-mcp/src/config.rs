//! Server configuration
//!
//! Command-line flags with environment fallbacks. Logging is configured
//! separately through `RUST_LOG`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::server::ServerTransport;
use crate::showcase::Bundles;

/// Wire protocol the server speaks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Streamable HTTP at `/mcp`, plus `/health`
    #[default]
    Http,
    Websocket,
    /// Single client over stdin/stdout
    Stdio,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "appkit-server")]
#[command(about = "MCP Apps showcase server: todo list, geolocation globe and clock")]
#[command(version)]
pub struct ServerConfig {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Transport to serve
    #[arg(short, long, env = "APPKIT_TRANSPORT", value_enum, default_value_t = TransportKind::Http)]
    pub transport: TransportKind,

    /// Directory of built UI bundles (`<app>/mcp-app.html`); embedded markup is used when unset
    #[arg(long, env = "APPKIT_BUNDLE_DIR")]
    pub bundle_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// `host:port` to bind
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn server_transport(&self) -> ServerTransport {
        match self.transport {
            TransportKind::Http => ServerTransport::Http(self.address()),
            TransportKind::Websocket => ServerTransport::WebSocket(self.address()),
            TransportKind::Stdio => ServerTransport::Stdio,
        }
    }

    pub fn bundles(&self) -> Bundles {
        Bundles::from_dir(self.bundle_dir.clone())
    }
}
