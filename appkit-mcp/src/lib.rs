//! # appkit-mcp
//!
//! Tool-backed MCP Apps.
//!
//! This crate provides:
//! - **Tools**: a typed, schema-validated tool registry
//! - **Apps**: `ui://` resources (SEP-1865) and the host bridge payloads
//! - **Endpoint**: transport-agnostic dispatch of tool calls and resource reads
//! - **Server**: the endpoint as an MCP server over stdio, HTTP or WebSocket
//! - **Runtime**: a client-side app runtime that reconciles its view against
//!   tool results and locks controls while their calls are in flight
//! - **Showcase**: the todo, globe and clock tool families
//!
//! ## Quick Start - Runtime
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use appkit_mcp::runtime::{AppRuntime, LocalHost};
//! use appkit_mcp::showcase::{todo::{TodoAction, TodoApp}, Showcase};
//!
//! # async fn example() -> appkit_mcp::Result<()> {
//! let endpoint = Showcase::default().endpoint()?;
//! let first = endpoint.call_tool("show-todos", None).await;
//!
//! let runtime = AppRuntime::new(TodoApp::new(), Arc::new(LocalHost::new(endpoint)));
//! let handle = runtime.handle();
//! let mut view = runtime.subscribe();
//! tokio::spawn(runtime.run());
//!
//! handle.deliver(first)?;
//! handle.act(TodoAction::Add("Buy milk".into()))?;
//! view.changed().await.ok();
//! # Ok(())
//! # }
//! ```

pub mod apps;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod runtime;
pub mod showcase;
pub mod store;
pub mod tools;
pub mod transport;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "server")]
pub mod config;

#[cfg(feature = "server")]
pub mod server;

pub use endpoint::{Endpoint, Request, Response};
pub use envelope::{ContentBlock, Envelope};
pub use error::{Error, ErrorKind, Result};
pub use tools::{ToolDescriptor, ToolRegistry};
pub use transport::WebSocketTransport;

// Re-export commonly used rmcp types
pub use rmcp::model::{CallToolResult, Tool as McpTool};
pub use rmcp::ErrorData;
