//! MCP Server
//!
//! Exposes an [`Endpoint`](crate::endpoint::Endpoint) to MCP hosts such as
//! Claude Desktop, including the `_meta.ui` bindings hosts need to render
//! MCP Apps.

mod handler;

pub use handler::{McpServer, McpServerBuilder, ServerTransport};
