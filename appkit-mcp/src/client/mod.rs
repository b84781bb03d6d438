//! MCP client
//!
//! Connects to MCP servers over HTTP, WebSocket or stdio. An [`McpClient`]
//! also serves as the [`Host`](crate::runtime::Host) of an app runtime.

mod connection;

pub use connection::{McpClient, Transport};
