//! MCP client connection management

use async_trait::async_trait;
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientInfo, ExtensionCapabilities, Implementation,
        ListResourcesResult, ListToolsResult, ReadResourceRequestParams, ReadResourceResult,
        ServerInfo,
    },
    service::{RunningService, ServiceError},
    transport::{ConfigureCommandExt, StreamableHttpClientTransport, TokioChildProcess},
    ClientHandler, RoleClient, ServiceExt,
};
use serde_json::Value;
use tokio::process::Command;

use crate::apps::{EXTENSION_ID, MCP_APP_MIME_TYPE};
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::runtime::Host;

/// Client handler that advertises the `io.modelcontextprotocol/ui`
/// extension during initialize, so servers expose their UI bindings.
struct AppkitClientHandler;

impl ClientHandler for AppkitClientHandler {
    fn get_info(&self) -> ClientInfo {
        let mut ext = ExtensionCapabilities::new();
        let mut ui = serde_json::Map::new();
        ui.insert("mimeTypes".to_string(), serde_json::json!([MCP_APP_MIME_TYPE]));
        ext.insert(EXTENSION_ID.to_string(), ui);

        ClientInfo {
            protocol_version: Default::default(),
            capabilities: rmcp::model::ClientCapabilities::builder()
                .enable_extensions_with(ext)
                .build(),
            client_info: Implementation {
                name: "appkit-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Transport type for MCP connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Streamable HTTP transport
    Http(String),
    /// WebSocket transport
    WebSocket(String),
    /// Stdio transport (spawns child process)
    Stdio { command: String, args: Vec<String> },
}

impl Transport {
    /// Stdio transport from a whitespace-separated command line
    pub fn stdio(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace();
        let command = parts
            .next()
            .ok_or_else(|| Error::Transport("Empty command".to_string()))?;
        Ok(Transport::Stdio {
            command: command.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }
}

fn service_error(context: String, e: ServiceError) -> Error {
    match e {
        ServiceError::McpError(data) => Error::Mcp(data),
        other => Error::Protocol(format!("{}: {}", context, other)),
    }
}

/// An active MCP client connection
pub struct McpClient {
    service: RunningService<RoleClient, AppkitClientHandler>,
    transport: Transport,
}

impl McpClient {
    /// Connect over the given transport
    pub async fn connect(transport: Transport) -> Result<Self> {
        match transport {
            Transport::Http(url) => Self::http(url).await,
            Transport::WebSocket(url) => Self::websocket(url).await,
            Transport::Stdio { command, args } => Self::stdio_with_args(&command, &args).await,
        }
    }

    /// Connect to an MCP server via Streamable HTTP
    ///
    /// # Example
    /// ```rust,no_run
    /// use appkit_mcp::client::McpClient;
    ///
    /// # async fn example() -> appkit_mcp::Result<()> {
    /// let client = McpClient::http("http://localhost:3001/mcp").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn http(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let transport = StreamableHttpClientTransport::from_uri(url.clone());
        let service = AppkitClientHandler.serve(transport).await.map_err(|e| {
            Error::Transport(format!("Failed to connect to HTTP MCP server at {}: {}", url, e))
        })?;
        tracing::debug!(%url, "connected over HTTP");
        Ok(Self {
            service,
            transport: Transport::Http(url),
        })
    }

    /// Connect to an MCP server via WebSocket
    pub async fn websocket(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let transport = crate::transport::websocket::connect(&url).await?;
        let service = AppkitClientHandler.serve(transport).await.map_err(|e| {
            Error::Transport(format!("Failed to connect to WebSocket MCP server at {}: {}", url, e))
        })?;
        tracing::debug!(%url, "connected over WebSocket");
        Ok(Self {
            service,
            transport: Transport::WebSocket(url),
        })
    }

    /// Spawn `command_line` and speak MCP over its stdio
    ///
    /// # Example
    /// ```rust,no_run
    /// use appkit_mcp::client::McpClient;
    ///
    /// # async fn example() -> appkit_mcp::Result<()> {
    /// let client = McpClient::stdio("appkit-server --transport stdio").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn stdio(command_line: &str) -> Result<Self> {
        Self::connect(Transport::stdio(command_line)?).await
    }

    /// Connect to an MCP server via stdio with explicit command and args
    pub async fn stdio_with_args(command: &str, args: &[String]) -> Result<Self> {
        let transport = TokioChildProcess::new(Command::new(command).configure(|cmd| {
            cmd.args(args);
        }))
        .map_err(|e| Error::Transport(format!("Failed to spawn process '{}': {}", command, e)))?;

        let service = AppkitClientHandler.serve(transport).await.map_err(|e| {
            Error::Transport(format!("Failed to connect to stdio MCP server '{}': {}", command, e))
        })?;

        Ok(Self {
            service,
            transport: Transport::Stdio {
                command: command.to_string(),
                args: args.to_vec(),
            },
        })
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Information the server reported during initialize
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.service.peer_info()
    }

    /// List all available tools from the MCP server
    pub async fn list_tools(&self) -> Result<ListToolsResult> {
        self.service
            .list_tools(Default::default())
            .await
            .map_err(|e| service_error("Failed to list tools".to_string(), e))
    }

    /// Call a tool on the MCP server
    ///
    /// # Example
    /// ```rust,no_run
    /// use appkit_mcp::client::McpClient;
    /// use serde_json::json;
    ///
    /// # async fn example() -> appkit_mcp::Result<()> {
    /// let client = McpClient::http("http://localhost:3001/mcp").await?;
    /// let result = client.call_tool("add-todo", json!({"text": "Buy milk"})).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call_tool(&self, name: impl Into<String>, arguments: Value) -> Result<CallToolResult> {
        let name = name.into();
        let arguments = arguments.as_object().cloned();

        self.service
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.clone().into(),
                arguments,
                task: None,
            })
            .await
            .map_err(|e| service_error(format!("Failed to call tool '{}'", name), e))
    }

    /// List all available resources from the MCP server
    pub async fn list_resources(&self) -> Result<ListResourcesResult> {
        self.service
            .list_resources(Default::default())
            .await
            .map_err(|e| service_error("Failed to list resources".to_string(), e))
    }

    /// Read a resource by URI from the MCP server
    pub async fn read_resource(&self, uri: impl Into<String>) -> Result<ReadResourceResult> {
        let uri = uri.into();
        self.service
            .read_resource(ReadResourceRequestParams {
                meta: None,
                uri: uri.clone(),
            })
            .await
            .map_err(|e| service_error(format!("Failed to read resource '{}'", uri), e))
    }

    /// Gracefully close the connection
    pub async fn close(self) -> Result<()> {
        self.service
            .cancel()
            .await
            .map_err(|e| Error::Transport(format!("Failed to close connection: {}", e)))?;
        Ok(())
    }
}

/// A connected client can host an app runtime: its tool calls go to the
/// server over MCP.
#[async_trait]
impl Host for McpClient {
    async fn call_server_tool(&self, name: &str, arguments: Value) -> Result<Envelope> {
        let result = self.call_tool(name, arguments).await?;
        Ok(Envelope::from(&result))
    }
}
