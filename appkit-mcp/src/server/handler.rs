//! MCP server handler implementation
//!
//! Adapts an [`Endpoint`] to rmcp's [`ServerHandler`] and serves it over
//! stdio, Streamable HTTP or WebSocket.

use std::future::Future;
use std::sync::Arc;

use axum::{routing::get, Json};
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, Implementation, ListResourcesResult,
        ListToolsResult, Meta, PaginatedRequestParams, ReadResourceRequestParams,
        ReadResourceResult, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
    },
    ErrorData, RoleServer, ServerHandler, ServiceExt,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::apps::{UiResource, UiResourceRegistry};
use crate::endpoint::{Endpoint, Request, Response};
use crate::envelope::Envelope;
use crate::error::{Error, ErrorKind, Result};
use crate::tools::{ToolDescriptor, ToolRegistry};
use crate::transport::WebSocketTransport;

/// Transport type for serving an MCP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTransport {
    /// Serve over stdio (for Claude Desktop, etc.)
    Stdio,
    /// Serve Streamable HTTP at `/mcp` on the given address
    Http(String),
    /// Serve over WebSocket
    WebSocket(String),
}

/// An MCP server exposing an endpoint's tools and UI resources.
///
/// # Example
/// ```rust,no_run
/// use appkit_mcp::server::{McpServer, ServerTransport};
/// use appkit_mcp::showcase::Showcase;
///
/// # async fn example() -> appkit_mcp::Result<()> {
/// let showcase = Showcase::default();
/// let server = McpServer::builder("appkit-showcase")
///     .register_with(|tools, resources| showcase.register(tools, resources))
///     .build()?;
///
/// server.serve(ServerTransport::Http("127.0.0.1:3001".into())).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct McpServer {
    name: String,
    version: String,
    description: Option<String>,
    title: Option<String>,
    endpoint: Endpoint,
}

impl McpServer {
    /// Create a new server builder
    pub fn builder(name: impl Into<String>) -> McpServerBuilder {
        McpServerBuilder::new(name)
    }

    /// Serve an already built endpoint
    pub fn from_endpoint(name: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: None,
            title: None,
            endpoint,
        }
    }

    /// Get the server name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the server description
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Serve over the given transport
    pub async fn serve(self, transport: ServerTransport) -> Result<()> {
        match transport {
            ServerTransport::Stdio => self.serve_stdio().await,
            ServerTransport::Http(addr) => self.serve_http(&addr).await,
            ServerTransport::WebSocket(addr) => self.serve_websocket(&addr).await,
        }
    }

    /// HTTP routes: MCP at `/mcp`, liveness at `/health`
    pub fn router(&self, ct: CancellationToken) -> axum::Router {
        let server = self.clone();
        let http_service = StreamableHttpService::new(
            move || Ok(server.clone()),
            LocalSessionManager::default().into(),
            StreamableHttpServerConfig {
                cancellation_token: ct,
                stateful_mode: true,
                ..Default::default()
            },
        );

        axum::Router::new()
            .nest_service("/mcp", http_service)
            .route("/health", get(health))
    }

    async fn serve_stdio(self) -> Result<()> {
        tracing::info!(server = %self.name, "serving MCP over stdio");
        let service = ServiceExt::<RoleServer>::serve(self, rmcp::transport::stdio())
            .await
            .map_err(|e| Error::ServerInit(format!("Failed to start stdio server: {}", e)))?;
        service
            .waiting()
            .await
            .map_err(|e| Error::Transport(format!("Stdio server error: {}", e)))?;
        Ok(())
    }

    async fn serve_http(self, addr: &str) -> Result<()> {
        let ct = CancellationToken::new();
        let router = self.router(ct.child_token());

        let tcp_listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Transport(format!("Failed to bind to {}: {}", addr, e)))?;
        tracing::info!(server = %self.name, %addr, "serving MCP over HTTP at /mcp");

        axum::serve(tcp_listener, router)
            .with_graceful_shutdown(async move {
                tokio::signal::ctrl_c().await.ok();
                tracing::info!("shutdown requested");
                ct.cancel();
            })
            .await
            .map_err(|e| Error::Transport(format!("HTTP server error: {}", e)))?;

        Ok(())
    }

    async fn serve_websocket(self, addr: &str) -> Result<()> {
        let tcp_listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Transport(format!("Failed to bind to {}: {}", addr, e)))?;
        tracing::info!(server = %self.name, %addr, "serving MCP over WebSocket");

        loop {
            let (stream, peer) = tcp_listener
                .accept()
                .await
                .map_err(|e| Error::Transport(format!("Accept error: {}", e)))?;

            let server = self.clone();
            tokio::spawn(async move {
                let ws_stream = match tokio_tungstenite::accept_async(stream).await {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::warn!(error = %e, %peer, "WebSocket handshake failed");
                        return;
                    }
                };
                tracing::debug!(%peer, "WebSocket client connected");
                let transport: WebSocketTransport<RoleServer, _, _> = WebSocketTransport::new(ws_stream);
                match ServiceExt::<RoleServer>::serve(server, transport).await {
                    Ok(service) => {
                        let _ = service.waiting().await;
                        tracing::debug!(%peer, "WebSocket client disconnected");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, %peer, "Failed to serve WebSocket client");
                    }
                }
            });
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// rmcp tool listing entry for a descriptor, with `_meta.ui` when bound
fn descriptor_to_tool(descriptor: &ToolDescriptor) -> Tool {
    let mut tool = Tool::new(
        descriptor.name.clone(),
        descriptor.description.clone(),
        Arc::new(descriptor.input_schema.clone()),
    );
    tool.title = descriptor.title.clone();
    tool.output_schema = descriptor.output_schema.clone().map(Arc::new);
    if let Some(ui) = descriptor.ui_meta() {
        match serde_json::to_value(&ui) {
            Ok(value) => {
                let mut meta = serde_json::Map::new();
                meta.insert("ui".to_string(), value);
                tool.meta = Some(Meta(meta));
            }
            Err(e) => tracing::warn!(tool = %descriptor.name, error = %e, "dropping UI binding"),
        }
    }
    tool
}

fn failed_to_error_data(kind: ErrorKind, message: String) -> ErrorData {
    match kind {
        ErrorKind::UnknownResource => ErrorData::resource_not_found(message, None),
        ErrorKind::Validation | ErrorKind::UnknownTool => ErrorData::invalid_params(message, None),
        kind => ErrorData::internal_error(message, Some(json!({ "kind": kind }))),
    }
}

fn envelope_to_result(envelope: Envelope) -> std::result::Result<CallToolResult, ErrorData> {
    CallToolResult::try_from(envelope).map_err(|e| ErrorData::internal_error(e.to_string(), None))
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        let capabilities = if !self.endpoint.resources().is_empty() {
            ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build()
        } else {
            ServerCapabilities::builder().enable_tools().build()
        };

        ServerInfo {
            capabilities,
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
                description: self.description.clone(),
                title: self.title.clone(),
                icons: None,
                website_url: None,
            },
            instructions: self.description.clone(),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = std::result::Result<ListToolsResult, ErrorData>> + Send + '_ {
        async move {
            Ok(ListToolsResult {
                tools: self.endpoint.tools().descriptors().map(descriptor_to_tool).collect(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = std::result::Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let request = Request::CallTool {
                name: request.name.to_string(),
                arguments: request.arguments,
            };
            match self.endpoint.handle(request).await {
                Response::Tool(envelope) => envelope_to_result(envelope),
                Response::Failed { error, message } => Err(failed_to_error_data(error, message)),
                other => Err(ErrorData::internal_error(
                    format!("unexpected response to tools/call: {:?}", other.phase()),
                    None,
                )),
            }
        }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = std::result::Result<ListResourcesResult, ErrorData>> + Send + '_ {
        async move {
            Ok(ListResourcesResult {
                resources: self.endpoint.resources().list_resources(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = std::result::Result<ReadResourceResult, ErrorData>> + Send + '_ {
        async move {
            match self.endpoint.handle(Request::ReadResource { uri: request.uri }).await {
                Response::Resource(resolved) => Ok(resolved.into()),
                Response::Failed { error, message } => Err(failed_to_error_data(error, message)),
                other => Err(ErrorData::internal_error(
                    format!("unexpected response to resources/read: {:?}", other.phase()),
                    None,
                )),
            }
        }
    }
}

/// Builder for constructing an [McpServer]
pub struct McpServerBuilder {
    name: String,
    version: String,
    description: Option<String>,
    title: Option<String>,
    tools: ToolRegistry,
    resources: UiResourceRegistry,
    error: Option<Error>,
}

impl McpServerBuilder {
    /// Create a new builder with the given server name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: None,
            title: None,
            tools: ToolRegistry::new(),
            resources: UiResourceRegistry::new(),
            error: None,
        }
    }

    /// Set the server version (defaults to crate version)
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the server description / instructions
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the server display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Register a typed tool. The first registration error is reported by [`build`](Self::build).
    pub fn with_tool<I, F, Fut>(mut self, descriptor: ToolDescriptor, handler: F) -> Self
    where
        I: DeserializeOwned + schemars::JsonSchema + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Envelope>> + Send + 'static,
    {
        if self.error.is_none() {
            if let Err(e) = self.tools.register(descriptor, handler) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Register a UI resource
    pub fn with_resource(mut self, resource: UiResource) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.resources.register(resource) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Let `f` register into both registries, e.g. a whole tool family
    pub fn register_with<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut ToolRegistry, &mut UiResourceRegistry) -> Result<()>,
    {
        if self.error.is_none() {
            if let Err(e) = f(&mut self.tools, &mut self.resources) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Freeze the registries and build the server
    pub fn build(self) -> Result<McpServer> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok(McpServer {
            name: self.name,
            version: self.version,
            description: self.description,
            title: self.title,
            endpoint: Endpoint::new(self.tools, self.resources),
        })
    }
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("description", &self.description)
            .field("tools", &self.endpoint.tools().len())
            .field("resources", &self.endpoint.resources().len())
            .finish()
    }
}
