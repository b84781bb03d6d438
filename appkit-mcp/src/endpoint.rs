//! Protocol endpoint
//!
//! Transport-agnostic request dispatch. Each request moves through
//! `Received -> Dispatched -> Completed | Failed`; nothing is kept once the
//! response is produced. Tool errors come back as error envelopes, resource
//! errors as [`Response::Failed`], so no error crosses the transport
//! boundary unhandled.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::Instrument;

use crate::apps::{ResolvedResource, UiResourceRegistry};
use crate::envelope::Envelope;
use crate::error::{Error, ErrorKind, Result};
use crate::tools::{ToolDescriptor, ToolRegistry};

/// An inbound request, classified by its declared kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Request {
    CallTool {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Map<String, Value>>,
    },
    ReadResource {
        uri: String,
    },
    ListTools,
    ListResources,
}

impl Request {
    pub fn call_tool(name: impl Into<String>, arguments: Value) -> Self {
        Request::CallTool {
            name: name.into(),
            arguments: arguments.as_object().cloned(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Request::CallTool { .. } => "callTool",
            Request::ReadResource { .. } => "readResource",
            Request::ListTools => "listTools",
            Request::ListResources => "listResources",
        }
    }
}

/// Lifecycle of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Received,
    Dispatched,
    Completed,
    Failed,
}

/// Listing entry for a registered resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub uri: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub mime_type: String,
}

/// Outcome of a request
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Response {
    Tool(Envelope),
    Resource(ResolvedResource),
    Tools { tools: Vec<ToolDescriptor> },
    Resources { resources: Vec<ResourceSummary> },
    Failed { error: ErrorKind, message: String },
}

impl Response {
    fn failed(err: &Error) -> Self {
        Response::Failed {
            error: err.kind(),
            message: err.to_string(),
        }
    }

    /// Terminal phase this response represents
    pub fn phase(&self) -> Phase {
        match self {
            Response::Failed { .. } => Phase::Failed,
            Response::Tool(envelope) if envelope.is_error => Phase::Failed,
            _ => Phase::Completed,
        }
    }
}

/// Dispatcher over a frozen tool registry and resource registry
#[derive(Debug, Clone)]
pub struct Endpoint {
    tools: Arc<ToolRegistry>,
    resources: Arc<UiResourceRegistry>,
}

impl Endpoint {
    /// Freeze the registries behind the endpoint
    pub fn new(tools: ToolRegistry, resources: UiResourceRegistry) -> Self {
        Self {
            tools: Arc::new(tools),
            resources: Arc::new(resources),
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn resources(&self) -> &UiResourceRegistry {
        &self.resources
    }

    /// Handle one request to completion
    pub async fn handle(&self, request: Request) -> Response {
        let span = tracing::info_span!("request", kind = request.kind());
        async move {
            tracing::debug!(phase = ?Phase::Received, "request received");
            let response = self.dispatch(request).await;
            match &response {
                Response::Failed { error, message } => {
                    tracing::warn!(phase = ?Phase::Failed, error = ?error, reason = %message, "request failed")
                }
                Response::Tool(envelope) if envelope.is_error => tracing::warn!(
                    phase = ?Phase::Failed,
                    reason = envelope.first_text().unwrap_or_default(),
                    "tool invocation failed"
                ),
                _ => tracing::debug!(phase = ?Phase::Completed, "request completed"),
            }
            response
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, request: Request) -> Response {
        match request {
            Request::CallTool { name, arguments } => {
                tracing::debug!(phase = ?Phase::Dispatched, tool = %name, "dispatching to tool registry");
                Response::Tool(self.call_tool(&name, arguments).await)
            }
            Request::ReadResource { uri } => {
                tracing::debug!(phase = ?Phase::Dispatched, %uri, "dispatching to resource registry");
                match self.read_resource(&uri) {
                    Ok(resolved) => Response::Resource(resolved),
                    Err(e) => Response::failed(&e),
                }
            }
            Request::ListTools => Response::Tools {
                tools: self.tools.descriptors().cloned().collect(),
            },
            Request::ListResources => Response::Resources {
                resources: self
                    .resources
                    .iter()
                    .map(|r| ResourceSummary {
                        uri: r.uri.to_string(),
                        name: r.name.clone(),
                        description: r.description.clone(),
                        mime_type: r.mime_type.clone(),
                    })
                    .collect(),
            },
        }
    }

    /// Invoke a tool, folding any error into an error envelope
    pub async fn call_tool(&self, name: &str, arguments: Option<Map<String, Value>>) -> Envelope {
        match self.tools.invoke(name, arguments).await {
            Ok(envelope) => envelope,
            Err(e) => Envelope::from_error(&e),
        }
    }

    /// Resolve a resource body
    pub fn read_resource(&self, uri: &str) -> Result<ResolvedResource> {
        self.resources.resolve(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::{ui_uri, UiResource};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, schemars::JsonSchema)]
    struct Shout {
        #[schemars(length(min = 1))]
        text: String,
    }

    fn endpoint() -> Endpoint {
        let mut tools = ToolRegistry::new();
        tools
            .register(ToolDescriptor::new("shout", "Upper-case text"), |s: Shout| async move {
                Ok(Envelope::text(s.text.to_uppercase()))
            })
            .unwrap();
        let mut resources = UiResourceRegistry::new();
        resources
            .register(UiResource::new(ui_uri("srv", "ui").unwrap(), "ui", "<html/>"))
            .unwrap();
        Endpoint::new(tools, resources)
    }

    #[tokio::test]
    async fn test_call_tool_completed() {
        let response = endpoint()
            .handle(Request::call_tool("shout", json!({"text": "hi"})))
            .await;
        assert_eq!(response.phase(), Phase::Completed);
        match response {
            Response::Tool(envelope) => assert_eq!(envelope.first_text(), Some("HI")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validation_failure_becomes_error_envelope() {
        let response = endpoint()
            .handle(Request::call_tool("shout", json!({"text": ""})))
            .await;
        assert_eq!(response.phase(), Phase::Failed);
        match response {
            Response::Tool(envelope) => {
                assert!(envelope.is_error);
                assert!(envelope.first_text().unwrap().starts_with("Validation error at '/text'"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_envelope() {
        let response = endpoint().handle(Request::call_tool("whisper", json!({}))).await;
        match response {
            Response::Tool(envelope) => {
                assert!(envelope.is_error);
                assert_eq!(envelope.first_text(), Some("Unknown tool: whisper"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_resource() {
        let response = endpoint()
            .handle(Request::ReadResource {
                uri: "ui://srv/ui".into(),
            })
            .await;
        match response {
            Response::Resource(resolved) => assert_eq!(resolved.content, "<html/>"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_resource_fails() {
        let response = endpoint()
            .handle(Request::ReadResource {
                uri: "ui://srv/nope".into(),
            })
            .await;
        assert_eq!(response.phase(), Phase::Failed);
        assert!(matches!(
            response,
            Response::Failed {
                error: ErrorKind::UnknownResource,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_listings() {
        let endpoint = endpoint();
        match endpoint.handle(Request::ListTools).await {
            Response::Tools { tools } => assert_eq!(tools[0].name, "shout"),
            other => panic!("unexpected {:?}", other),
        }
        match endpoint.handle(Request::ListResources).await {
            Response::Resources { resources } => assert_eq!(resources[0].uri, "ui://srv/ui"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_request_wire_format() {
        let request: Request = serde_json::from_value(json!({
            "kind": "callTool",
            "name": "show-todos"
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::CallTool {
                name: "show-todos".into(),
                arguments: None
            }
        );
    }
}
