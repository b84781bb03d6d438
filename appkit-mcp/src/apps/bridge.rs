//! Bridge protocol for postMessage JSON-RPC communication (SEP-1865)
//!
//! JSON-RPC 2.0 payloads exchanged between the host and an embedded UI app.
//! The app runtime decodes host notifications with [`HostNotification`] and
//! sends model-context updates back with [`UpdateModelContextParams`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::{ContentBlock, Envelope};
use crate::error::{Error, Result};

/// Name and version an app or host reports about itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}

impl AppInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Host -> View: complete tool arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputParams {
    pub arguments: Value,
}

/// Host -> View: tool execution result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentBlock>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl From<ToolResultParams> for Envelope {
    fn from(params: ToolResultParams) -> Self {
        Envelope {
            content: params.content.unwrap_or_default(),
            structured_content: params.structured_content,
            is_error: params.is_error.unwrap_or(false),
        }
    }
}

impl From<&Envelope> for ToolResultParams {
    fn from(envelope: &Envelope) -> Self {
        ToolResultParams {
            content: Some(envelope.content.clone()),
            structured_content: envelope.structured_content.clone(),
            is_error: envelope.is_error.then_some(true),
            meta: None,
        }
    }
}

/// Host -> View: tool was cancelled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCancelledParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// View -> Host: update model context for next LLM turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModelContextParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentBlock>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

impl UpdateModelContextParams {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(vec![ContentBlock::text(text)]),
            structured_content: None,
        }
    }
}

/// A host notification the app runtime understands
#[derive(Debug, Clone)]
pub enum HostNotification {
    ToolInput(ToolInputParams),
    ToolResult(ToolResultParams),
    ToolCancelled(ToolCancelledParams),
}

impl HostNotification {
    /// Decode a `(method, params)` pair.
    ///
    /// Returns `Ok(None)` for methods the runtime does not act on.
    pub fn decode(method: &str, params: Value) -> Result<Option<Self>> {
        let parse_err = |e: serde_json::Error| Error::Parse(format!("{}: {}", method, e));
        let notification = match method {
            methods::TOOL_INPUT => {
                HostNotification::ToolInput(serde_json::from_value(params).map_err(parse_err)?)
            }
            methods::TOOL_RESULT => {
                HostNotification::ToolResult(serde_json::from_value(params).map_err(parse_err)?)
            }
            methods::TOOL_CANCELLED => {
                HostNotification::ToolCancelled(serde_json::from_value(params).map_err(parse_err)?)
            }
            _ => return Ok(None),
        };
        Ok(Some(notification))
    }
}

/// Bridge method names
pub mod methods {
    // Requests (require response)
    pub const UPDATE_MODEL_CONTEXT: &str = "ui/update-model-context";

    // Notifications (fire-and-forget)
    pub const TOOL_INPUT: &str = "ui/notifications/tool-input";
    pub const TOOL_RESULT: &str = "ui/notifications/tool-result";
    pub const TOOL_CANCELLED: &str = "ui/notifications/tool-cancelled";
}
