//! Types for the MCP Apps extension (SEP-1865)
//!
//! Resource metadata, CSP allowlists, permissions and visibility controls
//! for tools that render an interactive UI.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::resource::{ContentProvider, StaticContent};
use crate::error::{Error, Result};

/// The MCP Apps extension identifier
pub const EXTENSION_ID: &str = "io.modelcontextprotocol/ui";

/// The URI scheme for MCP App resources
pub const UI_SCHEME: &str = "ui";

/// The MIME type for MCP App HTML resources
pub const MCP_APP_MIME_TYPE: &str = "text/html;profile=mcp-app";

/// Visibility of a tool to the model and/or UI app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Tool is visible to the LLM agent
    Model,
    /// Tool is callable from the iframe app on the same server
    App,
}

/// Build a `ui://` URI from a server name and resource name
pub fn ui_uri(server_name: &str, resource_name: &str) -> Result<Url> {
    let raw = format!("{}://{}/{}", UI_SCHEME, server_name, resource_name);
    Url::parse(&raw).map_err(|e| Error::Protocol(format!("invalid resource URI '{}': {}", raw, e)))
}

/// Tool metadata that links a tool to a UI resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiToolMeta {
    /// URI pointing to the ui:// resource
    pub resource_uri: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Vec<Visibility>>,
}

/// Content Security Policy domain allowlists for a UI resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiResourceCsp {
    /// Domains allowed for connect-src (fetch, XHR, WebSocket)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_domains: Option<Vec<String>>,
    /// Domains allowed for script-src, style-src, img-src, media-src, font-src
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_domains: Option<Vec<String>>,
    /// Domains allowed for frame-src
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_domains: Option<Vec<String>>,
    /// Domains allowed for base-uri
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_uri_domains: Option<Vec<String>>,
}

impl UiResourceCsp {
    /// Allow the same origins for both network access and loaded resources
    pub fn allow_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let origins: Vec<String> = origins.into_iter().map(Into::into).collect();
        Self {
            connect_domains: Some(origins.clone()),
            resource_domains: Some(origins),
            ..Default::default()
        }
    }
}

/// Permissions that a UI resource requests from the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPermissions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<serde_json::Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub microphone: Option<serde_json::Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<serde_json::Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clipboard_write: Option<serde_json::Map<String, Value>>,
}

impl UiPermissions {
    /// Build from capability names (`geolocation`, `camera`, `microphone`,
    /// `clipboardWrite`). Unrecognized names are ignored with a warning.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut permissions = Self::default();
        for name in names {
            let slot = match name {
                "camera" => &mut permissions.camera,
                "microphone" => &mut permissions.microphone,
                "geolocation" => &mut permissions.geolocation,
                "clipboardWrite" | "clipboard-write" => &mut permissions.clipboard_write,
                other => {
                    tracing::warn!(permission = other, "ignoring unknown UI permission");
                    continue;
                }
            };
            *slot = Some(serde_json::Map::new());
        }
        permissions
    }

    /// Names of the requested capabilities
    pub fn names(&self) -> Vec<&'static str> {
        [
            ("camera", self.camera.is_some()),
            ("microphone", self.microphone.is_some()),
            ("geolocation", self.geolocation.is_some()),
            ("clipboardWrite", self.clipboard_write.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, requested)| requested.then_some(name))
        .collect()
    }
}

/// Presentation constraints attached to a UI resource (`_meta.ui`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiResourceMeta {
    /// Content Security Policy domain allowlists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csp: Option<UiResourceCsp>,
    /// Requested iframe permissions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<UiPermissions>,
    /// Whether the host should render a visual border around the iframe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefers_border: Option<bool>,
    /// Optional dedicated sandbox origin domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// A UI resource that can be served to MCP hosts
#[derive(Clone)]
pub struct UiResource {
    /// The ui:// URI for this resource
    pub uri: Url,
    /// Human-readable name
    pub name: String,
    pub description: Option<String>,
    pub mime_type: String,
    /// Produces the bundle body on each read
    pub provider: Arc<dyn ContentProvider>,
    /// Resource metadata (CSP, permissions, etc.)
    pub meta: Option<UiResourceMeta>,
}

impl UiResource {
    /// Create a UI resource served from inline HTML
    pub fn new(uri: Url, name: impl Into<String>, html: impl Into<String>) -> Self {
        Self::with_provider(uri, name, StaticContent::new(html))
    }

    /// Create a UI resource whose body comes from `provider`
    pub fn with_provider(
        uri: Url,
        name: impl Into<String>,
        provider: impl ContentProvider + 'static,
    ) -> Self {
        Self {
            uri,
            name: name.into(),
            description: None,
            mime_type: MCP_APP_MIME_TYPE.to_string(),
            provider: Arc::new(provider),
            meta: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Override the declared content type
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Set CSP policy
    pub fn with_csp(mut self, csp: UiResourceCsp) -> Self {
        self.meta.get_or_insert_with(Default::default).csp = Some(csp);
        self
    }

    /// Set permissions
    pub fn with_permissions(mut self, permissions: UiPermissions) -> Self {
        self.meta.get_or_insert_with(Default::default).permissions = Some(permissions);
        self
    }

    /// Set border preference
    pub fn with_border(mut self, prefers_border: bool) -> Self {
        self.meta
            .get_or_insert_with(Default::default)
            .prefers_border = Some(prefers_border);
        self
    }
}

impl std::fmt::Debug for UiResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiResource")
            .field("uri", &self.uri.as_str())
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("meta", &self.meta)
            .finish()
    }
}
