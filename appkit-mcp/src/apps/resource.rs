//! UI resource registry
//!
//! Stores registered UI resources and resolves them for MCP
//! `resources/list` and `resources/read`. Bodies come from a
//! [`ContentProvider`], invoked on every read.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use rmcp::model::{Annotated, Meta, RawResource, ReadResourceResult, Resource, ResourceContents};
use serde::Serialize;
use serde_json::{json, Value};

use super::types::{UiResource, UiResourceMeta};
use crate::error::{Error, Result};

/// Source of a resource body.
///
/// Providers must be idempotent and free of side effects; a failure is
/// reported to the caller and leaves the registry untouched.
pub trait ContentProvider: Send + Sync {
    fn load(&self) -> Result<String>;
}

impl<F> ContentProvider for F
where
    F: Fn() -> Result<String> + Send + Sync,
{
    fn load(&self) -> Result<String> {
        self()
    }
}

/// Markup held in memory
#[derive(Debug, Clone)]
pub struct StaticContent(String);

impl StaticContent {
    pub fn new(content: impl Into<String>) -> Self {
        Self(content.into())
    }
}

impl ContentProvider for StaticContent {
    fn load(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// A built bundle read from disk on each request
#[derive(Debug, Clone)]
pub struct BundleFile {
    path: PathBuf,
}

impl BundleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ContentProvider for BundleFile {
    fn load(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| Error::ResourceUnavailable {
            uri: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// A resource body together with its declared type and constraints
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedResource {
    pub uri: String,
    pub mime_type: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<UiResourceMeta>,
}

/// Registry of UI resources available to MCP hosts.
///
/// Keyed by the resource's `ui://` URI; listing preserves registration order.
#[derive(Debug, Clone, Default)]
pub struct UiResourceRegistry {
    resources: Vec<Arc<UiResource>>,
    index: HashMap<String, usize>,
}

impl UiResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a UI resource. Each URI may be bound once.
    pub fn register(&mut self, resource: UiResource) -> Result<()> {
        let uri = resource.uri.to_string();
        if self.index.contains_key(&uri) {
            return Err(Error::DuplicateResource(uri));
        }
        tracing::debug!(uri = %uri, mime_type = %resource.mime_type, "registered UI resource");
        self.index.insert(uri, self.resources.len());
        self.resources.push(Arc::new(resource));
        Ok(())
    }

    /// Look up a resource by URI string
    pub fn get(&self, uri: &str) -> Option<&Arc<UiResource>> {
        self.index.get(uri).map(|&i| &self.resources[i])
    }

    /// Load the body of `uri` from its provider
    pub fn resolve(&self, uri: &str) -> Result<ResolvedResource> {
        let resource = self
            .get(uri)
            .ok_or_else(|| Error::UnknownResource(uri.to_string()))?;

        let content = resource.provider.load().map_err(|e| match e {
            Error::ResourceUnavailable { reason, .. } => Error::ResourceUnavailable {
                uri: uri.to_string(),
                reason,
            },
            other => Error::ResourceUnavailable {
                uri: uri.to_string(),
                reason: other.to_string(),
            },
        })?;

        Ok(ResolvedResource {
            uri: uri.to_string(),
            mime_type: resource.mime_type.clone(),
            content,
            constraints: resource.meta.clone(),
        })
    }

    /// Registered resources in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<UiResource>> {
        self.resources.iter()
    }

    /// Number of registered resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Convert all registered resources to rmcp `Resource` values for `resources/list`.
    ///
    /// The `_meta.ui` field carries CSP, permissions, and display preferences
    /// per SEP-1865.
    pub fn list_resources(&self) -> Vec<Resource> {
        self.resources.iter().map(|r| resource_to_mcp(r)).collect()
    }
}

/// Convert a `UiResource` to an rmcp `Resource` for listing.
fn resource_to_mcp(r: &UiResource) -> Resource {
    Annotated {
        raw: RawResource {
            uri: r.uri.to_string(),
            name: r.name.clone(),
            title: None,
            description: r.description.clone(),
            mime_type: Some(r.mime_type.clone()),
            size: None,
            icons: None,
            meta: ui_meta(r.meta.as_ref()),
        },
        annotations: None,
    }
}

impl From<ResolvedResource> for ReadResourceResult {
    fn from(resolved: ResolvedResource) -> Self {
        ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri: resolved.uri,
                mime_type: Some(resolved.mime_type),
                text: resolved.content,
                meta: ui_meta(resolved.constraints.as_ref()),
            }],
        }
    }
}

/// `_meta` object holding `ui` constraints, if any
fn ui_meta(meta: Option<&UiResourceMeta>) -> Option<Meta> {
    let meta = meta?;
    let mut map = serde_json::Map::new();
    map.insert("ui".to_string(), ui_meta_to_value(meta));
    Some(Meta(map))
}

/// Serialize `UiResourceMeta` to a JSON `Value` for the `_meta.ui` field.
fn ui_meta_to_value(meta: &UiResourceMeta) -> Value {
    serde_json::to_value(meta).unwrap_or(json!({}))
}
