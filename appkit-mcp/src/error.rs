//! Error types for appkit-mcp

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for appkit-mcp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for tool, resource and runtime operations
#[derive(Error, Debug)]
pub enum Error {
    /// Tool arguments failed schema validation
    #[error("Validation error at '{path}': {reason}")]
    Validation { path: String, reason: String },

    /// Tool not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A tool with the same name is already registered
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    /// Resource not registered
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// A resource with the same URI is already registered
    #[error("Resource '{0}' is already registered")]
    DuplicateResource(String),

    /// A content provider failed to produce the resource body
    #[error("Resource '{uri}' is unavailable: {reason}")]
    ResourceUnavailable { uri: String, reason: String },

    /// A host capability (e.g. geolocation) was denied or is missing
    #[error("Host capability '{capability}' unavailable: {reason}")]
    HostCapability { capability: String, reason: String },

    /// An envelope payload could not be read as domain state
    #[error("Parse error: {0}")]
    Parse(String),

    /// A tool input schema could not be compiled
    #[error("Invalid schema for tool '{tool}': {reason}")]
    InvalidSchema { tool: String, reason: String },

    /// View markup could not be rendered
    #[error("Render error: {0}")]
    Render(#[from] minijinja::Error),

    /// Transport error (connection failed, disconnected, etc.)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol error (invalid message format, unexpected response, etc.)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// rmcp error
    #[error("MCP error: {0}")]
    Mcp(#[from] rmcp::ErrorData),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server initialization error
    #[error("Server initialization error: {0}")]
    ServerInit(String),

    /// Client not connected
    #[error("Client not connected")]
    NotConnected,
}

/// Stable classification of an [`Error`], carried in failed responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    UnknownTool,
    DuplicateTool,
    UnknownResource,
    DuplicateResource,
    ResourceUnavailable,
    HostCapability,
    Parse,
    Internal,
}

impl Error {
    /// Build a validation error from a JSON pointer path and a reason
    pub fn validation(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn host_capability(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::HostCapability {
            capability: capability.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::UnknownTool(_) => ErrorKind::UnknownTool,
            Error::DuplicateTool(_) => ErrorKind::DuplicateTool,
            Error::UnknownResource(_) => ErrorKind::UnknownResource,
            Error::DuplicateResource(_) => ErrorKind::DuplicateResource,
            Error::ResourceUnavailable { .. } => ErrorKind::ResourceUnavailable,
            Error::HostCapability { .. } => ErrorKind::HostCapability,
            Error::Parse(_) => ErrorKind::Parse,
            _ => ErrorKind::Internal,
        }
    }

    /// Whether the caller may reasonably retry the same request
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ResourceUnavailable { .. } | Error::Transport(_) | Error::Io(_)
        )
    }
}
