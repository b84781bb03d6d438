//! MCP Apps Extension (SEP-1865) - Interactive HTML UIs in MCP
//!
//! Tools bound to a `ui://` resource have their results rendered by that
//! resource's bundle inside the conversation.

mod bridge;
mod resource;
mod types;

pub use bridge::{
    methods as bridge_methods, AppInfo, HostNotification, ToolCancelledParams, ToolInputParams,
    ToolResultParams, UpdateModelContextParams,
};
pub use resource::{BundleFile, ContentProvider, ResolvedResource, StaticContent, UiResourceRegistry};
pub use types::{
    ui_uri, UiPermissions, UiResource, UiResourceCsp, UiResourceMeta, UiToolMeta, Visibility,
    EXTENSION_ID, MCP_APP_MIME_TYPE, UI_SCHEME,
};
