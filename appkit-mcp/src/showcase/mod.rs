//! Showcase apps
//!
//! The tool families served by `appkit-server`: a todo list backed by an
//! in-memory store, a geolocation globe and a clock. Each family registers
//! its tools and its UI bundle, and ships the client-side [`AppModel`]
//! that renders its results.
//!
//! [`AppModel`]: crate::runtime::AppModel

use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::apps::{BundleFile, UiResource, UiResourceRegistry};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::tools::ToolRegistry;

pub mod clock;
pub mod globe;
pub mod todo;

/// Name the showcase server reports to clients
pub const SERVER_NAME: &str = "appkit-showcase";

/// File name of a built bundle inside its app directory
const BUNDLE_FILE: &str = "mcp-app.html";

/// Where UI bundle bodies come from
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Bundles {
    /// Markup compiled into the binary
    #[default]
    Embedded,
    /// Built bundles laid out as `<dir>/<app>/mcp-app.html`, read on each request
    Directory(PathBuf),
}

impl Bundles {
    pub fn from_dir(dir: Option<PathBuf>) -> Self {
        dir.map_or(Bundles::Embedded, Bundles::Directory)
    }

    /// UI resource for `app`, served from the bundle directory or from `embedded`
    pub(crate) fn resource(&self, uri: Url, app: &str, embedded: &'static str) -> UiResource {
        match self {
            Bundles::Embedded => UiResource::new(uri, app, embedded),
            Bundles::Directory(dir) => {
                let path = dir.join(app).join(BUNDLE_FILE);
                tracing::debug!(%uri, path = %path.display(), "serving bundle from disk");
                UiResource::with_provider(uri, app, BundleFile::new(path))
            }
        }
    }
}

/// Every showcase tool family, with the state they share
#[derive(Debug, Clone)]
pub struct Showcase {
    todos: Arc<todo::TodoStore>,
    bundles: Bundles,
}

impl Showcase {
    pub fn new(bundles: Bundles) -> Self {
        Self {
            todos: Arc::new(todo::TodoStore::new()),
            bundles,
        }
    }

    /// The todo family's store
    pub fn todos(&self) -> &Arc<todo::TodoStore> {
        &self.todos
    }

    /// Register all tools and UI resources
    pub fn register(&self, tools: &mut ToolRegistry, resources: &mut UiResourceRegistry) -> Result<()> {
        todo::register(tools, resources, self.todos.clone(), &self.bundles)?;
        globe::register(tools, resources, &self.bundles)?;
        clock::register(tools, resources, &self.bundles)?;
        tracing::info!(
            tools = tools.len(),
            resources = resources.len(),
            "showcase registered"
        );
        Ok(())
    }

    /// Build a frozen endpoint over the showcase registries
    pub fn endpoint(&self) -> Result<Endpoint> {
        let mut tools = ToolRegistry::new();
        let mut resources = UiResourceRegistry::new();
        self.register(&mut tools, &mut resources)?;
        Ok(Endpoint::new(tools, resources))
    }
}

impl Default for Showcase {
    fn default() -> Self {
        Self::new(Bundles::Embedded)
    }
}
