//! Tool descriptors

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::apps::{UiToolMeta, Visibility};

/// Declaration of a tool: its name, documentation, schemas and UI binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    /// JSON schema of the arguments, filled in from the typed input at registration
    pub input_schema: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Map<String, Value>>,
    /// `ui://` resource rendered for this tool's results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_binding: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Vec<Visibility>>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: description.into(),
            input_schema: Map::new(),
            output_schema: None,
            ui_binding: None,
            visibility: None,
        }
    }

    /// Set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Declare the shape of `structuredContent` from a typed output
    pub fn with_output<O: schemars::JsonSchema>(mut self) -> Self {
        self.output_schema = Some(schema_object::<O>());
        self
    }

    /// Bind the tool to a UI resource
    pub fn with_ui(mut self, resource_uri: Url) -> Self {
        self.ui_binding = Some(resource_uri);
        self
    }

    /// Restrict who may call the tool. Omitted means model and app.
    pub fn with_visibility(mut self, visibility: Vec<Visibility>) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// `_meta.ui` value for this tool, if it is bound to a UI resource
    pub fn ui_meta(&self) -> Option<UiToolMeta> {
        self.ui_binding.as_ref().map(|uri| UiToolMeta {
            resource_uri: uri.clone(),
            visibility: self.visibility.clone(),
        })
    }
}

/// JSON schema of `T` as a JSON object
pub(crate) fn schema_object<T: schemars::JsonSchema>() -> Map<String, Value> {
    match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(Value::Object(map)) => map,
        // `true`/`false` schemas accept anything or nothing; an empty object
        // schema is the closest object form.
        _ => Map::new(),
    }
}
