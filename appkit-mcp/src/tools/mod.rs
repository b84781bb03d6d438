//! Tool registry
//!
//! Binds tool names to typed handlers. Arguments are validated against the
//! JSON schema derived from each handler's input type before the handler
//! runs, so handlers only ever see well-formed, in-range input.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::envelope::Envelope;
use crate::error::{Error, Result};

mod descriptor;

pub use descriptor::ToolDescriptor;

/// Input of a tool that takes no arguments
#[derive(Debug, Clone, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct NoArguments {}

type BoxedHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Envelope>> + Send + Sync>;

struct RegisteredTool {
    descriptor: ToolDescriptor,
    validator: jsonschema::Validator,
    handler: BoxedHandler,
}

/// Registry of invocable tools.
///
/// Populated during bootstrap, then shared immutably (behind an `Arc`) by
/// the endpoint. Listing preserves registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// The descriptor's input schema is generated from `I`; the handler
    /// receives the validated, deserialized input.
    pub fn register<I, F, Fut>(&mut self, mut descriptor: ToolDescriptor, handler: F) -> Result<()>
    where
        I: DeserializeOwned + schemars::JsonSchema + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Envelope>> + Send + 'static,
    {
        if self.index.contains_key(&descriptor.name) {
            return Err(Error::DuplicateTool(descriptor.name));
        }

        descriptor.input_schema = descriptor::schema_object::<I>();
        let validator = jsonschema::validator_for(&Value::Object(descriptor.input_schema.clone()))
            .map_err(|e| Error::InvalidSchema {
                tool: descriptor.name.clone(),
                reason: e.to_string(),
            })?;

        let handler = Arc::new(handler);
        let boxed: BoxedHandler = Arc::new(move |arguments: Value| {
            let handler = handler.clone();
            Box::pin(async move {
                let input: I = serde_json::from_value(arguments)
                    .map_err(|e| Error::validation("/", e.to_string()))?;
                handler(input).await
            })
        });

        tracing::debug!(tool = %descriptor.name, "registered tool");
        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            validator,
            handler: boxed,
        });
        Ok(())
    }

    /// Validate `arguments` and run the named tool.
    ///
    /// `None` or `null` arguments are treated as an empty object.
    pub async fn invoke(&self, name: &str, arguments: Option<Map<String, Value>>) -> Result<Envelope> {
        let tool = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;

        let arguments = Value::Object(arguments.unwrap_or_default());
        validate(&tool.validator, &arguments)?;

        (tool.handler)(arguments).await
    }

    /// Descriptor of a registered tool
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i].descriptor)
    }

    /// All descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor)
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.index.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Report the first violated constraint, if any
fn validate(validator: &jsonschema::Validator, arguments: &Value) -> Result<()> {
    match validator.iter_errors(arguments).next() {
        None => Ok(()),
        Some(err) => {
            let path = err.instance_path().to_string();
            let path = if path.is_empty() { "/".to_string() } else { path };
            Err(Error::validation(path, err.to_string()))
        }
    }
}
