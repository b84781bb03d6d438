//! Host connection used by the app runtime

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::apps::{bridge_methods, UpdateModelContextParams};
use crate::endpoint::Endpoint;
use crate::envelope::Envelope;
use crate::error::Result;

/// What an embedded app can ask of its host
#[async_trait]
pub trait Host: Send + Sync {
    /// Invoke a tool on the server that provided the app
    async fn call_server_tool(&self, name: &str, arguments: Value) -> Result<Envelope>;

    /// Offer context to the model for its next turn
    async fn update_model_context(&self, params: UpdateModelContextParams) -> Result<()> {
        tracing::debug!(
            method = bridge_methods::UPDATE_MODEL_CONTEXT,
            blocks = params.content.as_ref().map_or(0, Vec::len),
            "host does not accept model context; dropping update"
        );
        Ok(())
    }
}

/// In-process host that calls an [`Endpoint`] directly and records
/// model context updates.
#[derive(Debug)]
pub struct LocalHost {
    endpoint: Endpoint,
    model_context: Mutex<Vec<UpdateModelContextParams>>,
}

impl LocalHost {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            model_context: Mutex::new(Vec::new()),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Model context updates received so far, oldest first
    pub fn model_context(&self) -> Vec<UpdateModelContextParams> {
        self.model_context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Host for LocalHost {
    async fn call_server_tool(&self, name: &str, arguments: Value) -> Result<Envelope> {
        Ok(self.endpoint.call_tool(name, arguments.as_object().cloned()).await)
    }

    async fn update_model_context(&self, params: UpdateModelContextParams) -> Result<()> {
        tracing::debug!(method = bridge_methods::UPDATE_MODEL_CONTEXT, "model context updated");
        self.model_context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(params);
        Ok(())
    }
}
