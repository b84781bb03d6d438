//! Application runtime
//!
//! The client half of an MCP App. Every tool result, whether the host
//! delivered it or a local action produced it, goes through one
//! reconciliation step: parse the envelope into domain state, replace the
//! local state wholesale, re-render the whole view.
//!
//! Events are processed one at a time from a single queue. Tool calls run
//! on spawned tasks and post their outcome back into that queue, so several
//! controls can be in flight at once and their responses may settle in any
//! order; each response is a full snapshot and the last one applied wins.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, watch};

use crate::apps::{AppInfo, HostNotification};
use crate::envelope::Envelope;
use crate::error::{Error, Result};

mod controls;
mod host;

pub use controls::{Control, ControlBoard, ControlId};
pub use host::{Host, LocalHost};

/// A tool call planned in response to a user action
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Control locked while the call is in flight
    pub control: ControlId,
    pub pending_label: String,
    pub tool: String,
    pub arguments: Value,
}

/// Domain logic of one embedded app
#[async_trait]
pub trait AppModel: Send + 'static {
    type State: Default + Send + Sync + 'static;
    type Action: Send + 'static;
    type View: Clone + Default + PartialEq + Send + Sync + 'static;

    /// Identity reported to the host
    fn info(&self) -> AppInfo;

    /// Read domain state out of a tool result
    fn parse(&self, envelope: &Envelope) -> Result<Self::State>;

    /// Turn a user action into a tool call, or `None` to ignore it
    fn plan(&self, state: &Self::State, action: Self::Action) -> Option<Dispatch>;

    /// Build the full view for `state`
    async fn present(
        &mut self,
        state: &Self::State,
        controls: &ControlBoard,
        host: &dyn Host,
    ) -> Self::View;
}

/// Work items of the runtime's queue
pub enum RuntimeEvent<A> {
    /// A tool result pushed by the host
    ToolResult(Envelope),
    /// A user gesture
    Action(A),
    /// A tool call started by an action has finished
    ActionSettled {
        control: ControlId,
        outcome: Result<Envelope>,
    },
    Shutdown,
}

/// Cloneable sender into a runtime's queue
pub struct RuntimeHandle<A> {
    events: mpsc::UnboundedSender<RuntimeEvent<A>>,
}

impl<A> Clone for RuntimeHandle<A> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
        }
    }
}

impl<A> RuntimeHandle<A> {
    /// Deliver a tool result from the host
    pub fn deliver(&self, envelope: Envelope) -> Result<()> {
        self.send(RuntimeEvent::ToolResult(envelope))
    }

    /// Deliver a raw bridge notification from the host
    pub fn notify(&self, method: &str, params: Value) -> Result<()> {
        match HostNotification::decode(method, params)? {
            Some(HostNotification::ToolResult(result)) => self.deliver(result.into()),
            Some(HostNotification::ToolInput(_)) => {
                tracing::debug!(method, "tool input received; waiting for result");
                Ok(())
            }
            Some(HostNotification::ToolCancelled(cancelled)) => {
                tracing::info!(reason = ?cancelled.reason, "host cancelled tool call");
                Ok(())
            }
            None => {
                tracing::trace!(method, "ignoring bridge notification");
                Ok(())
            }
        }
    }

    /// Submit a user action
    pub fn act(&self, action: A) -> Result<()> {
        self.send(RuntimeEvent::Action(action))
    }

    /// Stop the runtime's loop
    pub fn shutdown(&self) -> Result<()> {
        self.send(RuntimeEvent::Shutdown)
    }

    fn send(&self, event: RuntimeEvent<A>) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| Error::Transport("app runtime has stopped".to_string()))
    }
}

/// Reconciling runtime for one app model
pub struct AppRuntime<M: AppModel> {
    model: M,
    host: Arc<dyn Host>,
    state: M::State,
    controls: ControlBoard,
    view: watch::Sender<M::View>,
    events_tx: mpsc::UnboundedSender<RuntimeEvent<M::Action>>,
    events_rx: mpsc::UnboundedReceiver<RuntimeEvent<M::Action>>,
}

impl<M: AppModel> AppRuntime<M> {
    pub fn new(model: M, host: Arc<dyn Host>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (view, _) = watch::channel(M::View::default());
        tracing::debug!(app = %model.info().name, "app runtime created");
        Self {
            model,
            host,
            state: M::State::default(),
            controls: ControlBoard::new(),
            view,
            events_tx,
            events_rx,
        }
    }

    /// Sender for host deliveries and user actions
    pub fn handle(&self) -> RuntimeHandle<M::Action> {
        RuntimeHandle {
            events: self.events_tx.clone(),
        }
    }

    /// Watch the rendered view
    pub fn subscribe(&self) -> watch::Receiver<M::View> {
        self.view.subscribe()
    }

    /// Current rendered view
    pub fn view(&self) -> M::View {
        self.view.borrow().clone()
    }

    /// Current domain state
    pub fn state(&self) -> &M::State {
        &self.state
    }

    pub fn controls(&self) -> &ControlBoard {
        &self.controls
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Process events until shut down
    pub async fn run(mut self) {
        while self.turn().await {}
        tracing::debug!(app = %self.model.info().name, "app runtime stopped");
    }

    /// Wait for and process the next event. Returns `false` on shutdown.
    pub async fn turn(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => self.handle_event(event).await,
            None => false,
        }
    }

    /// Process one event. Returns `false` on shutdown.
    pub async fn handle_event(&mut self, event: RuntimeEvent<M::Action>) -> bool {
        match event {
            RuntimeEvent::ToolResult(envelope) => self.reconcile(&envelope).await,
            RuntimeEvent::Action(action) => self.dispatch(action).await,
            RuntimeEvent::ActionSettled { control, outcome } => self.settle(control, outcome).await,
            RuntimeEvent::Shutdown => return false,
        }
        true
    }

    /// Replace local state with the snapshot in `envelope` and re-render.
    ///
    /// Unparseable payloads render as empty state. Error envelopes carry no
    /// snapshot and leave the state unchanged.
    pub async fn reconcile(&mut self, envelope: &Envelope) {
        if envelope.is_error {
            tracing::warn!(
                reason = envelope.first_text().unwrap_or_default(),
                "tool result reported an error; keeping current state"
            );
            self.render().await;
            return;
        }
        self.state = match self.model.parse(envelope) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "could not read tool result; rendering empty state");
                M::State::default()
            }
        };
        self.render().await;
    }

    async fn dispatch(&mut self, action: M::Action) {
        let Some(dispatch) = self.model.plan(&self.state, action) else {
            return;
        };
        if !self
            .controls
            .begin(dispatch.control.clone(), dispatch.pending_label.clone())
        {
            tracing::debug!(control = %dispatch.control, "control busy; ignoring action");
            return;
        }
        self.render().await;

        tracing::debug!(tool = %dispatch.tool, control = %dispatch.control, "calling server tool");
        let host = self.host.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = host.call_server_tool(&dispatch.tool, dispatch.arguments).await;
            let settled = RuntimeEvent::ActionSettled {
                control: dispatch.control,
                outcome,
            };
            if events.send(settled).is_err() {
                tracing::debug!("app runtime stopped before tool call settled");
            }
        });
    }

    async fn settle(&mut self, control: ControlId, outcome: Result<Envelope>) {
        self.controls.settle(&control);
        match outcome {
            Ok(envelope) if !envelope.is_error => self.reconcile(&envelope).await,
            Ok(envelope) => {
                tracing::warn!(
                    %control,
                    reason = envelope.first_text().unwrap_or_default(),
                    "action failed; control re-enabled"
                );
                self.render().await;
            }
            Err(e) => {
                tracing::warn!(%control, error = %e, "action failed; control re-enabled");
                self.render().await;
            }
        }
    }

    async fn render(&mut self) {
        let view = self
            .model
            .present(&self.state, &self.controls, self.host.as_ref())
            .await;
        self.view.send_replace(view);
    }
}
