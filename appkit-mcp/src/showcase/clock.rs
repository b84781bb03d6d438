//! Clock tool and app
//!
//! `get-time` reports the server's current UTC time; the app shows it and
//! asks again when the user hits refresh.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::Bundles;
use crate::apps::{ui_uri, AppInfo, UiResourceRegistry};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::runtime::{AppModel, Control, ControlBoard, ControlId, Dispatch, Host};
use crate::tools::{NoArguments, ToolDescriptor, ToolRegistry};

/// Resource URI of the clock bundle
pub const RESOURCE_URI: &str = "ui://clock/mcp-app.html";

const EMBEDDED_BUNDLE: &str = include_str!("../../assets/clock.html");

/// Shown before the first reading arrives
const NO_TIME: &str = "--:--:--";

/// `structuredContent` of `get-time`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ServerTime {
    /// RFC 3339 timestamp in UTC
    pub time: String,
}

/// Register `get-time` and the clock bundle
pub fn register(tools: &mut ToolRegistry, resources: &mut UiResourceRegistry, bundles: &Bundles) -> Result<()> {
    let uri = ui_uri("clock", "mcp-app.html")?;
    resources.register(
        bundles
            .resource(uri.clone(), "clock", EMBEDDED_BUNDLE)
            .with_description("Server clock"),
    )?;

    tools.register(
        ToolDescriptor::new("get-time", "Returns the current server time")
            .with_title("Get Time")
            .with_output::<ServerTime>()
            .with_ui(uri),
        |_: NoArguments| async {
            let time = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            let structured = serde_json::to_value(ServerTime { time: time.clone() })?;
            Ok(Envelope::text(time).with_structured(structured))
        },
    )?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockAction {
    Refresh,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClockView {
    pub time: String,
    pub refresh: Control,
}

/// Client side of the clock family
#[derive(Debug, Default)]
pub struct ClockApp;

#[async_trait]
impl AppModel for ClockApp {
    type State = Option<ServerTime>;
    type Action = ClockAction;
    type View = ClockView;

    fn info(&self) -> AppInfo {
        AppInfo::new("Clock", "1.0.0")
    }

    fn parse(&self, envelope: &Envelope) -> Result<Option<ServerTime>> {
        match &envelope.structured_content {
            Some(structured) => Ok(Some(serde_json::from_value(structured.clone())?)),
            None => Ok(envelope.first_text().map(|time| ServerTime {
                time: time.to_string(),
            })),
        }
    }

    fn plan(&self, _state: &Option<ServerTime>, action: ClockAction) -> Option<Dispatch> {
        match action {
            ClockAction::Refresh => Some(Dispatch {
                control: ControlId::new("refresh"),
                pending_label: "Refreshing...".into(),
                tool: "get-time".into(),
                arguments: json!({}),
            }),
        }
    }

    async fn present(&mut self, state: &Option<ServerTime>, controls: &ControlBoard, _host: &dyn Host) -> ClockView {
        ClockView {
            time: state
                .as_ref()
                .map_or_else(|| NO_TIME.to_string(), |t| t.time.clone()),
            refresh: controls.control(ControlId::new("refresh"), "Refresh"),
        }
    }
}
