//! Globe app model
//!
//! Drives a 3D globe widget from tool results. The widget and the
//! browser's position source sit behind the [`Globe`] and [`Geolocator`]
//! capabilities.

use std::cell::Cell;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use super::{describe_point, GlobeCommand};
use crate::apps::{AppInfo, UpdateModelContextParams};
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::runtime::{AppModel, Control, ControlBoard, ControlId, Dispatch, Host};

/// Camera height for a fixed point, in meters
const POINT_HEIGHT: f64 = 50_000.0;

/// Lowest camera height when showing the user's position
const MIN_LOCATION_HEIGHT: f64 = 10_000.0;

const HERE_LABEL: &str = "You are here!";

/// A position fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty in meters
    pub accuracy: f64,
}

/// Source of the user's position.
///
/// Denied permission, an unavailable fix or a timeout are reported as
/// [`Error::HostCapability`] with a human-readable reason.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Position>;
}

/// The globe widget
pub trait Globe: Send {
    fn fly_to(&mut self, latitude: f64, longitude: f64, height: f64);
    fn add_marker(&mut self, latitude: f64, longitude: f64, label: Option<&str>);
    fn clear_markers(&mut self);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    #[default]
    Info,
    Success,
    Error,
}

/// The status line under the globe
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Status {
    pub message: String,
    pub kind: StatusKind,
}

impl Status {
    fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobeView {
    pub status: Status,
    pub locate: Control,
    pub show_at: Control,
}

/// A user gesture on the globe app
#[derive(Debug, Clone, PartialEq)]
pub enum GlobeAction {
    /// Ask the server to show the user's location
    Locate,
    /// Ask the server to show a fixed point
    ShowAt {
        latitude: f64,
        longitude: f64,
        label: Option<String>,
    },
}

/// Latest command received, stamped so each delivery is applied once.
///
/// The stamp is per delivery, not per payload: delivering the same envelope
/// twice replays the widget commands (clear, mark, fly) while the rendered
/// view comes out identical. Re-renders without a delivery, such as a
/// control going pending, replay nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobeState {
    pub command: Option<GlobeCommand>,
    serial: u64,
}

fn locate_control() -> ControlId {
    ControlId::new("locate")
}

fn show_at_control() -> ControlId {
    ControlId::new("show-at")
}

/// Client side of the globe family
pub struct GlobeApp {
    globe: Box<dyn Globe>,
    geolocator: Box<dyn Geolocator>,
    /// Deliveries parsed so far
    received: Cell<u64>,
    applied: u64,
    status: Status,
}

impl GlobeApp {
    pub fn new(globe: impl Globe + 'static, geolocator: impl Geolocator + 'static) -> Self {
        Self {
            globe: Box::new(globe),
            geolocator: Box::new(geolocator),
            received: Cell::new(0),
            applied: 0,
            status: Status::new(StatusKind::Info, "Ready - waiting for location request..."),
        }
    }

    async fn show_current_location(&mut self, host: &dyn Host) -> Status {
        let position = match self.geolocator.current_position().await {
            Ok(position) => position,
            Err(e) => {
                let reason = match e {
                    Error::HostCapability { reason, .. } => reason,
                    other => other.to_string(),
                };
                tracing::warn!(%reason, "could not locate user");
                return Status::new(StatusKind::Error, format!("Error: {}", reason));
            }
        };

        let Position {
            latitude,
            longitude,
            accuracy,
        } = position;
        self.globe.clear_markers();
        self.globe.add_marker(latitude, longitude, Some(HERE_LABEL));
        self.globe
            .fly_to(latitude, longitude, (accuracy * 50.0).max(MIN_LOCATION_HEIGHT));

        let accuracy = accuracy.round() as i64;
        let context = UpdateModelContextParams::text(format!(
            "User's location: {} (accuracy: ±{}m)",
            describe_point(latitude, longitude, None),
            accuracy
        ));
        if let Err(e) = host.update_model_context(context).await {
            tracing::warn!(error = %e, "failed to share location with model");
        }

        Status::new(
            StatusKind::Success,
            format!(
                "Location: {} (±{}m)",
                describe_point(latitude, longitude, None),
                accuracy
            ),
        )
    }

    fn show_coordinates(&mut self, latitude: f64, longitude: f64, label: Option<&str>) -> Status {
        let marker = label
            .map(str::to_string)
            .unwrap_or_else(|| format!("{:.4}, {:.4}", latitude, longitude));
        self.globe.clear_markers();
        self.globe.add_marker(latitude, longitude, Some(&marker));
        self.globe.fly_to(latitude, longitude, POINT_HEIGHT);
        Status::new(
            StatusKind::Success,
            format!("Showing: {}", describe_point(latitude, longitude, label)),
        )
    }
}

#[async_trait]
impl AppModel for GlobeApp {
    type State = GlobeState;
    type Action = GlobeAction;
    type View = GlobeView;

    fn info(&self) -> AppInfo {
        AppInfo::new("Geolocation Globe", "1.0.0")
    }

    /// Any result without a recognizable command means "show my location"
    fn parse(&self, envelope: &Envelope) -> Result<GlobeState> {
        let command = envelope
            .structured_content
            .clone()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or(GlobeCommand::ShowLocation);
        let serial = self.received.get() + 1;
        self.received.set(serial);
        Ok(GlobeState {
            command: Some(command),
            serial,
        })
    }

    fn plan(&self, _state: &GlobeState, action: GlobeAction) -> Option<Dispatch> {
        let dispatch = match action {
            GlobeAction::Locate => Dispatch {
                control: locate_control(),
                pending_label: "Locating...".into(),
                tool: "show-my-location".into(),
                arguments: json!({}),
            },
            GlobeAction::ShowAt {
                latitude,
                longitude,
                label,
            } => Dispatch {
                control: show_at_control(),
                pending_label: "...".into(),
                tool: "show-map-at".into(),
                arguments: json!({ "latitude": latitude, "longitude": longitude, "label": label }),
            },
        };
        Some(dispatch)
    }

    async fn present(&mut self, state: &GlobeState, controls: &ControlBoard, host: &dyn Host) -> GlobeView {
        if state.serial != self.applied {
            self.applied = state.serial;
            self.status = match &state.command {
                Some(GlobeCommand::ShowLocation) => self.show_current_location(host).await,
                Some(GlobeCommand::ShowCoordinates {
                    latitude,
                    longitude,
                    label,
                }) => self.show_coordinates(*latitude, *longitude, label.as_deref()),
                None => self.status.clone(),
            };
        }
        GlobeView {
            status: self.status.clone(),
            locate: controls.control(locate_control(), "Show my location"),
            show_at: controls.control(show_at_control(), "Go"),
        }
    }
}
