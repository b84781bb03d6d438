//! Geolocation globe tools
//!
//! Neither tool touches server state. Their results tell the globe app what
//! to show through the `structuredContent.action` discriminator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Bundles;
use crate::apps::{ui_uri, UiPermissions, UiResourceCsp, UiResourceRegistry};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::tools::{NoArguments, ToolDescriptor, ToolRegistry};

pub mod app;

pub use app::{Geolocator, Globe, GlobeAction, GlobeApp, GlobeState, GlobeView, Position, Status, StatusKind};

/// Resource URI of the globe bundle
pub const RESOURCE_URI: &str = "ui://geolocation-map/mcp-app.html";

/// Tile and script origins the globe bundle loads from
pub const MAP_DOMAINS: [&str; 3] = [
    "https://*.openstreetmap.org",
    "https://cesium.com",
    "https://*.cesium.com",
];

const EMBEDDED_BUNDLE: &str = include_str!("../../../assets/geolocation-map.html");

/// What the globe should display, as carried in `structuredContent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum GlobeCommand {
    /// Locate the user and show their position
    ShowLocation,
    /// Show a fixed point
    ShowCoordinates {
        latitude: f64,
        longitude: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ShowMapAt {
    /// Latitude (-90 to 90)
    #[schemars(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    /// Longitude (-180 to 180)
    #[schemars(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Optional label for the location
    #[serde(default)]
    pub label: Option<String>,
}

/// `"<lat>, <lon>"` at six decimals, followed by ` (label)` when present
pub fn describe_point(latitude: f64, longitude: f64, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{:.6}, {:.6} ({})", latitude, longitude, label),
        None => format!("{:.6}, {:.6}", latitude, longitude),
    }
}

fn command_envelope(text: String, command: &GlobeCommand) -> Result<Envelope> {
    Ok(Envelope::text(text).with_structured(serde_json::to_value(command)?))
}

/// Register the globe tools and bundle
pub fn register(tools: &mut ToolRegistry, resources: &mut UiResourceRegistry, bundles: &Bundles) -> Result<()> {
    let uri = ui_uri("geolocation-map", "mcp-app.html")?;

    resources.register(
        bundles
            .resource(uri.clone(), "geolocation-map", EMBEDDED_BUNDLE)
            .with_description("Interactive 3D globe")
            .with_permissions(UiPermissions::from_names(["geolocation"]))
            .with_csp(UiResourceCsp::allow_origins(MAP_DOMAINS)),
    )?;

    tools.register(
        ToolDescriptor::new(
            "show-my-location",
            "Display an interactive 3D globe showing your current geographic location. Requires location permission.",
        )
        .with_title("Show My Location")
        .with_output::<GlobeCommand>()
        .with_ui(uri.clone()),
        |_: NoArguments| async {
            command_envelope(
                "Opening interactive 3D globe to display your current location...".to_string(),
                &GlobeCommand::ShowLocation,
            )
        },
    )?;

    tools.register(
        ToolDescriptor::new(
            "show-map-at",
            "Display an interactive 3D globe centered on specific coordinates.",
        )
        .with_title("Show Map At Location")
        .with_output::<GlobeCommand>()
        .with_ui(uri),
        |input: ShowMapAt| async move {
            let text = format!(
                "Showing globe at {}",
                describe_point(input.latitude, input.longitude, input.label.as_deref())
            );
            command_envelope(
                text,
                &GlobeCommand::ShowCoordinates {
                    latitude: input.latitude,
                    longitude: input.longitude,
                    label: input.label,
                },
            )
        },
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        let mut resources = UiResourceRegistry::new();
        register(&mut tools, &mut resources, &Bundles::Embedded).unwrap();
        tools
    }

    #[tokio::test]
    async fn test_show_map_at_describes_point() {
        let envelope = registry()
            .invoke(
                "show-map-at",
                json!({"latitude": 48.8584, "longitude": 2.2945, "label": "Eiffel Tower"})
                    .as_object()
                    .cloned(),
            )
            .await
            .unwrap();
        assert_eq!(
            envelope.first_text(),
            Some("Showing globe at 48.858400, 2.294500 (Eiffel Tower)")
        );
        assert_eq!(
            envelope.structured_content,
            Some(json!({
                "action": "show-coordinates",
                "latitude": 48.8584,
                "longitude": 2.2945,
                "label": "Eiffel Tower"
            }))
        );
    }

    #[tokio::test]
    async fn test_latitude_out_of_range() {
        let result = registry()
            .invoke("show-map-at", json!({"latitude": 91, "longitude": 0}).as_object().cloned())
            .await;
        match result {
            Err(Error::Validation { path, .. }) => assert_eq!(path, "/latitude"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_range_edges_are_accepted() {
        let envelope = registry()
            .invoke("show-map-at", json!({"latitude": 90, "longitude": 180}).as_object().cloned())
            .await
            .unwrap();
        assert_eq!(envelope.first_text(), Some("Showing globe at 90.000000, 180.000000"));
        assert!(envelope.structured_content.unwrap().get("label").is_none());
    }

    #[tokio::test]
    async fn test_show_my_location_action() {
        let envelope = registry().invoke("show-my-location", None).await.unwrap();
        assert_eq!(envelope.structured_content, Some(json!({"action": "show-location"})));
    }
}
