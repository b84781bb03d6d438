//! Integration tests for the MCP server and client

use std::sync::Arc;

use appkit_mcp::apps::{UiResourceMeta, UiToolMeta, MCP_APP_MIME_TYPE};
use appkit_mcp::client::McpClient;
use appkit_mcp::runtime::AppRuntime;
use appkit_mcp::server::{McpServer, ServerTransport};
use appkit_mcp::showcase::todo::{TodoAction, TodoApp, TodoList};
use appkit_mcp::showcase::{globe, Showcase, SERVER_NAME};
use appkit_mcp::Envelope;
use rmcp::model::ResourceContents;
use serde_json::{json, Value};

fn build_showcase_server() -> McpServer {
    let showcase = Showcase::default();
    McpServer::builder(SERVER_NAME)
        .with_version("1.0.0")
        .with_description("Showcase server for tests")
        .register_with(|tools, resources| showcase.register(tools, resources))
        .build()
        .expect("showcase should register cleanly")
}

async fn start_server(transport: ServerTransport) -> tokio::task::JoinHandle<()> {
    let server = build_showcase_server();
    tokio::spawn(async move {
        server.serve(transport).await.expect("Server failed");
    })
}

async fn start_websocket_server(port: u16) -> tokio::task::JoinHandle<()> {
    let handle = start_server(ServerTransport::WebSocket(format!("127.0.0.1:{}", port))).await;
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    handle
}

fn todo_count(result: &rmcp::model::CallToolResult) -> usize {
    let structured = result.structured_content.clone().expect("structured snapshot");
    serde_json::from_value::<TodoList>(structured).unwrap().todos.len()
}

#[tokio::test]
async fn test_websocket_lists_tools_with_ui_meta() {
    let _server = start_websocket_server(18101).await;

    let client = McpClient::websocket("ws://127.0.0.1:18101")
        .await
        .expect("Failed to connect");

    let tools = client.list_tools().await.expect("Failed to list tools");
    let names: Vec<_> = tools.tools.iter().map(|t| t.name.to_string()).collect();
    assert_eq!(
        names,
        vec![
            "show-todos",
            "add-todo",
            "toggle-todo",
            "remove-todo",
            "show-my-location",
            "show-map-at",
            "get-time"
        ]
    );

    let add = tools.tools.iter().find(|t| t.name == "add-todo").unwrap();
    let ui = add.meta.as_ref().and_then(|m| m.0.get("ui")).expect("_meta.ui");
    let ui: UiToolMeta = serde_json::from_value(ui.clone()).unwrap();
    assert_eq!(ui.resource_uri.as_str(), "ui://todo-app/mcp-app.html");
    assert!(add.output_schema.is_some());

    let required = add.input_schema.get("required").cloned().unwrap_or_default();
    assert_eq!(required, json!(["text"]));

    client.close().await.expect("Failed to close");
}

#[tokio::test]
async fn test_websocket_call_tool_returns_snapshot() {
    let _server = start_websocket_server(18102).await;

    let client = McpClient::websocket("ws://127.0.0.1:18102")
        .await
        .expect("Failed to connect");

    let shown = client.call_tool("show-todos", json!({})).await.unwrap();
    assert_eq!(todo_count(&shown), 2);

    let added = client
        .call_tool("add-todo", json!({"text": "Write spec"}))
        .await
        .unwrap();
    assert_ne!(added.is_error, Some(true));
    assert_eq!(todo_count(&added), 3);

    let envelope = Envelope::from(&added);
    let from_text: Value = serde_json::from_str(envelope.first_text().unwrap()).unwrap();
    assert_eq!(from_text.as_array().map(Vec::len), Some(3));

    client.close().await.expect("Failed to close");
}

#[tokio::test]
async fn test_websocket_validation_boundary() {
    let _server = start_websocket_server(18103).await;

    let client = McpClient::websocket("ws://127.0.0.1:18103")
        .await
        .expect("Failed to connect");

    let rejected = client
        .call_tool("show-map-at", json!({"latitude": 91, "longitude": 0}))
        .await
        .unwrap();
    assert_eq!(rejected.is_error, Some(true));

    let edge = client
        .call_tool("show-map-at", json!({"latitude": 90, "longitude": 180}))
        .await
        .unwrap();
    assert_ne!(edge.is_error, Some(true));
    let structured = edge.structured_content.expect("globe command");
    assert_eq!(structured["action"], "show-coordinates");

    client.close().await.expect("Failed to close");
}

#[tokio::test]
async fn test_websocket_read_resource_with_permissions() {
    let _server = start_websocket_server(18104).await;

    let client = McpClient::websocket("ws://127.0.0.1:18104")
        .await
        .expect("Failed to connect");

    let resources = client.list_resources().await.unwrap();
    let uris: Vec<_> = resources.resources.iter().map(|r| r.raw.uri.as_str()).collect();
    assert_eq!(
        uris,
        vec![
            "ui://todo-app/mcp-app.html",
            globe::RESOURCE_URI,
            "ui://clock/mcp-app.html"
        ]
    );

    let result = client.read_resource(globe::RESOURCE_URI).await.unwrap();
    assert_eq!(result.contents.len(), 1);
    match &result.contents[0] {
        ResourceContents::TextResourceContents {
            text,
            mime_type,
            meta,
            ..
        } => {
            assert!(text.contains("<html"));
            assert_eq!(mime_type.as_deref(), Some(MCP_APP_MIME_TYPE));
            let ui = meta.as_ref().and_then(|m| m.0.get("ui")).expect("_meta.ui");
            let ui: UiResourceMeta = serde_json::from_value(ui.clone()).unwrap();
            assert_eq!(ui.permissions.unwrap().names(), vec!["geolocation"]);
            let csp = ui.csp.unwrap();
            assert_eq!(csp.connect_domains.map(|d| d.len()), Some(globe::MAP_DOMAINS.len()));
        }
        _ => panic!("Expected TextResourceContents"),
    }

    let missing = client.read_resource("ui://nope/mcp-app.html").await;
    assert!(missing.is_err(), "Reading an unknown resource should fail");

    client.close().await.expect("Failed to close");
}

#[tokio::test]
async fn test_websocket_unknown_tool() {
    let _server = start_websocket_server(18105).await;

    let client = McpClient::websocket("ws://127.0.0.1:18105")
        .await
        .expect("Failed to connect");

    let result = client.call_tool("nonexistent", json!({})).await.unwrap();
    assert_eq!(result.is_error, Some(true));

    client.close().await.expect("Failed to close");
}

#[tokio::test]
async fn test_server_info_advertises_resources() {
    let _server = start_websocket_server(18106).await;

    let client = McpClient::websocket("ws://127.0.0.1:18106")
        .await
        .expect("Failed to connect");

    let info = client.server_info().expect("Server info should be available");
    assert_eq!(info.server_info.name, SERVER_NAME);
    assert!(info.capabilities.tools.is_some());
    assert!(info.capabilities.resources.is_some());

    client.close().await.expect("Failed to close");
}

#[tokio::test]
async fn test_runtime_over_mcp_client() {
    let _server = start_websocket_server(18107).await;

    let client = McpClient::websocket("ws://127.0.0.1:18107")
        .await
        .expect("Failed to connect");
    let first = Envelope::from(&client.call_tool("show-todos", json!({})).await.unwrap());

    let mut runtime = AppRuntime::new(TodoApp::new(), Arc::new(client));
    let handle = runtime.handle();

    handle.deliver(first).unwrap();
    runtime.turn().await;
    assert_eq!(runtime.view().rows.len(), 2);

    handle.act(TodoAction::Remove("2".into())).unwrap();
    runtime.turn().await;
    runtime.turn().await;

    let view = runtime.view();
    assert_eq!(view.texts(), vec!["Try out MCP Apps"]);
    assert_eq!(runtime.controls().pending_count(), 0);
}

#[tokio::test]
async fn test_http_health_route() {
    let _server = start_server(ServerTransport::Http("127.0.0.1:18201".into())).await;
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    let response = reqwest::get("http://127.0.0.1:18201/health").await.unwrap();
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_http_mcp_round_trip() {
    let _server = start_server(ServerTransport::Http("127.0.0.1:18202".into())).await;
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    let client = McpClient::http("http://127.0.0.1:18202/mcp")
        .await
        .expect("Failed to connect");

    let time = client.call_tool("get-time", json!({})).await.unwrap();
    let structured = time.structured_content.expect("server time");
    let stamp = structured["time"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());

    client.close().await.expect("Failed to close");
}

#[tokio::test]
async fn test_build_reports_duplicate_registration() {
    let showcase = Showcase::default();
    let result = McpServer::builder(SERVER_NAME)
        .register_with(|tools, resources| showcase.register(tools, resources))
        .register_with(|tools, resources| showcase.register(tools, resources))
        .build();
    assert!(result.is_err());
}
