//! Integration tests for the todo tool family and its app runtime

use std::collections::HashSet;
use std::sync::Arc;

use appkit_mcp::runtime::{AppRuntime, ControlId, Host, LocalHost};
use appkit_mcp::showcase::todo::{Todo, TodoAction, TodoApp, TodoList};
use appkit_mcp::showcase::Showcase;
use appkit_mcp::{Endpoint, Envelope, Error};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

fn todos(envelope: &Envelope) -> Vec<Todo> {
    assert!(!envelope.is_error, "unexpected error: {:?}", envelope.first_text());
    let structured = envelope
        .structured_content
        .clone()
        .expect("snapshot should carry structured content");
    serde_json::from_value::<TodoList>(structured).unwrap().todos
}

async fn call(endpoint: &Endpoint, tool: &str, arguments: Value) -> Envelope {
    endpoint.call_tool(tool, arguments.as_object().cloned()).await
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let endpoint = Showcase::default().endpoint().unwrap();

    let seeded = todos(&call(&endpoint, "show-todos", json!({})).await);
    assert_eq!(
        seeded,
        vec![Todo::new("1", "Try out MCP Apps"), Todo::new("2", "Test on Claude.ai")]
    );

    let added = todos(&call(&endpoint, "add-todo", json!({"text": "Write spec"})).await);
    assert_eq!(added.len(), 3);
    let new_item = added.last().unwrap().clone();
    assert_eq!(new_item.text, "Write spec");
    assert!(!new_item.completed);

    let toggled = todos(&call(&endpoint, "toggle-todo", json!({"id": new_item.id})).await);
    assert_eq!(toggled.len(), 3);
    for todo in &toggled {
        assert_eq!(todo.completed, todo.id == new_item.id, "item {}", todo.id);
    }

    let removed = todos(&call(&endpoint, "remove-todo", json!({"id": "1"})).await);
    assert_eq!(removed.len(), 2);
    assert!(removed.iter().all(|t| t.id != "1"));
}

#[tokio::test]
async fn test_snapshot_text_matches_structured_content() {
    let endpoint = Showcase::default().endpoint().unwrap();
    let envelope = call(&endpoint, "add-todo", json!({"text": "Ship it"})).await;

    let from_text: Vec<Todo> = serde_json::from_str(envelope.first_text().unwrap()).unwrap();
    assert_eq!(from_text, todos(&envelope));
}

#[tokio::test]
async fn test_mutations_return_complete_snapshot() {
    let endpoint = Showcase::default().endpoint().unwrap();

    let mutations = [
        ("add-todo", json!({"text": "a"})),
        ("toggle-todo", json!({"id": "2"})),
        ("remove-todo", json!({"id": "1"})),
        ("add-todo", json!({"text": "b"})),
    ];
    for (tool, arguments) in mutations {
        let after = todos(&call(&endpoint, tool, arguments).await);
        let read = todos(&call(&endpoint, "show-todos", json!({})).await);
        assert_eq!(after, read, "{} returned a partial snapshot", tool);
    }
}

#[tokio::test]
async fn test_remove_twice_matches_remove_once() {
    let endpoint = Showcase::default().endpoint().unwrap();

    let once = call(&endpoint, "remove-todo", json!({"id": "2"})).await;
    let twice = call(&endpoint, "remove-todo", json!({"id": "2"})).await;
    assert!(!twice.is_error);
    assert_eq!(todos(&once), todos(&twice));
}

#[tokio::test]
async fn test_toggle_absent_id_is_noop() {
    let endpoint = Showcase::default().endpoint().unwrap();

    let before = todos(&call(&endpoint, "show-todos", json!({})).await);
    let after = call(&endpoint, "toggle-todo", json!({"id": "does-not-exist"})).await;
    assert_eq!(todos(&after), before);
}

#[tokio::test]
async fn test_added_ids_are_distinct() {
    let endpoint = Showcase::default().endpoint().unwrap();

    for i in 0..25 {
        call(&endpoint, "add-todo", json!({"text": format!("task {}", i)})).await;
    }
    let all = todos(&call(&endpoint, "show-todos", json!({})).await);
    let ids: HashSet<_> = all.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(all.len(), 27);
    assert_eq!(ids.len(), all.len());
}

#[tokio::test]
async fn test_invalid_arguments_leave_store_untouched() {
    let showcase = Showcase::default();
    let endpoint = showcase.endpoint().unwrap();

    let empty = call(&endpoint, "add-todo", json!({"text": ""})).await;
    assert!(empty.is_error);
    let missing = call(&endpoint, "remove-todo", json!({})).await;
    assert!(missing.is_error);
    let wrong_type = call(&endpoint, "toggle-todo", json!({"id": 7})).await;
    assert!(wrong_type.is_error);

    assert_eq!(showcase.todos().list().len(), 2);
}

#[tokio::test]
async fn test_reset_restores_seed() {
    let showcase = Showcase::default();
    let endpoint = showcase.endpoint().unwrap();

    call(&endpoint, "remove-todo", json!({"id": "1"})).await;
    call(&endpoint, "add-todo", json!({"text": "later"})).await;
    showcase.todos().reset();

    let ids: Vec<_> = todos(&call(&endpoint, "show-todos", json!({})).await)
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec!["1", "2"]);
}

// Runtime

fn todo_runtime(endpoint: Endpoint) -> AppRuntime<TodoApp> {
    AppRuntime::new(TodoApp::new(), Arc::new(LocalHost::new(endpoint)))
}

#[tokio::test]
async fn test_runtime_follows_end_to_end_scenario() {
    let endpoint = Showcase::default().endpoint().unwrap();
    let mut runtime = todo_runtime(endpoint.clone());
    let handle = runtime.handle();

    handle.deliver(call(&endpoint, "show-todos", json!({})).await).unwrap();
    assert!(runtime.turn().await);
    assert_eq!(runtime.view().texts(), vec!["Try out MCP Apps", "Test on Claude.ai"]);

    handle.act(TodoAction::Add("  Write spec ".into())).unwrap();
    assert!(runtime.turn().await);
    // Dispatched but not settled
    let pending = runtime.view();
    assert!(pending.add.disabled);
    assert_eq!(pending.add.label, "Adding...");
    assert_eq!(pending.rows.len(), 2);

    assert!(runtime.turn().await);
    let view = runtime.view();
    assert!(!view.add.disabled);
    assert_eq!(view.add.label, "Add");
    assert_eq!(view.texts(), vec!["Try out MCP Apps", "Test on Claude.ai", "Write spec"]);
    let new_id = view.rows[2].id.clone();

    handle.act(TodoAction::Toggle(new_id.clone())).unwrap();
    runtime.turn().await;
    runtime.turn().await;
    assert!(runtime.view().row(&new_id).unwrap().completed);

    handle.act(TodoAction::Remove("1".into())).unwrap();
    runtime.turn().await;
    assert!(runtime.view().row("1").unwrap().delete.disabled);
    runtime.turn().await;

    let view = runtime.view();
    assert_eq!(view.rows.len(), 2);
    assert!(view.row("1").is_none());
    assert_eq!(runtime.controls().pending_count(), 0);
}

#[tokio::test]
async fn test_same_envelope_twice_renders_same_view() {
    let endpoint = Showcase::default().endpoint().unwrap();
    let mut runtime = todo_runtime(endpoint.clone());
    let handle = runtime.handle();
    let envelope = call(&endpoint, "add-todo", json!({"text": "<b>bold</b>"})).await;

    handle.deliver(envelope.clone()).unwrap();
    runtime.turn().await;
    let first = runtime.view();
    let first_html = runtime.model().render_html(&first).unwrap();

    handle.deliver(envelope).unwrap();
    runtime.turn().await;
    let second = runtime.view();

    assert_eq!(first, second);
    assert_eq!(second.rows.len(), 3);
    assert!(second.rows.iter().all(|r| !r.delete.disabled && !r.toggle.disabled));
    assert_eq!(first_html, runtime.model().render_html(&second).unwrap());
    assert!(first_html.contains("&lt;b&gt;bold&lt;&#x2f;b&gt;"));
    assert!(!first_html.contains("<b>"));
}

#[tokio::test]
async fn test_bridge_notification_reconciles() {
    let endpoint = Showcase::default().endpoint().unwrap();
    let mut runtime = todo_runtime(endpoint.clone());
    let handle = runtime.handle();
    let envelope = call(&endpoint, "show-todos", json!({})).await;

    let params = serde_json::to_value(appkit_mcp::apps::ToolResultParams::from(&envelope)).unwrap();
    handle
        .notify(appkit_mcp::apps::bridge_methods::TOOL_RESULT, params)
        .unwrap();
    runtime.turn().await;

    assert_eq!(runtime.view().rows.len(), 2);
}

#[tokio::test]
async fn test_unreadable_result_renders_empty_list() {
    let endpoint = Showcase::default().endpoint().unwrap();
    let mut runtime = todo_runtime(endpoint.clone());
    let handle = runtime.handle();

    handle.deliver(call(&endpoint, "show-todos", json!({})).await).unwrap();
    runtime.turn().await;
    handle.deliver(Envelope::text("not json at all")).unwrap();
    runtime.turn().await;

    let view = runtime.view();
    assert!(view.is_empty());
    let html = runtime.model().render_html(&view).unwrap();
    assert!(html.contains(appkit_mcp::showcase::todo::EMPTY_MESSAGE));
}

/// Host whose every call fails
struct Unreachable;

#[async_trait]
impl Host for Unreachable {
    async fn call_server_tool(&self, _name: &str, _arguments: Value) -> appkit_mcp::Result<Envelope> {
        Err(Error::Transport("connection reset".into()))
    }
}

#[tokio::test]
async fn test_failed_action_reenables_control() {
    let endpoint = Showcase::default().endpoint().unwrap();
    let mut runtime = AppRuntime::new(TodoApp::new(), Arc::new(Unreachable));
    let handle = runtime.handle();

    handle.deliver(call(&endpoint, "show-todos", json!({})).await).unwrap();
    runtime.turn().await;
    let before = runtime.view();

    handle.act(TodoAction::Remove("1".into())).unwrap();
    runtime.turn().await;
    let pending = runtime.view().row("1").unwrap().delete.clone();
    assert!(pending.disabled);
    assert_eq!(pending.label, "...");

    runtime.turn().await;
    assert_eq!(runtime.view(), before);
    assert_eq!(runtime.controls().pending_count(), 0);
}

#[tokio::test]
async fn test_error_envelope_keeps_items() {
    let endpoint = Showcase::default().endpoint().unwrap();
    let mut runtime = todo_runtime(endpoint.clone());
    let handle = runtime.handle();

    handle.deliver(call(&endpoint, "show-todos", json!({})).await).unwrap();
    runtime.turn().await;

    // Bypasses the client-side trim so the server rejects it
    let rejected = call(&endpoint, "add-todo", json!({"text": ""})).await;
    assert!(rejected.is_error);
    handle.deliver(rejected).unwrap();
    runtime.turn().await;

    assert_eq!(runtime.view().rows.len(), 2);
}

/// Local host that holds toggle calls until released
struct GatedHost {
    inner: LocalHost,
    toggle_gate: Arc<Notify>,
}

#[async_trait]
impl Host for GatedHost {
    async fn call_server_tool(&self, name: &str, arguments: Value) -> appkit_mcp::Result<Envelope> {
        if name == "toggle-todo" {
            self.toggle_gate.notified().await;
        }
        self.inner.call_server_tool(name, arguments).await
    }
}

#[tokio::test]
async fn test_responses_settle_out_of_order() {
    let endpoint = Showcase::default().endpoint().unwrap();
    let gate = Arc::new(Notify::new());
    let host = GatedHost {
        inner: LocalHost::new(endpoint.clone()),
        toggle_gate: gate.clone(),
    };
    let mut runtime = AppRuntime::new(TodoApp::new(), Arc::new(host));
    let handle = runtime.handle();

    handle.deliver(call(&endpoint, "show-todos", json!({})).await).unwrap();
    runtime.turn().await;

    handle.act(TodoAction::Toggle("1".into())).unwrap();
    handle.act(TodoAction::Remove("2".into())).unwrap();
    runtime.turn().await;
    runtime.turn().await;
    assert_eq!(runtime.controls().pending_count(), 2);

    // Remove settles first while the toggle is still held
    runtime.turn().await;
    let view = runtime.view();
    assert!(view.row("2").is_none());
    assert!(view.row("1").unwrap().toggle.disabled);
    assert!(runtime.controls().is_pending(&ControlId::for_item("toggle", "1")));

    gate.notify_one();
    runtime.turn().await;
    let view = runtime.view();
    assert_eq!(view.rows.len(), 1);
    let row = view.row("1").unwrap();
    assert!(row.completed);
    assert!(!row.toggle.disabled);
    assert_eq!(runtime.controls().pending_count(), 0);
}

#[tokio::test]
async fn test_busy_control_refuses_second_submission() {
    let endpoint = Showcase::default().endpoint().unwrap();
    let gate = Arc::new(Notify::new());
    let host = GatedHost {
        inner: LocalHost::new(endpoint.clone()),
        toggle_gate: gate.clone(),
    };
    let mut runtime = AppRuntime::new(TodoApp::new(), Arc::new(host));
    let handle = runtime.handle();

    handle.deliver(call(&endpoint, "show-todos", json!({})).await).unwrap();
    runtime.turn().await;

    handle.act(TodoAction::Toggle("1".into())).unwrap();
    handle.act(TodoAction::Toggle("1".into())).unwrap();
    runtime.turn().await;
    runtime.turn().await;
    assert_eq!(runtime.controls().pending_count(), 1);

    gate.notify_one();
    runtime.turn().await;
    assert!(runtime.view().row("1").unwrap().completed);
}

#[tokio::test]
async fn test_spawned_runtime_publishes_views() {
    let endpoint = Showcase::default().endpoint().unwrap();
    let runtime = todo_runtime(endpoint.clone());
    let handle = runtime.handle();
    let mut views = runtime.subscribe();
    let task = tokio::spawn(runtime.run());

    handle.deliver(call(&endpoint, "show-todos", json!({})).await).unwrap();
    handle.act(TodoAction::Add("Buy milk".into())).unwrap();

    let view = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        views.wait_for(|v| v.rows.len() == 3 && !v.add.disabled),
    )
    .await
    .expect("runtime did not settle")
    .unwrap()
    .clone();
    assert_eq!(view.rows[2].text, "Buy milk");

    handle.shutdown().unwrap();
    task.await.unwrap();
    assert!(handle.act(TodoAction::Remove("1".into())).is_err());
}
