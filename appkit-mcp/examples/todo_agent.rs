//! Todo app driven over MCP
//!
//! Connects to a running showcase server, mounts the todo app runtime on
//! the connection and plays a few actions, printing the rendered list after
//! each one.
//!
//! Start the server first:
//! ```
//! cargo run --bin appkit-server -- --port 8080
//! ```
//!
//! Then run this client:
//! ```
//! cargo run --example todo_agent
//! ```

use std::sync::Arc;

use appkit_mcp::client::McpClient;
use appkit_mcp::runtime::AppRuntime;
use appkit_mcp::showcase::todo::{TodoAction, TodoApp, TodoView};
use appkit_mcp::Envelope;
use serde_json::json;

#[tokio::main]
async fn main() -> appkit_mcp::Result<()> {
    eprintln!("Connecting to MCP server at http://127.0.0.1:8080/mcp ...");
    let client = McpClient::http("http://127.0.0.1:8080/mcp").await?;

    if let Some(info) = client.server_info() {
        eprintln!(
            "Connected to: {} v{}",
            info.server_info.name, info.server_info.version
        );
    }

    let first = Envelope::from(&client.call_tool("show-todos", json!({})).await?);
    let mut runtime = AppRuntime::new(TodoApp::new(), Arc::new(client));
    let handle = runtime.handle();

    handle.deliver(first)?;
    runtime.turn().await;
    print_view("initial", &runtime.view());

    handle.act(TodoAction::Add("Read the MCP Apps proposal".into()))?;
    // One turn to dispatch, one to settle
    runtime.turn().await;
    runtime.turn().await;
    let view = runtime.view();
    print_view("after add", &view);

    if let Some(row) = view.rows.last() {
        handle.act(TodoAction::Toggle(row.id.clone()))?;
        runtime.turn().await;
        runtime.turn().await;
        print_view("after toggle", &runtime.view());
    }

    eprintln!("\n{}", runtime.model().render_html(&runtime.view())?);
    Ok(())
}

fn print_view(step: &str, view: &TodoView) {
    eprintln!("\n--- {} ---", step);
    for row in &view.rows {
        eprintln!("  [{}] {} ({})", if row.completed { "x" } else { " " }, row.text, row.id);
    }
}
