//! Todo list tools
//!
//! Every tool answers with the full list: the JSON array as the text block
//! and `{ "todos": [...] }` as `structuredContent`. The list lives in a
//! [`TodoStore`] for the life of the process.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Bundles;
use crate::apps::{ui_uri, UiResourceRegistry};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::store::{IdGenerator, StateStore};
use crate::tools::{NoArguments, ToolDescriptor, ToolRegistry};

pub mod app;

pub use app::{TodoAction, TodoApp, TodoRow, TodoView, EMPTY_MESSAGE};

/// Resource URI of the todo bundle
pub const RESOURCE_URI: &str = "ui://todo-app/mcp-app.html";

const EMBEDDED_BUNDLE: &str = include_str!("../../../assets/todo-app.html");

/// A single todo entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Todo {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl Todo {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed: false,
        }
    }
}

/// `structuredContent` of every todo tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TodoList {
    pub todos: Vec<Todo>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddTodo {
    /// The todo text
    #[schemars(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TodoRef {
    /// The todo ID
    pub id: String,
}

/// Items present before the first mutation
pub fn seed() -> Vec<Todo> {
    vec![
        Todo::new("1", "Try out MCP Apps"),
        Todo::new("2", "Test on Claude.ai"),
    ]
}

/// The todo list and its id source
#[derive(Debug)]
pub struct TodoStore {
    items: StateStore<Todo>,
    ids: IdGenerator,
}

impl TodoStore {
    /// A store holding [`seed`] until first mutated
    pub fn new() -> Self {
        Self::with_seed(seed())
    }

    pub fn with_seed(seed: Vec<Todo>) -> Self {
        Self {
            items: StateStore::new(seed),
            ids: IdGenerator::default(),
        }
    }

    pub fn list(&self) -> Vec<Todo> {
        self.items.snapshot()
    }

    /// Append a new item with a fresh id
    pub fn add(&self, text: impl Into<String>) -> Vec<Todo> {
        let todo = Todo::new(self.ids.next_id(), text);
        tracing::debug!(id = %todo.id, "adding todo");
        self.items.mutate(|items| items.push(todo)).1
    }

    /// Flip `completed` on the item with `id`. Unknown ids are ignored.
    pub fn toggle(&self, id: &str) -> Vec<Todo> {
        let (found, items) = self.items.mutate(|items| match items.iter_mut().find(|t| t.id == id) {
            Some(todo) => {
                todo.completed = !todo.completed;
                true
            }
            None => false,
        });
        if !found {
            tracing::debug!(id, "toggle of unknown todo ignored");
        }
        items
    }

    /// Remove every item with `id`
    pub fn remove(&self, id: &str) -> Vec<Todo> {
        let (removed, items) = self.items.mutate(|items| {
            let before = items.len();
            items.retain(|t| t.id != id);
            before - items.len()
        });
        tracing::debug!(id, removed, "removed todo");
        items
    }

    /// Forget all changes; the seed set returns on the next access
    pub fn reset(&self) {
        self.items.reset();
    }
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Envelope carrying the full list
pub fn snapshot_envelope(todos: Vec<Todo>) -> Result<Envelope> {
    let text = serde_json::to_string(&todos)?;
    let structured = serde_json::to_value(TodoList { todos })?;
    Ok(Envelope::text(text).with_structured(structured))
}

/// Register the todo tools and bundle
pub fn register(
    tools: &mut ToolRegistry,
    resources: &mut UiResourceRegistry,
    store: Arc<TodoStore>,
    bundles: &Bundles,
) -> Result<()> {
    let uri = ui_uri("todo-app", "mcp-app.html")?;

    resources.register(
        bundles
            .resource(uri.clone(), "todo-app", EMBEDDED_BUNDLE)
            .with_description("Interactive todo list"),
    )?;

    let s = store.clone();
    tools.register(
        ToolDescriptor::new("show-todos", "Shows the current todo list")
            .with_title("Show Todos")
            .with_output::<TodoList>()
            .with_ui(uri.clone()),
        move |_: NoArguments| {
            let store = s.clone();
            async move { snapshot_envelope(store.list()) }
        },
    )?;

    let s = store.clone();
    tools.register(
        ToolDescriptor::new("add-todo", "Adds a new todo item")
            .with_output::<TodoList>()
            .with_ui(uri.clone()),
        move |input: AddTodo| {
            let store = s.clone();
            async move { snapshot_envelope(store.add(input.text)) }
        },
    )?;

    let s = store.clone();
    tools.register(
        ToolDescriptor::new("toggle-todo", "Toggles completion status of a todo")
            .with_output::<TodoList>()
            .with_ui(uri.clone()),
        move |input: TodoRef| {
            let store = s.clone();
            async move { snapshot_envelope(store.toggle(&input.id)) }
        },
    )?;

    tools.register(
        ToolDescriptor::new("remove-todo", "Removes a todo item")
            .with_output::<TodoList>()
            .with_ui(uri),
        move |input: TodoRef| {
            let store = store.clone();
            async move { snapshot_envelope(store.remove(&input.id)) }
        },
    )?;

    Ok(())
}
