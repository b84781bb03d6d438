//! Todo app model
//!
//! Mirrors the server's list, locks the control a user touched while its
//! call is in flight, and renders the list to escaped markup.

use async_trait::async_trait;
use minijinja::{context, AutoEscape, Environment};
use serde::Serialize;
use serde_json::{json, Value};

use super::{Todo, TodoList};
use crate::apps::AppInfo;
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::runtime::{AppModel, Control, ControlBoard, ControlId, Dispatch, Host};

/// Shown in place of the list when it is empty
pub const EMPTY_MESSAGE: &str = "No tasks yet. Add one above!";

const TEMPLATE_NAME: &str = "todo-list.html";

const TEMPLATE: &str = r#"<ul id="todo-list">
{%- for row in view.rows %}
  <li class="todo-item{% if row.completed %} completed{% endif %}" data-id="{{ row.id }}">
    <input type="checkbox" class="todo-checkbox"{% if row.completed %} checked{% endif %}{% if row.toggle.disabled %} disabled{% endif %} />
    <span class="todo-text">{{ row.text }}</span>
    <button class="delete-btn"{% if row.delete.disabled %} disabled{% endif %}>{{ row.delete.label }}</button>
  </li>
{%- else %}
  <li class="empty-state">{{ empty_message }}</li>
{%- endfor %}
</ul>
<button id="add-btn"{% if view.add.disabled %} disabled{% endif %}>{{ view.add.label }}</button>
"#;

/// A user gesture on the todo list. Item actions carry the item's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoAction {
    Add(String),
    Toggle(String),
    Remove(String),
}

/// One rendered list row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodoRow {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub toggle: Control,
    pub delete: Control,
}

/// The whole rendered todo app
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TodoView {
    pub rows: Vec<TodoRow>,
    pub add: Control,
}

impl TodoView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find a row by item id
    pub fn row(&self, id: &str) -> Option<&TodoRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn texts(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.text.as_str()).collect()
    }
}

fn add_control() -> ControlId {
    ControlId::new("add")
}

fn toggle_control(id: &str) -> ControlId {
    ControlId::for_item("toggle", id)
}

fn delete_control(id: &str) -> ControlId {
    ControlId::for_item("delete", id)
}

/// Client side of the todo family
pub struct TodoApp {
    markup: Environment<'static>,
}

impl TodoApp {
    pub fn new() -> Self {
        let mut markup = Environment::new();
        markup.set_auto_escape_callback(|_: &str| AutoEscape::Html);
        // The template is a compile-time constant; a syntax error surfaces on render.
        if let Err(e) = markup.add_template(TEMPLATE_NAME, TEMPLATE) {
            tracing::error!(error = %e, "todo template failed to compile");
        }
        Self { markup }
    }

    /// Render `view` to HTML with all item text escaped
    pub fn render_html(&self, view: &TodoView) -> Result<String> {
        let template = self.markup.get_template(TEMPLATE_NAME)?;
        Ok(template.render(context! { view => view, empty_message => EMPTY_MESSAGE })?)
    }
}

impl Default for TodoApp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppModel for TodoApp {
    type State = Vec<Todo>;
    type Action = TodoAction;
    type View = TodoView;

    fn info(&self) -> AppInfo {
        AppInfo::new("Todo App", "1.0.0")
    }

    /// Accepts `{ "todos": [...] }` or a bare array
    fn parse(&self, envelope: &Envelope) -> Result<Vec<Todo>> {
        match envelope.payload()? {
            Value::Array(items) => Ok(serde_json::from_value(Value::Array(items))?),
            object @ Value::Object(_) => Ok(serde_json::from_value::<TodoList>(object)?.todos),
            other => Err(Error::Parse(format!("expected a todo list, got {}", other))),
        }
    }

    fn plan(&self, _state: &Vec<Todo>, action: TodoAction) -> Option<Dispatch> {
        let dispatch = match action {
            TodoAction::Add(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                Dispatch {
                    control: add_control(),
                    pending_label: "Adding...".into(),
                    tool: "add-todo".into(),
                    arguments: json!({ "text": text }),
                }
            }
            TodoAction::Toggle(id) => Dispatch {
                control: toggle_control(&id),
                pending_label: String::new(),
                tool: "toggle-todo".into(),
                arguments: json!({ "id": id }),
            },
            TodoAction::Remove(id) => Dispatch {
                control: delete_control(&id),
                pending_label: "...".into(),
                tool: "remove-todo".into(),
                arguments: json!({ "id": id }),
            },
        };
        Some(dispatch)
    }

    async fn present(&mut self, todos: &Vec<Todo>, controls: &ControlBoard, _host: &dyn Host) -> TodoView {
        TodoView {
            rows: todos
                .iter()
                .map(|todo| TodoRow {
                    id: todo.id.clone(),
                    text: todo.text.clone(),
                    completed: todo.completed,
                    toggle: controls.control(toggle_control(&todo.id), ""),
                    delete: controls.control(delete_control(&todo.id), "Delete"),
                })
                .collect(),
            add: controls.control(add_control(), "Add"),
        }
    }
}
