//! Per-control optimistic locking
//!
//! A control that triggered a tool call stays disabled, showing its pending
//! label, until that call settles. Other controls are unaffected.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// Identifier of an interactive element. Item-bound controls embed the
/// item's domain id rather than its position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ControlId(String);

impl ControlId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Control `name` on the item with domain id `item_id`
    pub fn for_item(name: &str, item_id: &str) -> Self {
        Self(format!("{}:{}", name, item_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rendered state of one control
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    pub id: ControlId,
    pub label: String,
    pub disabled: bool,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            id: ControlId::new(""),
            label: String::new(),
            disabled: false,
        }
    }
}

/// Controls with a tool call in flight
#[derive(Debug, Clone, Default)]
pub struct ControlBoard {
    pending: HashMap<ControlId, String>,
}

impl ControlBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, id: &ControlId) -> bool {
        self.pending.contains_key(id)
    }

    /// Number of controls currently in flight
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Render a control: idle with `idle_label`, or disabled with its
    /// pending label while a call is in flight.
    pub fn control(&self, id: ControlId, idle_label: impl Into<String>) -> Control {
        match self.pending.get(&id) {
            Some(pending_label) => Control {
                label: pending_label.clone(),
                id,
                disabled: true,
            },
            None => Control {
                id,
                label: idle_label.into(),
                disabled: false,
            },
        }
    }

    /// Lock `id`. Returns `false` if it is already locked.
    pub(crate) fn begin(&mut self, id: ControlId, pending_label: String) -> bool {
        if self.pending.contains_key(&id) {
            return false;
        }
        self.pending.insert(id, pending_label);
        true
    }

    /// Release `id`; returns whether it was locked
    pub(crate) fn settle(&mut self, id: &ControlId) -> bool {
        self.pending.remove(id).is_some()
    }
}
