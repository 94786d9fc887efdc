// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Action tags and the forms that carry them.
//!
//! Every interactive form in the page has a `data-action` attribute holding
//! one tag from a closed set. The dispatcher matches on the parsed tag rather
//! than on the form's target URL.
use std::fmt;
use std::str::FromStr;

use common::TaskId;
use thiserror::Error;

use crate::dom::{Document, Element};

pub const ADD_ENDPOINT: &str = "/add";
pub const CLEAR_ENDPOINT: &str = "/clear";

const ADD_TAG: &str = "add-task";
const CLEAR_TAG: &str = "clear-all";

/// Per-row actions handled by the list container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListAction {
    Delete,
    ToggleStatus,
    UpdateDeadline,
    UpdateDescription,
}

impl ListAction {
    pub const ALL: [ListAction; 4] = [
        ListAction::Delete,
        ListAction::ToggleStatus,
        ListAction::UpdateDeadline,
        ListAction::UpdateDescription,
    ];

    /// Value of the `data-action` attribute.
    pub fn tag(self) -> &'static str {
        match self {
            ListAction::Delete => "delete",
            ListAction::ToggleStatus => "toggle-status",
            ListAction::UpdateDeadline => "update-deadline",
            ListAction::UpdateDescription => "update-description",
        }
    }

    /// Server path the action posts to.
    pub fn endpoint(self, task_id: TaskId) -> String {
        match self {
            ListAction::Delete => format!("/delete/{task_id}"),
            ListAction::ToggleStatus => format!("/toggle/{task_id}"),
            ListAction::UpdateDeadline => format!("/update_deadline/{task_id}"),
            ListAction::UpdateDescription => format!("/update_description/{task_id}"),
        }
    }
}

impl fmt::Display for ListAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A `data-action` value outside the known set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown list action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for ListAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListAction::ALL
            .into_iter()
            .find(|action| action.tag() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// The two editable fields of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Deadline,
    Description,
}

/// Which container a form belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    AddTask,
    ClearAll,
    Row { task_id: TaskId, action: ListAction },
}

impl FormKind {
    pub fn tag(self) -> &'static str {
        match self {
            FormKind::AddTask => ADD_TAG,
            FormKind::ClearAll => CLEAR_TAG,
            FormKind::Row { action, .. } => action.tag(),
        }
    }

    fn from_element(form: &Element) -> Option<Self> {
        match form.attr("data-action")? {
            ADD_TAG => Some(FormKind::AddTask),
            CLEAR_TAG => Some(FormKind::ClearAll),
            tag => {
                let action = tag.parse().ok()?;
                let task_id = form.attr("data-task-id")?.parse().ok()?;
                Some(FormKind::Row { task_id, action })
            }
        }
    }
}

/// A serialized form, ready to be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub kind: FormKind,
    pub target: String,
    pub fields: Vec<(String, String)>,
}

impl Form {
    pub fn clear_all() -> Self {
        Self {
            kind: FormKind::ClearAll,
            target: CLEAR_ENDPOINT.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn row(task_id: TaskId, action: ListAction) -> Self {
        Self {
            kind: FormKind::Row { task_id, action },
            target: action.endpoint(task_id),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn row_target(&self) -> Option<(TaskId, ListAction)> {
        match self.kind {
            FormKind::Row { task_id, action } => Some((task_id, action)),
            FormKind::AddTask | FormKind::ClearAll => None,
        }
    }

    /// Serializes a `<form>` element: its tag, its `action` and every named
    /// `input`/`textarea` below it.
    pub fn read(form: &Element) -> Option<Self> {
        if form.tag() != "form" {
            return None;
        }
        let kind = FormKind::from_element(form)?;
        let target = form.attr("action")?.to_string();
        let fields = form
            .find_all(&|e| matches!(e.tag(), "input" | "textarea") && e.attr("name").is_some())
            .into_iter()
            .filter_map(|control| {
                let name = control.attr("name")?.to_string();
                let value = match control.tag() {
                    "textarea" => control.text_content(),
                    _ => control.attr("value").unwrap_or_default().to_string(),
                };
                Some((name, value))
            })
            .collect();
        Some(Self {
            kind,
            target,
            fields,
        })
    }
}

/// Locates the form of `action` on the row of `task_id`.
pub fn row_form(doc: &Document, task_id: TaskId, action: ListAction) -> Option<&Element> {
    let id = task_id.to_string();
    doc.find(&|e| {
        e.tag() == "form"
            && e.attr("data-action") == Some(action.tag())
            && e.attr("data-task-id") == Some(id.as_str())
    })
}

pub fn row_form_mut(doc: &mut Document, task_id: TaskId, action: ListAction) -> Option<&mut Element> {
    let id = task_id.to_string();
    doc.find_mut(&|e| {
        e.tag() == "form"
            && e.attr("data-action") == Some(action.tag())
            && e.attr("data-task-id") == Some(id.as_str())
    })
}

/// Sets the value of a named control inside `form`, the way typing would.
pub fn set_control_value(form: &mut Element, name: &str, value: &str) -> bool {
    let Some(control) = form.find_mut(&|e| {
        matches!(e.tag(), "input" | "textarea") && e.attr("name") == Some(name)
    }) else {
        return false;
    };
    if control.tag() == "textarea" {
        control.set_text(value);
    } else {
        control.set_attr("value", value);
    }
    true
}

/// Clears every named control of `form`, like `form.reset()` on an empty form.
pub fn reset_form(form: &mut Element) {
    form.for_each_mut(&mut |control| {
        if control.attr("name").is_none() {
            return;
        }
        match control.tag() {
            "textarea" => control.clear_children(),
            "input" => control.set_attr("value", ""),
            _ => {}
        }
    });
}
