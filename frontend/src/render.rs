// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Builds the task list from server data and locates the pieces of a row.
use chrono::NaiveDate;
use common::{Task, TaskId};

use crate::action::{ADD_ENDPOINT, CLEAR_ENDPOINT, EditField, FormKind, ListAction};
use crate::dom::{Document, Element, Node};

pub const ADD_FORM_ID: &str = "add-task-form";
pub const TASK_LIST_ID: &str = "task-list";
pub const CLEAR_FORM_ID: &str = "clear-tasks-form";
pub const NO_TASKS_ID: &str = "no-tasks-message";
pub const NOTIFICATIONS_ID: &str = "notification-stack";

pub const NO_DESCRIPTION: &str = "No description provided.";
pub const NO_DEADLINE: &str = "None";

/// The page skeleton: add form, empty list, clear form and notification stack.
pub fn page() -> Document {
    let add_form = Element::new("form")
        .with_attr("id", ADD_FORM_ID)
        .with_attr("action", ADD_ENDPOINT)
        .with_attr("method", "POST")
        .with_attr("data-action", FormKind::AddTask.tag())
        .with_child(
            Element::new("input")
                .with_attr("type", "text")
                .with_attr("name", "title")
                .with_attr("value", ""),
        )
        .with_child(Element::new("textarea").with_attr("name", "description"))
        .with_child(
            Element::new("input")
                .with_attr("type", "datetime-local")
                .with_attr("name", "deadline")
                .with_attr("value", ""),
        )
        .with_child(
            Element::new("button")
                .with_attr("type", "submit")
                .with_text("Add Task"),
        );

    let table = Element::new("table")
        .with_class("task-table")
        .with_child(Element::new("tbody").with_attr("id", TASK_LIST_ID));

    let clear_form = Element::new("form")
        .with_attr("id", CLEAR_FORM_ID)
        .with_attr("action", CLEAR_ENDPOINT)
        .with_attr("method", "POST")
        .with_attr("data-action", FormKind::ClearAll.tag())
        .with_child(
            Element::new("button")
                .with_attr("type", "submit")
                .with_class("btn-danger")
                .with_text("Clear All Tasks"),
        );

    Document::new(
        Element::new("body")
            .with_child(add_form)
            .with_child(table)
            .with_child(
                Element::new("p")
                    .with_attr("id", NO_TASKS_ID)
                    .with_text("No tasks yet."),
            )
            .with_child(clear_form)
            .with_child(Element::new("div").with_attr("id", NOTIFICATIONS_ID)),
    )
}

/// Replaces the whole list with `tasks`, in the order given.
///
/// Returns `false` when the page has no list container.
pub fn render_list(doc: &mut Document, tasks: &[Task], today: NaiveDate) -> bool {
    let Some(list) = doc.by_id_mut(TASK_LIST_ID) else {
        return false;
    };
    let rows = tasks
        .iter()
        .enumerate()
        .flat_map(|(index, task)| {
            let (row, detail) = task_rows(index, task, today);
            [Node::from(row), Node::from(detail)]
        })
        .collect();
    list.replace_children(rows);

    if let Some(message) = doc.by_id_mut(NO_TASKS_ID) {
        message.set_hidden(!tasks.is_empty());
    }
    true
}

/// Empties the list and shows the empty-list message.
pub fn clear_list(doc: &mut Document) -> bool {
    let Some(list) = doc.by_id_mut(TASK_LIST_ID) else {
        return false;
    };
    list.clear_children();
    if let Some(message) = doc.by_id_mut(NO_TASKS_ID) {
        message.set_hidden(false);
    }
    true
}

fn task_rows(index: usize, task: &Task, today: NaiveDate) -> (Element, Element) {
    let id = task.id.to_string();
    let deadline_time = task.deadline_time.as_deref();
    let deadline_date = task.deadline_date.as_deref();

    let mut row = Element::new("tr")
        .with_class("task-row")
        .with_attr("data-task-id", id.clone());
    if let Some(class) = task.deadline_class(today).css_class() {
        row.add_class(class);
    }

    let title = Element::new("td")
        .with_attr("data-label", "Task")
        .with_class("task-title")
        .with_text(task.title.clone())
        .with_child(compact_deadline(deadline_time, deadline_date));

    let status = Element::new("td")
        .with_attr("data-label", "Status")
        .with_class("task-status")
        .with_child(
            Element::new("span")
                .with_class("badge")
                .with_class(task.status.css_class())
                .with_text(task.status.label()),
        );

    let created = Element::new("td")
        .with_attr("data-label", "Created On")
        .with_class("task-created")
        .with_child(time_and_date(&task.created_at_time, &task.created_at_date));

    let deadline = Element::new("td")
        .with_attr("data-label", "Deadline")
        .with_class("task-deadline")
        .with_child(
            Element::new("div")
                .with_class("deadline-display")
                .with_attr("title", "Click to edit deadline")
                .with_child(deadline_fragment(deadline_time, deadline_date)),
        )
        .with_child(
            row_form(task.id, ListAction::UpdateDeadline)
                .with_class("deadline-edit-form")
                .with_hidden(true)
                .with_child(
                    Element::new("input")
                        .with_attr("type", "datetime-local")
                        .with_attr("name", "new_deadline")
                        .with_attr("value", task.deadline_form_value.clone()),
                )
                .with_child(save_button())
                .with_child(cancel_button()),
        );

    let actions = Element::new("td")
        .with_attr("data-label", "Actions")
        .with_class("task-actions")
        .with_child(row_form(task.id, ListAction::ToggleStatus).with_child(
            Element::new("button")
                .with_class("btn-small")
                .with_attr("type", "submit")
                .with_text("Next"),
        ))
        .with_child(row_form(task.id, ListAction::Delete).with_child(
            Element::new("button")
                .with_class("btn-small")
                .with_class("btn-danger")
                .with_attr("type", "submit")
                .with_text("Delete"),
        ));

    row = row
        .with_child(
            Element::new("td")
                .with_attr("data-label", "#")
                .with_text((index + 1).to_string()),
        )
        .with_child(title)
        .with_child(status)
        .with_child(created)
        .with_child(deadline)
        .with_child(actions);

    let description = task.description.as_deref().unwrap_or("");
    let detail = Element::new("tr")
        .with_class("description-row")
        .with_attr("data-detail-for", id)
        .with_child(
            Element::new("td").with_attr("colspan", "6").with_child(
                Element::new("div")
                    .with_class("description-content")
                    .with_child(
                        Element::new("div")
                            .with_class("description-display")
                            .with_child(Element::new("strong").with_text("Description:"))
                            .with_child(
                                Element::new("p")
                                    .with_class("description-text")
                                    .with_text(description_text(description)),
                            )
                            .with_child(
                                Element::new("button")
                                    .with_class("btn-small")
                                    .with_attr("type", "button")
                                    .with_text("Edit"),
                            ),
                    )
                    .with_child(
                        row_form(task.id, ListAction::UpdateDescription)
                            .with_class("description-edit-form")
                            .with_hidden(true)
                            .with_child(
                                Element::new("textarea")
                                    .with_class("description-textarea")
                                    .with_attr("name", "new_description")
                                    .with_text(description),
                            )
                            .with_child(
                                Element::new("div")
                                    .with_child(save_button())
                                    .with_child(cancel_button()),
                            ),
                    ),
            ),
        );

    (row, detail)
}

fn row_form(task_id: TaskId, action: ListAction) -> Element {
    Element::new("form")
        .with_attr("action", action.endpoint(task_id))
        .with_attr("method", "POST")
        .with_attr("data-action", action.tag())
        .with_attr("data-task-id", task_id.to_string())
}

fn save_button() -> Element {
    Element::new("button")
        .with_class("btn-small")
        .with_attr("type", "submit")
        .with_text("Save")
}

fn cancel_button() -> Element {
    Element::new("button")
        .with_class("btn-small")
        .with_class("btn-danger")
        .with_attr("type", "button")
        .with_text("Cancel")
}

fn time_and_date(time: &str, date: &str) -> Element {
    Element::new("div")
        .with_text(time)
        .with_child(Element::new("br"))
        .with_child(
            Element::new("small")
                .with_class("date-secondary")
                .with_text(date),
        )
}

/// Content of `.deadline-display`: the time over the date, or a placeholder.
pub fn deadline_fragment(time: Option<&str>, date: Option<&str>) -> Element {
    match time {
        Some(time) => time_and_date(time, date.unwrap_or("")),
        None => Element::new("span")
            .with_class("deadline-none")
            .with_text(NO_DEADLINE),
    }
}

/// The short deadline label shown under the title.
pub fn compact_deadline(time: Option<&str>, date: Option<&str>) -> Element {
    Element::new("small")
        .with_class("deadline-compact")
        .with_text(compact_deadline_text(time, date))
}

pub fn compact_deadline_text(time: Option<&str>, date: Option<&str>) -> String {
    match (time, date) {
        (Some(time), Some(date)) => format!("Due {date}, {time}"),
        (Some(time), None) => format!("Due {time}"),
        (None, _) => "No deadline".to_string(),
    }
}

pub fn description_text(description: &str) -> &str {
    if description.is_empty() {
        NO_DESCRIPTION
    } else {
        description
    }
}

// --- Row lookups ---

fn is_task_row(e: &Element, id: &str) -> bool {
    e.tag() == "tr" && e.has_class("task-row") && e.attr("data-task-id") == Some(id)
}

fn is_detail_row(e: &Element, id: &str) -> bool {
    e.tag() == "tr" && e.has_class("description-row") && e.attr("data-detail-for") == Some(id)
}

pub fn task_row(doc: &Document, task_id: TaskId) -> Option<&Element> {
    let id = task_id.to_string();
    doc.find(&|e| is_task_row(e, &id))
}

pub fn task_row_mut(doc: &mut Document, task_id: TaskId) -> Option<&mut Element> {
    let id = task_id.to_string();
    doc.find_mut(&|e| is_task_row(e, &id))
}

pub fn detail_row(doc: &Document, task_id: TaskId) -> Option<&Element> {
    let id = task_id.to_string();
    doc.find(&|e| is_detail_row(e, &id))
}

pub fn detail_row_mut(doc: &mut Document, task_id: TaskId) -> Option<&mut Element> {
    let id = task_id.to_string();
    doc.find_mut(&|e| is_detail_row(e, &id))
}

/// Row that holds the display/edit pair of `field`.
pub fn edit_container_mut(doc: &mut Document, task_id: TaskId, field: EditField) -> Option<&mut Element> {
    match field {
        EditField::Deadline => task_row_mut(doc, task_id),
        EditField::Description => detail_row_mut(doc, task_id),
    }
}

/// Class names of the display block and the edit form of `field`.
pub fn edit_classes(field: EditField) -> (&'static str, &'static str) {
    match field {
        EditField::Deadline => ("deadline-display", "deadline-edit-form"),
        EditField::Description => ("description-display", "description-edit-form"),
    }
}

/// Shows either the display block or the edit form of `field`, never both.
///
/// Returns `false` when the row or one of the two halves is gone.
pub fn set_edit_mode(doc: &mut Document, task_id: TaskId, field: EditField, editing: bool) -> bool {
    let (display_class, form_class) = edit_classes(field);
    let Some(container) = edit_container_mut(doc, task_id, field) else {
        return false;
    };
    let Some(display) = container.find_mut(&|e| e.has_class(display_class)) else {
        return false;
    };
    display.set_hidden(editing);
    let Some(form) = container.find_mut(&|e| e.has_class(form_class)) else {
        return false;
    };
    form.set_hidden(!editing);
    true
}

/// Whether the edit form of `field` is currently shown.
pub fn is_editing(doc: &Document, task_id: TaskId, field: EditField) -> Option<bool> {
    let (_, form_class) = edit_classes(field);
    let container = match field {
        EditField::Deadline => task_row(doc, task_id),
        EditField::Description => detail_row(doc, task_id),
    }?;
    container
        .find(&|e| e.has_class(form_class))
        .map(|form| !form.is_hidden())
}
