// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier the task server assigns to a task.
pub type TaskId = i64;

/// Message used whenever a background request never produced a usable reply.
pub const NETWORK_ERROR_MESSAGE: &str = "A network error occurred.";

/// Date format the server uses for `created_at_date` and `deadline_date`.
pub const DISPLAY_DATE_FORMAT: &str = "%d %b %Y";

/// Lifecycle label of a task.
///
/// The server advances it on every toggle: `Pending` -> `Working` -> `Done`,
/// and `Done` wraps back to `Pending`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    Working,
    Done,
}

impl TaskStatus {
    /// The label shown inside the status badge.
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Working => "Working",
            TaskStatus::Done => "Done",
        }
    }

    /// CSS class of the badge, the lowercase label.
    pub fn css_class(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Working => "working",
            TaskStatus::Done => "done",
        }
    }

    /// Status the server moves to on the next toggle.
    pub fn next(self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::Working,
            TaskStatus::Working => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Pending,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a status label is not one of the known lifecycle states.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown task status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(TaskStatus::Pending),
            "Working" => Ok(TaskStatus::Working),
            "Done" => Ok(TaskStatus::Done),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Represents a task as the server sends it in a list reply.
///
/// Every date and time is already formatted by the server in its own
/// timezone. The client only displays them and compares the deadline day
/// against the `today` the server sends along.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    pub status: TaskStatus,

    pub created_at_time: String,

    pub created_at_date: String,

    #[serde(default)]
    pub deadline_time: Option<String>,

    #[serde(default)]
    pub deadline_date: Option<String>,

    // Value for a `datetime-local` input, empty when there is no deadline.
    #[serde(default)]
    pub deadline_form_value: String,
}

impl Task {
    pub fn deadline_class(&self, today: NaiveDate) -> DeadlineClass {
        DeadlineClass::classify(self.deadline_date.as_deref(), today)
    }
}

/// Derived display class of a row, computed client-side from the deadline day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineClass {
    /// No deadline, or one the client cannot read.
    None,
    Upcoming,
    DueToday,
    Overdue,
}

impl DeadlineClass {
    /// Classifies a server-formatted deadline day against `today`.
    ///
    /// The server's display format (`16 Oct 2026`) is tried first, then ISO
    /// (`2026-10-16`).
    pub fn classify(deadline_date: Option<&str>, today: NaiveDate) -> Self {
        let Some(day) = deadline_date.and_then(parse_day) else {
            return DeadlineClass::None;
        };
        if day < today {
            DeadlineClass::Overdue
        } else if day == today {
            DeadlineClass::DueToday
        } else {
            DeadlineClass::Upcoming
        }
    }

    /// Row class for this state, if any.
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            DeadlineClass::Overdue => Some("overdue"),
            DeadlineClass::DueToday => Some("due-today"),
            DeadlineClass::None | DeadlineClass::Upcoming => None,
        }
    }
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DISPLAY_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Envelope of every background reply: `{success, message, ...fields}`.
///
/// The action-specific fields are flattened into `data`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ActionResult<T> {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(flatten)]
    pub data: T,

    /// Set when the server reported success but its fields could not be
    /// decoded; `data` is then the default.
    #[serde(skip)]
    pub malformed: bool,
}

impl<T: Default> ActionResult<T> {
    /// The result handed to callers when the request itself failed.
    pub fn network_failure() -> Self {
        Self {
            success: false,
            message: Some(NETWORK_ERROR_MESSAGE.to_string()),
            data: T::default(),
            malformed: false,
        }
    }

    /// A successful reply whose action-specific fields did not decode.
    pub fn malformed(message: Option<String>) -> Self {
        Self {
            success: true,
            message,
            data: T::default(),
            malformed: true,
        }
    }
}

impl<T> ActionResult<T> {
    /// The server's message, or `fallback` when it sent none (or an empty one).
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message,
            _ => fallback,
        }
    }
}

/// Reply fields of the add-task endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AddTaskReply {
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,

    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// Reply fields of the per-row endpoints (toggle, delete, deadline, description).
///
/// Each endpoint fills only its own fields; the rest stay `None`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RowReply {
    // Kept as the raw label so an unexpected value can be reported instead of
    // failing the whole reply.
    #[serde(default)]
    pub new_status: Option<String>,

    #[serde(default)]
    pub deadline_time: Option<String>,

    #[serde(default)]
    pub deadline_date: Option<String>,

    #[serde(default)]
    pub new_description: Option<String>,
}

/// Reply of endpoints that send nothing beyond `{success, message}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NoReply {}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_cycle_wraps() {
        assert_eq!(TaskStatus::Pending.next(), TaskStatus::Working);
        assert_eq!(TaskStatus::Working.next(), TaskStatus::Done);
        assert_eq!(TaskStatus::Done.next(), TaskStatus::Pending);
    }

    #[test]
    fn test_status_parses_labels_only() {
        assert_eq!("Done".parse::<TaskStatus>(), Ok(TaskStatus::Done));
        assert!("done".parse::<TaskStatus>().is_err());
        assert_eq!(TaskStatus::Working.css_class(), "working");
    }

    #[test]
    fn test_deadline_classification() {
        let today = day(2026, 10, 16);

        assert_eq!(
            DeadlineClass::classify(Some("15 Oct 2026"), today),
            DeadlineClass::Overdue
        );
        assert_eq!(
            DeadlineClass::classify(Some("16 Oct 2026"), today),
            DeadlineClass::DueToday
        );
        assert_eq!(
            DeadlineClass::classify(Some("2026-10-17"), today),
            DeadlineClass::Upcoming
        );
        assert_eq!(DeadlineClass::classify(None, today), DeadlineClass::None);
        assert_eq!(
            DeadlineClass::classify(Some("someday"), today),
            DeadlineClass::None
        );
    }

    #[test]
    fn test_deadline_css_classes() {
        assert_eq!(DeadlineClass::Overdue.css_class(), Some("overdue"));
        assert_eq!(DeadlineClass::DueToday.css_class(), Some("due-today"));
        assert_eq!(DeadlineClass::Upcoming.css_class(), None);
        assert_eq!(DeadlineClass::None.css_class(), None);
    }

    #[test]
    fn test_add_reply_deserializes_with_flattened_fields() {
        let body = r#"{
            "success": true,
            "message": "Task added successfully!",
            "today": "2026-10-16",
            "tasks": [{
                "id": 7,
                "title": "Write report",
                "description": null,
                "status": "Pending",
                "created_at_time": "09:30 AM",
                "created_at_date": "16 Oct 2026",
                "deadline_time": null,
                "deadline_date": null,
                "deadline_form_value": ""
            }]
        }"#;

        let result: ActionResult<AddTaskReply> = serde_json::from_str(body).unwrap();

        assert!(result.success);
        assert_eq!(result.data.today, Some(day(2026, 10, 16)));
        let tasks = result.data.tasks.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::Pending);
        assert_eq!(tasks[0].deadline_class(day(2026, 10, 16)), DeadlineClass::None);
    }

    #[test]
    fn test_unknown_status_in_task_list_fails_typed_decode() {
        let body = r#"{
            "success": true,
            "today": "2026-10-16",
            "tasks": [{"id": 1, "title": "x", "description": null, "status": "Archived",
                       "created_at_time": "09:30 AM", "created_at_date": "16 Oct 2026",
                       "deadline_time": null, "deadline_date": null, "deadline_form_value": ""}]
        }"#;

        assert!(serde_json::from_str::<ActionResult<AddTaskReply>>(body).is_err());
        let err = "Archived".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown task status 'Archived'");
    }

    #[test]
    fn test_failure_reply_without_message_uses_fallback() {
        let result: ActionResult<RowReply> = serde_json::from_str(r#"{"success": false}"#).unwrap();

        assert!(!result.success);
        assert_eq!(result.message_or("An error occurred."), "An error occurred.");
        assert_eq!(result.data, RowReply::default());
    }

    #[test]
    fn test_network_failure_result() {
        let result = ActionResult::<NoReply>::network_failure();

        assert!(!result.success);
        assert_eq!(result.message_or("unused"), NETWORK_ERROR_MESSAGE);
    }
}
