// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! The view synchronizer: posts forms in the background and patches the
//! list with what the server confirmed.
use std::collections::HashSet;
use std::time::Duration;

use chrono::NaiveDate;
use common::{ActionResult, AddTaskReply, DeadlineClass, NoReply, RowReply, Task, TaskId, TaskStatus};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::action::{self, EditField, Form, ListAction};
use crate::config::Config;
use crate::dom::{Element, NodeKey, SharedDocument};
use crate::notify::{NotificationKind, Notifier};
use crate::render::{self, ADD_FORM_ID, CLEAR_FORM_ID};
use crate::timer;
use crate::transport::Transport;

pub const GENERIC_FAILURE: &str = "An error occurred.";
pub const CLEAR_CONFIRMATION: &str =
    "Are you sure you want to delete all tasks? This action cannot be undone.";
pub const ROW_BUSY: &str = "Another action on this task is still in progress.";

/// The browser-side collaborators the synchronizer cannot model itself.
pub trait Host: Send + Sync {
    /// Asks the user a yes/no question, like `window.confirm`.
    fn confirm(&self, message: &str) -> bool;

    /// Throws the current view away and loads the page again.
    fn reload(&self);
}

/// How a submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The server confirmed and the page was patched.
    Patched,
    /// The reply could not be applied in place; a full reload was requested.
    Reloaded,
    /// The server (or the network) reported a failure; nothing was changed.
    Failed,
    /// The server confirmed, but the row was no longer on the page.
    Missing,
    /// The user declined the confirmation; nothing was sent.
    Cancelled,
    /// Another action on the same row was still in flight; nothing was sent.
    Busy,
    /// No form was found to submit.
    Ignored,
}

pub struct ViewSynchronizer<T, H> {
    config: Config,
    transport: T,
    host: H,
    document: SharedDocument,
    notifier: Notifier,
    today: Mutex<Option<NaiveDate>>,
    in_flight: Mutex<HashSet<TaskId>>,
}

/// Releases a row when its submission finishes, however it finishes.
struct RowGuard<'a> {
    in_flight: &'a Mutex<HashSet<TaskId>>,
    task_id: TaskId,
}

impl Drop for RowGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.task_id);
    }
}

impl<T: Transport, H: Host> ViewSynchronizer<T, H> {
    /// Wires the synchronizer to a page. This is the only setup step; the
    /// `on_*_submit` methods are the page's submit listeners.
    pub fn attach(config: Config, transport: T, host: H, document: SharedDocument) -> Self {
        info!("Attaching view synchronizer to {}", config.base_url);
        let notifier = Notifier::new(document.clone(), &config);
        Self {
            config,
            transport,
            host,
            document,
            notifier,
            today: Mutex::new(None),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn document(&self) -> SharedDocument {
        self.document.clone()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The server's current day, used to classify deadlines edited in place.
    pub fn set_today(&self, today: NaiveDate) {
        *self.today.lock() = Some(today);
    }

    pub fn today(&self) -> Option<NaiveDate> {
        *self.today.lock()
    }

    pub fn notify(&self, message: &str, kind: NotificationKind) {
        self.notifier.notify(message, kind);
    }

    /// Re-renders the whole list from server data.
    pub fn render_list(&self, tasks: &[Task], today: NaiveDate) -> bool {
        self.set_today(today);
        render::render_list(&mut self.document.lock(), tasks, today)
    }

    // --- Form entry points ---

    /// Submit listener of the add form.
    pub async fn on_add_submit(&self) -> Outcome {
        let Some(form) = self.read_form_by_id(ADD_FORM_ID) else {
            warn!("Add form not found on the page.");
            return Outcome::Ignored;
        };
        let result = self.submit_in_background::<AddTaskReply>(&form).await;
        self.handle_add_task(result)
    }

    /// Submit listener of the list container, for the form of `list_action`
    /// on the row of `task_id`.
    pub async fn on_list_submit(&self, task_id: TaskId, list_action: ListAction) -> Outcome {
        let form = {
            let doc = self.document.lock();
            action::row_form(&doc, task_id, list_action).and_then(Form::read)
        };
        let Some(form) = form else {
            debug!("No {} form for task {} on the page.", list_action, task_id);
            return Outcome::Ignored;
        };
        self.submit_list_action(form).await
    }

    /// Submit listener of the clear form. Nothing is sent unless the user
    /// confirms.
    pub async fn on_clear_submit(&self) -> Outcome {
        if !self.host.confirm(CLEAR_CONFIRMATION) {
            info!("Clearing all tasks was cancelled by the user.");
            return Outcome::Cancelled;
        }
        let form = self
            .read_form_by_id(CLEAR_FORM_ID)
            .unwrap_or_else(Form::clear_all);
        let result = self.submit_in_background::<NoReply>(&form).await;
        self.handle_clear_all(result)
    }

    /// Posts a row form, refusing it while the same row has one in flight.
    pub async fn submit_list_action(&self, form: Form) -> Outcome {
        let Some((task_id, action)) = form.row_target() else {
            warn!("Form for {} is not a row form.", form.target);
            return Outcome::Ignored;
        };
        let Some(_guard) = self.claim_row(task_id) else {
            info!("Refusing {} on task {}: another action is in flight.", action, task_id);
            self.notify(ROW_BUSY, NotificationKind::Info);
            return Outcome::Busy;
        };
        let result = self.submit_in_background::<RowReply>(&form).await;
        self.handle_list_action(&form, result)
    }

    fn claim_row(&self, task_id: TaskId) -> Option<RowGuard<'_>> {
        if !self.in_flight.lock().insert(task_id) {
            return None;
        }
        Some(RowGuard {
            in_flight: &self.in_flight,
            task_id,
        })
    }

    fn read_form_by_id(&self, id: &str) -> Option<Form> {
        let doc = self.document.lock();
        doc.by_id(id).and_then(Form::read)
    }

    // --- Background submission ---

    /// Posts `form` and parses the reply. Never fails: any transport or
    /// decoding problem becomes the generic network failure result.
    pub async fn submit_in_background<R>(&self, form: &Form) -> ActionResult<R>
    where
        R: DeserializeOwned + Default,
    {
        debug!("Submitting {} to {}", form.kind.tag(), form.target);
        let body = match self.transport.post_form(&form.target, &form.fields).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Form submission error: {}", e);
                return ActionResult::network_failure();
            }
        };
        let envelope: ActionResult<Map<String, Value>> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Malformed reply from {}: {}", form.target, e);
                return ActionResult::network_failure();
            }
        };
        let ActionResult {
            success,
            message,
            data,
            ..
        } = envelope;
        match serde_json::from_value(Value::Object(data)) {
            Ok(data) => ActionResult {
                success,
                message,
                data,
                malformed: false,
            },
            Err(e) if success => {
                warn!("Unexpected reply fields from {}: {}", form.target, e);
                ActionResult::malformed(message)
            }
            Err(e) => {
                debug!("Ignoring reply fields of a failed {}: {}", form.target, e);
                ActionResult {
                    success,
                    message,
                    data: R::default(),
                    malformed: false,
                }
            }
        }
    }

    // --- Reply handlers ---

    pub fn handle_add_task(&self, result: ActionResult<AddTaskReply>) -> Outcome {
        if !result.success {
            self.notify(result.message_or(GENERIC_FAILURE), NotificationKind::Danger);
            return Outcome::Failed;
        }
        self.notify(result.message_or("Task added."), NotificationKind::Success);
        if result.malformed {
            self.host.reload();
            return Outcome::Reloaded;
        }

        let (Some(tasks), Some(today)) = (result.data.tasks, result.data.today) else {
            warn!("Add reply is missing the task list, reloading.");
            self.host.reload();
            return Outcome::Reloaded;
        };
        self.set_today(today);

        let mut doc = self.document.lock();
        if !render::render_list(&mut doc, &tasks, today) {
            drop(doc);
            error!("Task list container not found, reloading.");
            self.host.reload();
            return Outcome::Reloaded;
        }
        if let Some(add_form) = doc.by_id_mut(ADD_FORM_ID) {
            action::reset_form(add_form);
        }
        info!("Rendered {} tasks after add.", tasks.len());
        Outcome::Patched
    }

    pub fn handle_list_action(&self, form: &Form, result: ActionResult<RowReply>) -> Outcome {
        let Some((task_id, action)) = form.row_target() else {
            return Outcome::Ignored;
        };
        if !result.success {
            self.notify(result.message_or(GENERIC_FAILURE), NotificationKind::Danger);
            return Outcome::Failed;
        }
        self.notify(result.message_or("Done."), NotificationKind::Success);
        if result.malformed {
            self.host.reload();
            return Outcome::Reloaded;
        }

        let outcome = match action {
            ListAction::Delete => self.patch_delete(task_id),
            ListAction::ToggleStatus => self.patch_status(task_id, result.data.new_status.as_deref()),
            ListAction::UpdateDeadline => self.patch_deadline(
                task_id,
                result.data.deadline_time.as_deref(),
                result.data.deadline_date.as_deref(),
            ),
            ListAction::UpdateDescription => {
                self.patch_description(task_id, result.data.new_description.as_deref().unwrap_or(""))
            }
        };
        debug!("{} on task {} -> {:?}", action, task_id, outcome);
        outcome
    }

    pub fn handle_clear_all(&self, result: ActionResult<NoReply>) -> Outcome {
        if !result.success {
            self.notify(result.message_or(GENERIC_FAILURE), NotificationKind::Danger);
            return Outcome::Failed;
        }
        let cleared = render::clear_list(&mut self.document.lock());
        if !cleared {
            error!("Task list container not found, reloading.");
            self.host.reload();
            return Outcome::Reloaded;
        }
        self.notify(
            result.message_or("All tasks have been cleared."),
            NotificationKind::Info,
        );
        Outcome::Patched
    }

    // --- Patches ---

    fn patch_delete(&self, task_id: TaskId) -> Outcome {
        let keys: Vec<NodeKey> = {
            let mut doc = self.document.lock();
            let Some(row) = render::task_row_mut(&mut doc, task_id) else {
                drop(doc);
                warn!("Deleted task {} has no row, reloading.", task_id);
                self.host.reload();
                return Outcome::Reloaded;
            };
            fade(row, self.config.fade_duration);
            let mut keys = vec![row.key()];
            if let Some(detail) = render::detail_row_mut(&mut doc, task_id) {
                fade(detail, self.config.fade_duration);
                keys.push(detail.key());
            }
            keys
        };

        let document = self.document.clone();
        timer::after(self.config.fade_duration, move || {
            let mut doc = document.lock();
            for key in keys {
                doc.remove(key);
            }
        });
        Outcome::Patched
    }

    fn patch_status(&self, task_id: TaskId, new_status: Option<&str>) -> Outcome {
        let Some(status) = new_status.and_then(|s| s.parse::<TaskStatus>().ok()) else {
            warn!("Toggle reply for task {} has no usable status: {:?}", task_id, new_status);
            self.host.reload();
            return Outcome::Reloaded;
        };

        let mut doc = self.document.lock();
        let Some(badge) = render::task_row_mut(&mut doc, task_id)
            .and_then(|row| row.find_mut(&|e| e.has_class("badge")))
        else {
            return Outcome::Missing;
        };
        badge.set_text(status.label());
        badge.set_class_name(&format!("badge {}", status.css_class()));
        Outcome::Patched
    }

    fn patch_deadline(&self, task_id: TaskId, time: Option<&str>, date: Option<&str>) -> Outcome {
        let today = self.today();
        let mut doc = self.document.lock();
        let Some(row) = render::task_row_mut(&mut doc, task_id) else {
            return Outcome::Missing;
        };

        if let Some(display) = row.find_mut(&|e| e.has_class("deadline-display")) {
            display.replace_children(vec![render::deadline_fragment(time, date).into()]);
        }
        if let Some(compact) = row.find_mut(&|e| e.has_class("deadline-compact")) {
            compact.set_text(render::compact_deadline_text(time, date));
        }
        if time.is_none() {
            if let Some(form) = row.find_mut(&|e| e.has_class("deadline-edit-form")) {
                action::set_control_value(form, "new_deadline", "");
            }
        }
        if let Some(today) = today {
            row.remove_class("overdue");
            row.remove_class("due-today");
            let class = DeadlineClass::classify(time.and(date), today);
            if let Some(class) = class.css_class() {
                row.add_class(class);
            }
        }

        render::set_edit_mode(&mut doc, task_id, EditField::Deadline, false);
        Outcome::Patched
    }

    fn patch_description(&self, task_id: TaskId, description: &str) -> Outcome {
        let mut doc = self.document.lock();
        let Some(detail) = render::detail_row_mut(&mut doc, task_id) else {
            return Outcome::Missing;
        };

        if let Some(text) = detail.find_mut(&|e| e.has_class("description-text")) {
            text.set_text(render::description_text(description));
        }
        if let Some(form) = detail.find_mut(&|e| e.has_class("description-edit-form")) {
            action::set_control_value(form, "new_description", description);
        }

        render::set_edit_mode(&mut doc, task_id, EditField::Description, false);
        Outcome::Patched
    }

    // --- Edit mode ---

    /// Flips `field` of a row between display and edit. No request is made.
    pub fn toggle_edit(&self, task_id: TaskId, field: EditField) -> bool {
        let mut doc = self.document.lock();
        let Some(editing) = render::is_editing(&doc, task_id, field) else {
            return false;
        };
        render::set_edit_mode(&mut doc, task_id, field, !editing)
    }

    pub fn begin_edit(&self, task_id: TaskId, field: EditField) -> bool {
        render::set_edit_mode(&mut self.document.lock(), task_id, field, true)
    }

    /// Leaves edit mode without sending anything.
    pub fn cancel_edit(&self, task_id: TaskId, field: EditField) -> bool {
        render::set_edit_mode(&mut self.document.lock(), task_id, field, false)
    }

    // --- Typing into forms ---

    pub fn set_add_field(&self, name: &str, value: &str) -> bool {
        let mut doc = self.document.lock();
        doc.by_id_mut(ADD_FORM_ID)
            .is_some_and(|form| action::set_control_value(form, name, value))
    }

    pub fn set_row_field(&self, task_id: TaskId, list_action: ListAction, name: &str, value: &str) -> bool {
        let mut doc = self.document.lock();
        action::row_form_mut(&mut doc, task_id, list_action)
            .is_some_and(|form| action::set_control_value(form, name, value))
    }
}

fn fade(element: &mut Element, duration: Duration) {
    element.add_class("fading");
    element.set_attr(
        "style",
        format!("transition: opacity {}ms ease; opacity: 0", duration.as_millis()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tokio::sync::Notify;
    use tokio::time::{Duration, sleep};

    use crate::dom::Document;
    use crate::notify::visible_notifications;
    use crate::render::{TASK_LIST_ID, detail_row, is_editing, page, task_row};
    use crate::transport::TransportError;

    /// Replays canned replies in order and records every request.
    #[derive(Default)]
    struct FakeTransport {
        replies: Mutex<VecDeque<Option<String>>>,
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeTransport {
        fn replying(replies: Vec<Value>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(|v| Some(v.to_string())).collect()),
                ..Self::default()
            }
        }

        fn raw(body: &str) -> Self {
            Self {
                replies: Mutex::new(VecDeque::from([Some(body.to_string())])),
                ..Self::default()
            }
        }

        fn unreachable() -> Self {
            Self {
                replies: Mutex::new(VecDeque::from([None])),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn post_form(
            &self,
            target: &str,
            fields: &[(String, String)],
        ) -> Result<String, TransportError> {
            self.calls.lock().push((target.to_string(), fields.to_vec()));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let reply = self.replies.lock().pop_front().flatten();
            reply.ok_or_else(|| TransportError::InvalidTarget {
                target: target.to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct TestHost {
        accept: bool,
        confirms: AtomicUsize,
        reloads: AtomicUsize,
    }

    impl Host for TestHost {
        fn confirm(&self, _message: &str) -> bool {
            self.confirms.fetch_add(1, Ordering::SeqCst);
            self.accept
        }

        fn reload(&self) {
            self.reloads.fetch_add(1, Ordering::SeqCst);
        }
    }

    type TestSync = ViewSynchronizer<FakeTransport, TestHost>;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn task(id: TaskId, title: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: Some(format!("about {title}")),
            status: TaskStatus::Pending,
            created_at_time: "09:00 AM".to_string(),
            created_at_date: "01 Oct 2026".to_string(),
            deadline_time: None,
            deadline_date: None,
            deadline_form_value: String::new(),
        }
    }

    fn synchronizer(transport: FakeTransport) -> TestSync {
        synchronizer_with_host(transport, TestHost::default())
    }

    fn synchronizer_with_host(transport: FakeTransport, host: TestHost) -> TestSync {
        ViewSynchronizer::attach(Config::default(), transport, host, page().into_shared())
    }

    /// A synchronizer whose page already shows tasks 1, 2 and 3.
    fn populated(transport: FakeTransport) -> TestSync {
        let sync = synchronizer(transport);
        sync.render_list(&[task(1, "one"), task(2, "two"), task(3, "three")], today());
        sync
    }

    fn list_html(sync: &TestSync) -> String {
        let document = sync.document();
        let doc = document.lock();
        doc.by_id(TASK_LIST_ID).unwrap().inner_html()
    }

    fn row_html(doc: &Document, id: TaskId) -> String {
        task_row(doc, id).unwrap().to_html()
    }

    fn notifications(sync: &TestSync) -> Vec<(String, String)> {
        visible_notifications(&sync.document().lock())
    }

    fn reloads(sync: &TestSync) -> usize {
        sync.host().reloads.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_add_task_renders_returned_list_in_order() {
        let tasks = vec![task(3, "c"), task(1, "a"), task(2, "b")];
        let sync = synchronizer(FakeTransport::replying(vec![json!({
            "success": true,
            "message": "Task added successfully!",
            "tasks": tasks,
            "today": "2026-10-16",
        })]));
        sync.set_add_field("title", "c");

        let outcome = sync.on_add_submit().await;

        assert_eq!(outcome, Outcome::Patched);
        let document = sync.document();
        let doc = document.lock();
        let list = doc.by_id(TASK_LIST_ID).unwrap();
        let rows: Vec<&str> = list
            .child_elements()
            .filter(|e| e.has_class("task-row"))
            .filter_map(|e| e.attr("data-task-id"))
            .collect();
        let details = list
            .child_elements()
            .filter(|e| e.has_class("description-row"))
            .count();
        assert_eq!(rows, vec!["3", "1", "2"]);
        assert_eq!(details, 3);
        drop(doc);

        assert_eq!(
            notifications(&sync),
            vec![("success".to_string(), "Task added successfully!".to_string())]
        );
        let calls = sync.transport().calls();
        assert_eq!(calls[0].0, "/add");
        assert!(calls[0].1.contains(&("title".to_string(), "c".to_string())));
    }

    #[tokio::test]
    async fn test_add_task_resets_form_after_success() {
        let sync = synchronizer(FakeTransport::replying(vec![json!({
            "success": true,
            "message": "ok",
            "tasks": [task(1, "a")],
            "today": "2026-10-16",
        })]));
        sync.set_add_field("title", "a");
        sync.set_add_field("description", "details");

        sync.on_add_submit().await;

        let document = sync.document();
        let form = Form::read(document.lock().by_id(ADD_FORM_ID).unwrap()).unwrap();
        assert_eq!(form.field("title"), Some(""));
        assert_eq!(form.field("description"), Some(""));
    }

    #[tokio::test]
    async fn test_add_task_without_list_reloads() {
        let sync = synchronizer(FakeTransport::replying(vec![json!({
            "success": true,
            "message": "Task added successfully!",
        })]));

        let outcome = sync.on_add_submit().await;

        assert_eq!(outcome, Outcome::Reloaded);
        assert_eq!(reloads(&sync), 1);
    }

    #[tokio::test]
    async fn test_add_task_with_unreadable_task_reloads() {
        let sync = populated(FakeTransport::replying(vec![json!({
            "success": true,
            "message": "Task added successfully!",
            "today": "2026-10-16",
            "tasks": [{
                "id": 7,
                "title": "Archive me",
                "description": null,
                "status": "Archived",
                "created_at_time": "09:30 AM",
                "created_at_date": "16 Oct 2026",
                "deadline_time": null,
                "deadline_date": null,
                "deadline_form_value": ""
            }],
        })]));
        let before = list_html(&sync);

        let outcome = sync.on_add_submit().await;

        assert_eq!(outcome, Outcome::Reloaded);
        assert_eq!(reloads(&sync), 1);
        assert_eq!(list_html(&sync), before);
        assert_eq!(
            notifications(&sync),
            vec![("success".to_string(), "Task added successfully!".to_string())]
        );
    }

    #[tokio::test]
    async fn test_add_task_with_non_iso_today_reloads() {
        let sync = synchronizer(FakeTransport::replying(vec![json!({
            "success": true,
            "tasks": [],
            "today": "16 Oct 2026",
        })]));

        let outcome = sync.on_add_submit().await;

        assert_eq!(outcome, Outcome::Reloaded);
        assert_eq!(reloads(&sync), 1);
    }

    #[tokio::test]
    async fn test_row_reply_with_unreadable_fields_reloads() {
        let sync = populated(FakeTransport::replying(vec![json!({
            "success": true,
            "message": "Description updated",
            "new_description": 42,
        })]));
        let before = list_html(&sync);

        let outcome = sync.on_list_submit(1, ListAction::UpdateDescription).await;

        assert_eq!(outcome, Outcome::Reloaded);
        assert_eq!(reloads(&sync), 1);
        assert_eq!(list_html(&sync), before);
    }

    #[tokio::test]
    async fn test_failure_with_unreadable_fields_keeps_message() {
        let sync = populated(FakeTransport::replying(vec![json!({
            "success": false,
            "message": "Task not found",
            "new_status": ["bogus"],
        })]));

        let outcome = sync.on_list_submit(2, ListAction::ToggleStatus).await;

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(reloads(&sync), 0);
        assert_eq!(notifications(&sync)[0].1, "Task not found");
    }

    #[tokio::test]
    async fn test_add_task_failure_shows_server_message() {
        let sync = populated(FakeTransport::replying(vec![json!({
            "success": false,
            "message": "Task title cannot be empty.",
        })]));
        let before = list_html(&sync);

        let outcome = sync.on_add_submit().await;

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(list_html(&sync), before);
        assert_eq!(
            notifications(&sync),
            vec![("danger".to_string(), "Task title cannot be empty.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failure_without_message_uses_default() {
        let sync = populated(FakeTransport::replying(vec![json!({ "success": false })]));

        sync.on_list_submit(1, ListAction::ToggleStatus).await;

        assert_eq!(
            notifications(&sync),
            vec![("danger".to_string(), GENERIC_FAILURE.to_string())]
        );
    }

    #[tokio::test]
    async fn test_network_failure_changes_nothing() {
        let sync = populated(FakeTransport::unreachable());
        let before = list_html(&sync);

        let outcome = sync.on_list_submit(2, ListAction::Delete).await;

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(list_html(&sync), before);
        assert_eq!(
            notifications(&sync),
            vec![("danger".to_string(), "A network error occurred.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_malformed_reply_is_a_network_failure() {
        let sync = populated(FakeTransport::raw("<html>Login</html>"));
        let before = list_html(&sync);

        let outcome = sync.on_list_submit(2, ListAction::ToggleStatus).await;

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(list_html(&sync), before);
        assert_eq!(notifications(&sync)[0].1, "A network error occurred.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_fades_then_removes_row_and_detail() {
        let sync = populated(FakeTransport::replying(vec![json!({
            "success": true,
            "message": "Task deleted",
        })]));
        let (row1, row3) = {
            let document = sync.document();
            let doc = document.lock();
            (row_html(&doc, 1), row_html(&doc, 3))
        };

        let outcome = sync.on_list_submit(2, ListAction::Delete).await;

        assert_eq!(outcome, Outcome::Patched);
        {
            let document = sync.document();
            let doc = document.lock();
            assert!(task_row(&doc, 2).unwrap().has_class("fading"));
            assert!(detail_row(&doc, 2).unwrap().has_class("fading"));
        }

        sleep(Duration::from_millis(350)).await;

        let document = sync.document();
        let doc = document.lock();
        assert!(task_row(&doc, 2).is_none());
        assert!(detail_row(&doc, 2).is_none());
        assert_eq!(row_html(&doc, 1), row1);
        assert_eq!(row_html(&doc, 3), row3);
        assert!(detail_row(&doc, 1).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_fade_follows_configured_duration() {
        let config = Config {
            fade_duration: Duration::from_millis(1200),
            ..Config::default()
        };
        let sync = ViewSynchronizer::attach(
            config,
            FakeTransport::replying(vec![json!({ "success": true })]),
            TestHost::default(),
            page().into_shared(),
        );
        sync.render_list(&[task(1, "one")], today());

        sync.on_list_submit(1, ListAction::Delete).await;
        {
            let document = sync.document();
            let doc = document.lock();
            let row = task_row(&doc, 1).unwrap();
            assert_eq!(
                row.attr("style"),
                Some("transition: opacity 1200ms ease; opacity: 0")
            );
        }

        sleep(Duration::from_millis(350)).await;
        assert!(task_row(&sync.document().lock(), 1).is_some());

        sleep(Duration::from_millis(1000)).await;
        assert!(task_row(&sync.document().lock(), 1).is_none());
    }

    #[tokio::test]
    async fn test_delete_of_unknown_row_reloads() {
        let sync = populated(FakeTransport::replying(vec![json!({
            "success": true,
            "message": "Task deleted",
        })]));

        let outcome = sync.submit_list_action(Form::row(42, ListAction::Delete)).await;

        assert_eq!(outcome, Outcome::Reloaded);
        assert_eq!(reloads(&sync), 1);
    }

    #[tokio::test]
    async fn test_toggle_changes_only_the_badge() {
        let sync = populated(FakeTransport::replying(vec![json!({
            "success": true,
            "message": "Status updated",
            "new_status": "Done",
        })]));
        let (row_before, detail_before) = {
            let document = sync.document();
            let doc = document.lock();
            (row_html(&doc, 1), detail_row(&doc, 1).unwrap().to_html())
        };

        let outcome = sync.on_list_submit(1, ListAction::ToggleStatus).await;

        assert_eq!(outcome, Outcome::Patched);
        let document = sync.document();
        let doc = document.lock();
        let expected = row_before.replace(
            "<span class=\"badge pending\">Pending</span>",
            "<span class=\"badge done\">Done</span>",
        );
        assert_ne!(expected, row_before);
        assert_eq!(row_html(&doc, 1), expected);
        assert_eq!(detail_row(&doc, 1).unwrap().to_html(), detail_before);
    }

    #[tokio::test]
    async fn test_toggle_with_unknown_status_reloads() {
        let sync = populated(FakeTransport::replying(vec![json!({
            "success": true,
            "message": "Status updated",
            "new_status": "Archived",
        })]));

        let outcome = sync.on_list_submit(1, ListAction::ToggleStatus).await;

        assert_eq!(outcome, Outcome::Reloaded);
    }

    #[tokio::test]
    async fn test_toggle_on_removed_row_is_a_noop() {
        let sync = populated(FakeTransport::replying(vec![json!({
            "success": true,
            "message": "Status updated",
            "new_status": "Working",
        })]));

        let outcome = sync.submit_list_action(Form::row(42, ListAction::ToggleStatus)).await;

        assert_eq!(outcome, Outcome::Missing);
        assert_eq!(reloads(&sync), 0);
    }

    #[tokio::test]
    async fn test_deadline_update_patches_display_and_collapses() {
        let sync = populated(FakeTransport::replying(vec![json!({
            "success": true,
            "message": "Deadline updated.",
            "deadline_time": "06:30 PM",
            "deadline_date": "16 Oct 2026",
        })]));
        assert!(sync.begin_edit(2, EditField::Deadline));
        assert!(sync.set_row_field(2, ListAction::UpdateDeadline, "new_deadline", "2026-10-16T18:30"));

        let outcome = sync.on_list_submit(2, ListAction::UpdateDeadline).await;

        assert_eq!(outcome, Outcome::Patched);
        let calls = sync.transport().calls();
        assert_eq!(calls[0].0, "/update_deadline/2");
        assert_eq!(
            calls[0].1,
            vec![("new_deadline".to_string(), "2026-10-16T18:30".to_string())]
        );

        let document = sync.document();
        let doc = document.lock();
        let row = task_row(&doc, 2).unwrap();
        let display = row.find(&|e| e.has_class("deadline-display")).unwrap();
        assert_eq!(display.text_content(), "06:30 PM16 Oct 2026");
        let compact = row.find(&|e| e.has_class("deadline-compact")).unwrap();
        assert_eq!(compact.text_content(), "Due 16 Oct 2026, 06:30 PM");
        assert!(row.has_class("due-today"));
        assert_eq!(is_editing(&doc, 2, EditField::Deadline), Some(false));
    }

    #[tokio::test]
    async fn test_cleared_deadline_shows_placeholder() {
        let mut overdue = task(1, "late");
        overdue.deadline_time = Some("10:00 AM".to_string());
        overdue.deadline_date = Some("10 Oct 2026".to_string());
        overdue.deadline_form_value = "2026-10-10T10:00".to_string();
        let sync = synchronizer(FakeTransport::replying(vec![json!({
            "success": true,
            "message": "Deadline removed.",
        })]));
        sync.render_list(&[overdue], today());

        let outcome = sync.on_list_submit(1, ListAction::UpdateDeadline).await;

        assert_eq!(outcome, Outcome::Patched);
        let document = sync.document();
        let doc = document.lock();
        let row = task_row(&doc, 1).unwrap();
        assert!(!row.has_class("overdue"));
        let display = row.find(&|e| e.has_class("deadline-display")).unwrap();
        assert_eq!(display.text_content(), "None");
        let form = Form::read(row.find(&|e| e.has_class("deadline-edit-form")).unwrap()).unwrap();
        assert_eq!(form.field("new_deadline"), Some(""));
    }

    #[tokio::test]
    async fn test_description_update_sets_literal_text() {
        let sync = populated(FakeTransport::replying(vec![
            json!({
                "success": true,
                "message": "Description updated.",
                "new_description": "<i>call</i> Bob",
            }),
            json!({
                "success": true,
                "message": "Description updated.",
                "new_description": "",
            }),
        ]));
        sync.begin_edit(3, EditField::Description);

        let outcome = sync.on_list_submit(3, ListAction::UpdateDescription).await;

        assert_eq!(outcome, Outcome::Patched);
        {
            let document = sync.document();
            let doc = document.lock();
            let detail = detail_row(&doc, 3).unwrap();
            let text = detail.find(&|e| e.has_class("description-text")).unwrap();
            assert_eq!(text.text_content(), "<i>call</i> Bob");
            assert!(detail.to_html().contains("&lt;i&gt;call&lt;/i&gt; Bob"));
            assert_eq!(is_editing(&doc, 3, EditField::Description), Some(false));
        }

        sync.on_list_submit(3, ListAction::UpdateDescription).await;

        let document = sync.document();
        let doc = document.lock();
        let detail = detail_row(&doc, 3).unwrap();
        let text = detail.find(&|e| e.has_class("description-text")).unwrap();
        assert_eq!(text.text_content(), render::NO_DESCRIPTION);
    }

    #[tokio::test]
    async fn test_failed_edit_keeps_edit_mode() {
        let sync = populated(FakeTransport::replying(vec![json!({
            "success": false,
            "message": "Unauthorized",
        })]));
        sync.begin_edit(1, EditField::Description);
        let before = list_html(&sync);

        let outcome = sync.on_list_submit(1, ListAction::UpdateDescription).await;

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(list_html(&sync), before);
        assert_eq!(
            is_editing(&sync.document().lock(), 1, EditField::Description),
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_edit_toggling_never_hits_the_network() {
        let sync = populated(FakeTransport::default());

        assert!(sync.toggle_edit(1, EditField::Deadline));
        assert_eq!(is_editing(&sync.document().lock(), 1, EditField::Deadline), Some(true));
        assert!(sync.cancel_edit(1, EditField::Deadline));
        assert_eq!(is_editing(&sync.document().lock(), 1, EditField::Deadline), Some(false));
        assert!(sync.toggle_edit(1, EditField::Description));
        assert!(sync.toggle_edit(1, EditField::Description));
        assert!(!sync.toggle_edit(9, EditField::Description));

        assert!(sync.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_requires_confirmation() {
        let sync = synchronizer_with_host(FakeTransport::default(), TestHost::default());
        sync.render_list(&[task(1, "a")], today());
        let before = list_html(&sync);

        let outcome = sync.on_clear_submit().await;

        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(sync.host().confirms.load(Ordering::SeqCst), 1);
        assert!(sync.transport().calls().is_empty());
        assert_eq!(list_html(&sync), before);
    }

    #[tokio::test]
    async fn test_clear_all_empties_list_when_confirmed() {
        let host = TestHost {
            accept: true,
            ..TestHost::default()
        };
        let transport = FakeTransport::replying(vec![json!({
            "success": true,
            "message": "All tasks have been cleared.",
        })]);
        let sync = synchronizer_with_host(transport, host);
        sync.render_list(&[task(1, "a"), task(2, "b")], today());

        let outcome = sync.on_clear_submit().await;

        assert_eq!(outcome, Outcome::Patched);
        assert_eq!(sync.transport().calls()[0].0, "/clear");
        assert!(list_html(&sync).is_empty());
        assert_eq!(
            notifications(&sync),
            vec![("info".to_string(), "All tasks have been cleared.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_second_action_on_busy_row_is_refused() {
        let gate = Arc::new(Notify::new());
        let transport = FakeTransport {
            gate: Some(gate.clone()),
            ..FakeTransport::replying(vec![json!({
                "success": true,
                "message": "Status updated",
                "new_status": "Working",
            })])
        };
        let sync = populated(transport);

        let (first, second) = tokio::join!(
            sync.on_list_submit(1, ListAction::ToggleStatus),
            async {
                let outcome = sync.on_list_submit(1, ListAction::Delete).await;
                gate.notify_one();
                outcome
            }
        );

        assert_eq!(first, Outcome::Patched);
        assert_eq!(second, Outcome::Busy);
        assert_eq!(sync.transport().calls().len(), 1);
        assert!(
            notifications(&sync)
                .iter()
                .any(|(kind, message)| kind == "info" && message == ROW_BUSY)
        );

        // The row is free again once the first action finished.
        assert!(sync.claim_row(1).is_some());
    }
}
