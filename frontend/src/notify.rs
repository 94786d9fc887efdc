// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Transient notification banners.
//!
//! Each banner is its own element with its own timers, so several can be on
//! screen at once and each leaves on its own schedule.
use std::fmt;

use tokio::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::dom::{Document, Element, NodeKey, SharedDocument};
use crate::render::NOTIFICATIONS_ID;
use crate::timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Danger,
    Info,
    Warning,
}

impl NotificationKind {
    pub fn css_class(self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Danger => "danger",
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_class())
    }
}

#[derive(Debug, Clone)]
pub struct Notifier {
    document: SharedDocument,
    show_delay: Duration,
    visible_for: Duration,
    exit_delay: Duration,
}

impl Notifier {
    pub fn new(document: SharedDocument, config: &Config) -> Self {
        Self {
            document,
            show_delay: config.notification_show_delay,
            visible_for: config.notification_visible,
            exit_delay: config.notification_exit,
        }
    }

    /// Appends a banner and schedules its show, hide and removal.
    pub fn notify(&self, message: &str, kind: NotificationKind) -> NodeKey {
        let banner = Element::new("div")
            .with_class("notification")
            .with_class(kind.css_class())
            .with_text(message);
        let key = banner.key();

        {
            let mut doc = self.document.lock();
            match doc.by_id_mut(NOTIFICATIONS_ID) {
                Some(stack) => stack.append(banner),
                None => doc.root_mut().append(banner),
            }
        }
        debug!("Notification {} ({}): {}", key, kind, message);

        let document = self.document.clone();
        timer::after(self.show_delay, move || {
            if let Some(banner) = document.lock().by_key_mut(key) {
                banner.add_class("show");
            }
        });

        let document = self.document.clone();
        let exit_delay = self.exit_delay;
        timer::after(self.show_delay + self.visible_for, move || {
            let still_attached = match document.lock().by_key_mut(key) {
                Some(banner) => {
                    banner.remove_class("show");
                    true
                }
                None => false,
            };
            if still_attached {
                timer::after(exit_delay, move || {
                    document.lock().remove(key);
                });
            }
        });

        key
    }
}

/// Banners currently in the document, oldest first, as `(kind, message)`.
pub fn visible_notifications(doc: &Document) -> Vec<(String, String)> {
    doc.root()
        .find_all(&|e| e.has_class("notification"))
        .into_iter()
        .map(|banner| {
            let kind = banner
                .classes()
                .find(|c| *c != "notification" && *c != "show")
                .unwrap_or_default()
                .to_string();
            (kind, banner.text_content())
        })
        .collect()
}
