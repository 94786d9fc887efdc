// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Client-side view synchronizer for the task list page.
//!
//! Forms are posted in the background and the list is patched in place from
//! the server's confirmed reply. The page itself is an in-memory
//! [`dom::Document`] that can be serialized to HTML at any time.
pub mod action;
pub mod config;
pub mod dom;
pub mod notify;
pub mod render;
pub mod sync;
pub mod timer;
pub mod transport;

pub use action::{EditField, Form, FormKind, ListAction, UnknownAction};
pub use config::{Config, ConfigError};
pub use notify::{NotificationKind, visible_notifications};
pub use sync::{Host, Outcome, ViewSynchronizer};
pub use transport::{HttpTransport, Transport, TransportError};
