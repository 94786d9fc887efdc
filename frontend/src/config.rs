// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

const BASE_URL_VAR: &str = "TASKVIEW_BASE_URL";
const TIMEOUT_VAR: &str = "TASKVIEW_TIMEOUT_MS";
const NOTIFY_VAR: &str = "TASKVIEW_NOTIFY_MS";
const FADE_VAR: &str = "TASKVIEW_FADE_MS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number of milliseconds, got '{value}'")]
    InvalidMillis { var: &'static str, value: String },
}

/// Runtime settings of the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Origin every form target is resolved against.
    pub base_url: String,
    pub request_timeout: Duration,
    /// Delay before a new notification gets its `show` class.
    pub notification_show_delay: Duration,
    /// How long a notification stays shown.
    pub notification_visible: Duration,
    /// Delay between hiding a notification and detaching it.
    pub notification_exit: Duration,
    /// Fade-out time of a deleted row before it is detached.
    pub fade_duration: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            notification_show_delay: Duration::from_millis(10),
            notification_visible: Duration::from_millis(3000),
            notification_exit: Duration::from_millis(500),
            fade_duration: Duration::from_millis(300),
        }
    }
}

impl Config {
    /// Reads `TASKVIEW_*` variables, falling back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let millis = |var: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match lookup(var) {
                None => Ok(default),
                Some(value) => {
                    let parsed = value.trim().parse::<u64>();
                    parsed
                        .map(Duration::from_millis)
                        .map_err(|_| ConfigError::InvalidMillis { var, value })
                }
            }
        };

        Ok(Self {
            base_url: lookup(BASE_URL_VAR).unwrap_or(defaults.base_url),
            request_timeout: millis(TIMEOUT_VAR, defaults.request_timeout)?,
            notification_visible: millis(NOTIFY_VAR, defaults.notification_visible)?,
            fade_duration: millis(FADE_VAR, defaults.fade_duration)?,
            ..defaults
        })
    }
}
