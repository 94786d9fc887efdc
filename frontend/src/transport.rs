// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! The HTTP boundary to the task server.
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

/// Header that marks a request as programmatic, so the server answers with
/// JSON instead of a full page.
pub const REQUESTED_WITH: &str = "x-requested-with";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("cannot resolve form target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Posts a form and hands back the raw reply body.
///
/// Implementations return the body for any HTTP status; only failures to
/// get a body at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_form(
        &self,
        target: &str,
        fields: &[(String, String)],
    ) -> Result<String, TransportError>;
}

/// `reqwest`-backed transport posting `application/x-www-form-urlencoded`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|e| TransportError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: e.to_string(),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(REQUESTED_WITH),
            HeaderValue::from_static(REQUESTED_WITH_VALUE),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self { client, base_url })
    }

    pub fn resolve(&self, target: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(target)
            .map_err(|e| TransportError::InvalidTarget {
                target: target.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(
        &self,
        target: &str,
        fields: &[(String, String)],
    ) -> Result<String, TransportError> {
        let url = self.resolve(target)?;
        let url_text = url.to_string();

        let response = self
            .client
            .post(url)
            .form(fields)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url_text.clone(),
                source,
            })?;

        debug!("POST {} -> {}", url_text, response.status());

        response
            .text()
            .await
            .map_err(|source| TransportError::Request {
                url: url_text,
                source,
            })
    }
}
