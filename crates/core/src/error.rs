use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::types::ValidationError;

#[derive(Debug, Error)]
pub enum SdkError {
    /// A payload did not match the data model. Never retried.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Connection, timeout, status or body failure. Never retried.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::Validation(err.into())
    }
}

impl SdkError {
    /// HTTP status when the failure came from a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            SdkError::Transport(te) => te.status(),
            SdkError::Validation(_) => None,
        }
    }

    /// Raw upstream body when the failure came from a non-2xx response.
    pub fn body(&self) -> Option<&str> {
        match self {
            SdkError::Transport(TransportError::HttpStatus { body, .. }) => Some(body),
            _ => None,
        }
    }

    /// One-line description for logs and CLI output. Shows the raw body of
    /// status errors, so keep it out of shared logs.
    pub fn format_details(&self) -> String {
        match self {
            SdkError::Transport(TransportError::HttpStatus { status, body, .. }) => {
                if body.is_empty() {
                    http_status_fallback_message(*status)
                } else {
                    format!("http status {}: {}", status, body)
                }
            }
            SdkError::Transport(te) => format!("transport error: {}", te),
            SdkError::Validation(ve) => ve.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http status {status}: {sanitized}")]
    HttpStatus {
        status: u16,
        /// Body exactly as the server sent it. May echo request data; log `sanitized`.
        body: String,
        /// Minified JSON body or a byte count
        sanitized: String,
        headers: Vec<(String, String)>,
    },
    #[error("network: {0}")]
    Network(String),
    #[error("connect timeout after {0:?}")]
    ConnectTimeout(Duration),
    #[error("request timeout after {0:?}")]
    RequestTimeout(Duration),
    #[error("idle read timeout after {0:?}")]
    IdleReadTimeout(Duration),
    #[error("body read error: {0}")]
    BodyRead(String),
    /// The connection closed before `response.done` or `error` arrived.
    #[error("stream closed before response.done or error")]
    StreamClosed,
    #[error("other: {0}")]
    Other(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn sanitized_message(&self) -> String {
        match self {
            TransportError::HttpStatus { status, .. } => http_status_fallback_message(*status),
            _ => self.to_string(),
        }
    }
}

pub fn http_status_fallback_message(status: u16) -> String {
    format!("http status {status}")
}

pub fn build_http_status_transport_error(
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
) -> TransportError {
    let sanitized = display_body_for_error(&body);
    TransportError::HttpStatus {
        status,
        body,
        sanitized,
        headers,
    }
}

/// Short display form of an upstream body: minified JSON, or a byte count.
pub fn display_body_for_error(body: &str) -> String {
    let trimmed = body.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return format!("{} bytes", body.len());
    }
    serde_json::from_str::<Value>(trimmed)
        .map(|parsed| parsed.to_string())
        .unwrap_or_else(|_| format!("{} bytes", body.len()))
}
