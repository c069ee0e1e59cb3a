// Error types for the Webtools client

use std::{fmt, time::Duration};

use serde_json::Value;
use thiserror::Error;

use crate::operations::Api;

// Raised synchronously when a client is built from an unusable configuration
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// Failures reaching the upstream endpoint
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timeout after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Network error: {0}")]
    Request(#[source] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn timeout(after: Duration) -> Self {
        TransportError::Timeout {
            after_ms: after.as_millis() as u64,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Request(err)
    }
}

// Errors produced while writing request documents or reading responses
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Malformed(String),

    #[error("XML write error: {0}")]
    Write(String),

    #[error("Empty XML document")]
    Empty,
}

/// Where in a call an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Request,
    Parse,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Request => write!(f, "request"),
            Phase::Parse => write!(f, "parse"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorContext {
    pub api: Api,
    pub phase: Phase,
}

impl ErrorContext {
    pub fn new(api: Api, phase: Phase) -> Self {
        Self { api, phase }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.api, self.phase)
    }
}

/// Errors returned by the client operations.
///
/// `Upstream` displays the service's own message unchanged so callers can
/// match on wording such as `Address Not Found.`; the raw `Error` fragment
/// stays available in `payload`.
#[derive(Error, Debug)]
pub enum WebtoolsError {
    #[error("{context}: invalid input: {message}")]
    InvalidInput {
        message: String,
        context: ErrorContext,
    },

    #[error("{context}: {source}")]
    Transport {
        #[source]
        source: TransportError,
        context: ErrorContext,
    },

    #[error("{context}: {message}")]
    Parse {
        message: String,
        context: ErrorContext,
    },

    #[error("{message}")]
    Upstream {
        message: String,
        payload: Value,
        context: ErrorContext,
    },
}

impl WebtoolsError {
    pub fn invalid_input(api: Api, message: impl Into<String>) -> Self {
        WebtoolsError::InvalidInput {
            message: message.into(),
            context: ErrorContext::new(api, Phase::Request),
        }
    }

    pub fn transport(api: Api, source: TransportError) -> Self {
        WebtoolsError::Transport {
            source,
            context: ErrorContext::new(api, Phase::Request),
        }
    }

    pub fn parse(api: Api, phase: Phase, message: impl Into<String>) -> Self {
        WebtoolsError::Parse {
            message: message.into(),
            context: ErrorContext::new(api, phase),
        }
    }

    pub fn upstream(api: Api, message: impl Into<String>, payload: Value) -> Self {
        WebtoolsError::Upstream {
            message: message.into(),
            payload,
            context: ErrorContext::new(api, Phase::Parse),
        }
    }

    /// The bare message, without the operation prefix used by `Display`.
    pub fn message(&self) -> String {
        match self {
            WebtoolsError::InvalidInput { message, .. }
            | WebtoolsError::Parse { message, .. }
            | WebtoolsError::Upstream { message, .. } => message.clone(),
            WebtoolsError::Transport { source, .. } => source.to_string(),
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            WebtoolsError::InvalidInput { context, .. }
            | WebtoolsError::Transport { context, .. }
            | WebtoolsError::Parse { context, .. }
            | WebtoolsError::Upstream { context, .. } => context,
        }
    }

    // Raw upstream error fragment, only set for service-reported errors
    pub fn payload(&self) -> Option<&Value> {
        match self {
            WebtoolsError::Upstream { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, WebtoolsError::Upstream { .. })
    }
}
