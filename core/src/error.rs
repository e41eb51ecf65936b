//! Error types for the REST client layer.
//!
//! # Design
//! Every failure a caller can observe is a variant of `RestError`. Variants
//! derived from a status code carry the URI or raw body that produced them,
//! so a failed call can be diagnosed without issuing it again. Transport
//! failures before a response arrives are retried inside the client and
//! only surface here once the attempt budget is spent; a failure while
//! reading a response body surfaces at once.

use serde_json::Value;
use thiserror::Error;

/// Boxed error produced by the underlying transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Where in an exchange a transport failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Before the status line and headers arrived.
    Request,
    /// While reading the body of a response that had already arrived.
    ResponseBody,
}

/// A connection-level failure reported by a `Connection` for a single
/// attempt. Only `FailureStage::Request` failures are retried.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportFailure {
    message: String,
    stage: FailureStage,
    #[source]
    source: Option<BoxError>,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stage: FailureStage::Request,
            source: None,
        }
    }

    pub fn from_source(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        Self {
            message: source.to_string(),
            stage: FailureStage::Request,
            source: Some(source),
        }
    }

    /// Failure reading a response body; the request reached the server.
    pub fn reading_body(source: impl Into<BoxError>) -> Self {
        Self {
            stage: FailureStage::ResponseBody,
            ..Self::from_source(source)
        }
    }

    pub fn stage(&self) -> FailureStage {
        self.stage
    }

    pub fn is_retryable(&self) -> bool {
        self.stage == FailureStage::Request
    }
}

/// Errors returned by `Client`, `Resource` and the script helper.
#[derive(Debug, Error)]
pub enum RestError {
    /// The connection failed on every attempt, or a response body could
    /// not be read.
    #[error("transport failure for {uri}: {source}")]
    Transport {
        uri: String,
        #[source]
        source: TransportFailure,
    },

    /// The server rejected the request payload (400).
    #[error("bad request: {}", render_body(.body))]
    BadRequest { body: Option<Value> },

    /// The server returned 404.
    #[error("resource not found: {uri}")]
    ResourceNotFound { uri: String },

    /// The server returned 409.
    #[error("resource conflict: {uri}")]
    ResourceConflict { uri: String },

    /// The server returned a status in 500..=599.
    #[error("server error {status}: {}", render_body(.body))]
    ServerError { status: u16, body: Option<Value> },

    /// A status code with no entry in the status table.
    #[error("unexpected status {status} from {uri}")]
    UnexpectedStatus {
        status: u16,
        uri: String,
        body: Option<Value>,
    },

    /// The URI scheme is neither `http` nor `https`.
    #[error("unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    /// The URI could not be split into scheme, host and path.
    #[error("invalid URI {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },

    /// Redirect chain exceeded the configured hop limit.
    #[error("more than {max} redirects while requesting {uri}")]
    TooManyRedirects { uri: String, max: usize },

    /// A redirect status arrived without a `Location` header.
    #[error("redirect {status} from {uri} has no Location header")]
    MissingLocation { status: u16, uri: String },

    /// Metadata key absent even after a refresh.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Optional server feature is not available on this instance.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The request body could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn render_body(body: &Option<Value>) -> String {
    match body {
        Some(value) => value.to_string(),
        None => "<empty>".to_string(),
    }
}

impl RestError {
    /// Status code this error was derived from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RestError::BadRequest { .. } => Some(400),
            RestError::ResourceNotFound { .. } => Some(404),
            RestError::ResourceConflict { .. } => Some(409),
            RestError::ServerError { status, .. } | RestError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}
