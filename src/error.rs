use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Coarse classification of a [`SketchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-fixable input problem. Detected before any network call.
    Validation,
    /// The provider answered with a failure, or could not be reached.
    ProviderProtocol,
    /// Polling exhausted its attempt budget.
    Timeout,
    Unexpected,
}

/// Shown for every step when the provider could not be reached at all.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection Error: Failed to connect to LightX API. \
     Please check your internet connection and try again.";

/// How a provider call went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOrigin {
    /// Non-success HTTP status.
    Http,
    /// HTTP 200 with a non-success envelope `statusCode`.
    Envelope,
    /// Connect, timeout or other transport error.
    Transport,
    /// A response arrived but could not be read as the expected shape.
    Malformed,
}

/// What the provider told us when a step failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFailure {
    pub status: u16,
    pub details: Option<Value>,
    pub origin: FailureOrigin,
}

impl ProviderFailure {
    pub const GENERIC_STATUS: u16 = 500;

    /// Non-success HTTP response; the provider's status and raw body are kept.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            status,
            details: if body.is_empty() {
                None
            } else {
                Some(Value::String(body))
            },
            origin: FailureOrigin::Http,
        }
    }

    /// A well-formed envelope whose `statusCode` is not the success code.
    pub fn envelope(raw: Value) -> Self {
        Self {
            status: Self::GENERIC_STATUS,
            details: Some(raw),
            origin: FailureOrigin::Envelope,
        }
    }

    /// Transport-level failure (connect, timeout).
    pub fn transport(message: impl fmt::Display) -> Self {
        Self {
            status: Self::GENERIC_STATUS,
            details: Some(Value::String(message.to_string())),
            origin: FailureOrigin::Transport,
        }
    }

    /// Response body that does not match the expected wire shape.
    pub fn malformed(message: impl fmt::Display) -> Self {
        Self {
            origin: FailureOrigin::Malformed,
            ..Self::transport(message)
        }
    }

    /// Picks the step's message for this failure's origin.
    pub fn message(&self, http: &'static str, envelope: &'static str) -> &'static str {
        match self.origin {
            FailureOrigin::Http | FailureOrigin::Malformed => http,
            FailureOrigin::Envelope => envelope,
            FailureOrigin::Transport => CONNECTION_ERROR_MESSAGE,
        }
    }
}

impl From<reqwest::Error> for ProviderFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderFailure::malformed(err)
        } else {
            ProviderFailure::transport(err)
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(Value::String(s)) => write!(f, "HTTP {}: {}", self.status, s),
            Some(other) => write!(f, "HTTP {}: {}", self.status, other),
            None => write!(f, "HTTP {}", self.status),
        }
    }
}

#[derive(Debug, Error)]
pub enum SketchError {
    #[error("No {0} provided")]
    MissingField(&'static str),

    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Prompt exceeds {max} characters")]
    PromptTooLong { length: usize, max: usize },

    #[error("Invalid sketch format")]
    InvalidImageFormat,

    #[error("Invalid sketch encoding: {0}")]
    MalformedBase64(String),

    #[error("Sketch size exceeds 5 MB")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Unsupported content type: {0}")]
    UnsupportedMediaType(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Unreadable request body: {0}")]
    UnreadableBody(String),

    #[error("{}", .0.message("Failed to get upload URL", "Upload URL request failed"))]
    UploadSlot(ProviderFailure),

    #[error("{}", .0.message("Failed to upload sketch", "Failed to upload sketch"))]
    Upload(ProviderFailure),

    #[error("{}", .0.message("LightX API Error", "sketch2image request failed"))]
    Submission(ProviderFailure),

    #[error("{}", .0.message("Failed to check order status", "Order status check failed"))]
    StatusCheck(ProviderFailure),

    #[error("Image generation failed")]
    GenerationFailed(Option<Value>),

    #[error("Image generation did not complete within the allowed time")]
    Timeout { attempts: u32 },

    #[error("{}", .0.message("Failed to download generated image", "Failed to download generated image"))]
    Download(ProviderFailure),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server Error: {0}")]
    Internal(String),
}

impl SketchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SketchError::MissingField(_)
            | SketchError::EmptyPrompt
            | SketchError::PromptTooLong { .. }
            | SketchError::InvalidImageFormat
            | SketchError::MalformedBase64(_)
            | SketchError::ImageTooLarge { .. }
            | SketchError::UnsupportedMediaType(_)
            | SketchError::PayloadTooLarge { .. }
            | SketchError::UnreadableBody(_) => ErrorKind::Validation,
            SketchError::UploadSlot(_)
            | SketchError::Upload(_)
            | SketchError::Submission(_)
            | SketchError::StatusCheck(_)
            | SketchError::GenerationFailed(_)
            | SketchError::Download(_) => ErrorKind::ProviderProtocol,
            SketchError::Timeout { .. } => ErrorKind::Timeout,
            SketchError::Config(_) | SketchError::Internal(_) => ErrorKind::Unexpected,
        }
    }

    /// HTTP-like status code: 400 for validation (413/415 for bodies the server
    /// refuses to read), the provider's own code for provider failures, 504 for
    /// polling timeout, 500 otherwise.
    pub fn http_status(&self) -> u16 {
        match self {
            SketchError::UploadSlot(f)
            | SketchError::Upload(f)
            | SketchError::Submission(f)
            | SketchError::StatusCheck(f)
            | SketchError::Download(f) => f.status,
            SketchError::GenerationFailed(_) => ProviderFailure::GENERIC_STATUS,
            SketchError::Timeout { .. } => 504,
            SketchError::PayloadTooLarge { .. } => 413,
            SketchError::UnsupportedMediaType(_) => 415,
            _ if self.kind() == ErrorKind::Validation => 400,
            _ => 500,
        }
    }

    /// Provider diagnostic payload, when one was captured.
    pub fn details(&self) -> Option<&Value> {
        match self {
            SketchError::UploadSlot(f)
            | SketchError::Upload(f)
            | SketchError::Submission(f)
            | SketchError::StatusCheck(f)
            | SketchError::Download(f) => f.details.as_ref(),
            SketchError::GenerationFailed(details) => details.as_ref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SketchError>;
