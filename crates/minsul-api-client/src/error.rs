//! Error types for the API client
//!
//! Every failure is returned to the immediate caller; nothing in this crate
//! retries. `SessionExpired` is only produced after the stored tokens were cleared.

use std::time::Duration;

use minsul_core::PolicyError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected outcomes such as a missing login
    Debug,
    /// Recoverable by user action (sign in again, pick a smaller file)
    Warn,
    /// Server or transport failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("No stored credential; sign in first")]
    NoCredential,

    #[error("Session expired; sign in again")]
    SessionExpired,

    #[error("File too large: {size} bytes exceeds maximum of {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Chunk {index} upload failed with status {status}: {body}")]
    ChunkUploadFailed { index: u32, status: u16, body: String },

    #[error("Upload incomplete: server returned no file URL after {total_chunks} chunks")]
    UploadIncomplete { total_chunks: u32 },

    #[error("Upload timed out after {0:?}")]
    UploadTimeout(Duration),

    #[error("Upload failed with status {status}: {body}")]
    UploadFailed { status: u16, body: String },

    #[error("{message}")]
    ApiError { message: String },

    #[error("Upload cancelled")]
    Cancelled,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid upload policy: {0}")]
    InvalidPolicy(#[from] PolicyError),

    #[error("Invalid upload transition: {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub(crate) fn api(message: impl Into<String>) -> Self {
        ClientError::ApiError {
            message: message.into(),
        }
    }

    /// Machine-readable error code (e.g., "SESSION_EXPIRED")
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::NoCredential => "NO_CREDENTIAL",
            ClientError::SessionExpired => "SESSION_EXPIRED",
            ClientError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ClientError::ChunkUploadFailed { .. } => "CHUNK_UPLOAD_FAILED",
            ClientError::UploadIncomplete { .. } => "UPLOAD_INCOMPLETE",
            ClientError::UploadTimeout(_) => "UPLOAD_TIMEOUT",
            ClientError::UploadFailed { .. } => "UPLOAD_FAILED",
            ClientError::ApiError { .. } => "API_ERROR",
            ClientError::Cancelled => "CANCELLED",
            ClientError::Http(_) => "HTTP_ERROR",
            ClientError::Decode(_) => "DECODE_ERROR",
            ClientError::Storage(_) => "STORAGE_ERROR",
            ClientError::Io(_) => "IO_ERROR",
            ClientError::InvalidPolicy(_) => "INVALID_POLICY",
            ClientError::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }

    /// Whether the caller should send the user through the login flow.
    pub fn requires_login(&self) -> bool {
        matches!(self, ClientError::NoCredential | ClientError::SessionExpired)
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            ClientError::NoCredential | ClientError::Cancelled => LogLevel::Debug,
            ClientError::SessionExpired
            | ClientError::FileTooLarge { .. }
            | ClientError::ApiError { .. }
            | ClientError::UploadTimeout(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}
