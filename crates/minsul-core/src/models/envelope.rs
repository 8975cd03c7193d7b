use serde::{Deserialize, Serialize};

/// Uniform wrapper around every JSON response of the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    // Absent `data` is `None` without a `T: Default` bound, so no `#[serde(default)]`.
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Page information attached to list responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl<T> ApiResponse<T> {
    /// Message reported by the backend, or `fallback` when it sent none.
    pub fn error_message(&self, fallback: &str) -> String {
        match self.message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => fallback.to_string(),
        }
    }
}
