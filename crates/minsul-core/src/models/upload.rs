use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use uuid::Uuid;

/// Destination of an upload; each category has its own endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadCategory {
    #[default]
    Posts,
    Profiles,
    Site,
}

impl UploadCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadCategory::Posts => "posts",
            UploadCategory::Profiles => "profiles",
            UploadCategory::Site => "site",
        }
    }

    /// Whole-file upload endpoint
    pub fn upload_path(&self) -> String {
        format!("/api/upload/{}", self.as_str())
    }

    /// Chunk upload endpoint
    pub fn chunk_path(&self) -> String {
        format!("/api/upload/{}/chunk", self.as_str())
    }
}

impl fmt::Display for UploadCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "posts" | "post" => Ok(UploadCategory::Posts),
            "profiles" | "profile" => Ok(UploadCategory::Profiles),
            "site" => Ok(UploadCategory::Site),
            other => Err(format!(
                "Invalid upload category: {}. Must be one of: posts, profiles, site",
                other
            )),
        }
    }
}

/// Client-side state tying the chunks of one logical upload together.
///
/// The session is never persisted: a failed upload is abandoned and a retry
/// starts a new session with a fresh `temp_file_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub temp_file_id: String,
    pub original_name: String,
    pub original_size: u64,
    pub chunk_size: u64,
    pub total_chunks: u32,
}

impl UploadSession {
    /// Start a session with a freshly generated temp file id.
    pub fn new(original_name: impl Into<String>, original_size: u64, chunk_size: u64) -> Self {
        Self::with_temp_file_id(
            generate_temp_file_id(),
            original_name,
            original_size,
            chunk_size,
        )
    }

    pub fn with_temp_file_id(
        temp_file_id: impl Into<String>,
        original_name: impl Into<String>,
        original_size: u64,
        chunk_size: u64,
    ) -> Self {
        // UploadPolicy rejects zero; clamp so the arithmetic below stays defined.
        let chunk_size = chunk_size.max(1);
        Self {
            temp_file_id: temp_file_id.into(),
            original_name: original_name.into(),
            original_size,
            chunk_size,
            total_chunks: original_size.div_ceil(chunk_size) as u32,
        }
    }

    /// Byte range `[start, end)` of chunk `index`.
    pub fn chunk_range(&self, index: u32) -> Range<u64> {
        let start = (index as u64 * self.chunk_size).min(self.original_size);
        let end = (start + self.chunk_size).min(self.original_size);
        start..end
    }

    /// Ranges of every chunk in upload order.
    pub fn chunk_ranges(&self) -> impl Iterator<Item = Range<u64>> + '_ {
        (0..self.total_chunks).map(move |index| self.chunk_range(index))
    }
}

/// Timestamp plus random suffix; unique across concurrent uploads, not a secret.
pub fn generate_temp_file_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", Utc::now().timestamp_millis(), &suffix[..12])
}

/// `data` payload of an upload or chunk response.
///
/// Chunk responses carry an empty or missing `url` until the server has
/// reassembled the whole file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadedFile {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default, alias = "file_record")]
    pub file: Option<serde_json::Value>,
}

impl UploadedFile {
    /// The final URL, if the server reported one.
    pub fn completed_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Outcome of a completed upload, handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub url: String,
    pub size: u64,
    pub mime_type: String,
    pub file_record: Option<serde_json::Value>,
    pub thumbnail_url: Option<String>,
}

impl UploadResult {
    /// Build the result from the terminal response, filling gaps from the source file.
    pub fn from_response(url: &str, file: UploadedFile, original_name: &str, size: u64) -> Self {
        Self {
            url: url.to_string(),
            size: file.size.unwrap_or(size),
            mime_type: file
                .mime_type
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| mime_from_filename(original_name).to_string()),
            file_record: file.file,
            thumbnail_url: file.thumbnail_url.filter(|t| !t.is_empty()),
        }
    }
}

/// Reported after each chunk the server accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub chunks_sent: u32,
    pub total_chunks: u32,
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        self.bytes_sent as f64 * 100.0 / self.total_bytes as f64
    }
}

/// Content type derived from the file extension, as the backend does it.
pub fn mime_from_filename(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "hwp" => "application/x-hwp",
        "txt" => "text/plain",
        "zip" => "application/zip",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}
