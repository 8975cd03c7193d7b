//! Configuration module
//!
//! Client configuration read from the environment (after loading `.env`), and
//! the upload policy that decides between whole-file and chunked uploads.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    CHUNK_SIZE, CHUNK_THRESHOLD, DEFAULT_API_URL, DEFAULT_HTTP_TIMEOUT_SECS, INTER_CHUNK_DELAY,
    KIB, MAX_UPLOAD_SIZE, MIB, REFRESH_PATH, SIMPLE_UPLOAD_TIMEOUT,
};
use crate::models::ServiceType;

/// Upload policy validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("chunk_size must be greater than 0")]
    ZeroChunkSize,

    #[error("chunk threshold {threshold} exceeds maximum upload size {max}")]
    ThresholdAboveMax { threshold: u64, max: u64 },

    #[error("simple_upload_timeout must be greater than 0")]
    ZeroUploadTimeout,
}

/// Size limits and pacing for uploads
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Absolute ceiling; larger files are rejected before any request.
    pub max_file_size: u64,
    /// Files strictly larger than this are chunked.
    pub chunk_threshold: u64,
    pub chunk_size: u64,
    /// Pause between chunk requests to bound server load.
    pub inter_chunk_delay: Duration,
    /// Wall-clock deadline for a whole-file upload.
    pub simple_upload_timeout: Duration,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: MAX_UPLOAD_SIZE,
            chunk_threshold: CHUNK_THRESHOLD,
            chunk_size: CHUNK_SIZE,
            inter_chunk_delay: INTER_CHUNK_DELAY,
            simple_upload_timeout: SIMPLE_UPLOAD_TIMEOUT,
        }
    }
}

impl UploadPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.chunk_size == 0 {
            return Err(PolicyError::ZeroChunkSize);
        }
        if self.chunk_threshold > self.max_file_size {
            return Err(PolicyError::ThresholdAboveMax {
                threshold: self.chunk_threshold,
                max: self.max_file_size,
            });
        }
        if self.simple_upload_timeout.is_zero() {
            return Err(PolicyError::ZeroUploadTimeout);
        }
        Ok(())
    }

    /// Number of chunks a file of `size` bytes is split into.
    pub fn total_chunks(&self, size: u64) -> u32 {
        size.div_ceil(self.chunk_size.max(1)) as u32
    }
}

/// Configuration for one client instance (one application session)
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub service_type: ServiceType,
    /// JSON file holding the token pair; in-memory storage when unset.
    pub token_file: Option<PathBuf>,
    pub http_timeout: Duration,
    pub refresh_path: String,
    pub upload: UploadPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            service_type: ServiceType::Site,
            token_file: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            refresh_path: REFRESH_PATH.to_string(),
            upload: UploadPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, service_type: ServiceType) -> Self {
        Self {
            api_url: api_url.into(),
            service_type,
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = UploadPolicy::default();

        let api_url = lookup("MINSUL_API_URL")
            .or_else(|| lookup("API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let service_type = match lookup("MINSUL_SERVICE") {
            Some(value) => value.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            None => ServiceType::Site,
        };

        let upload = UploadPolicy {
            max_file_size: parse_scaled(&lookup, "MINSUL_UPLOAD_MAX_MB", defaults.max_file_size, MIB)?,
            chunk_threshold: parse_scaled(
                &lookup,
                "MINSUL_UPLOAD_CHUNK_THRESHOLD_KB",
                defaults.chunk_threshold,
                KIB,
            )?,
            chunk_size: parse_scaled(&lookup, "MINSUL_UPLOAD_CHUNK_KB", defaults.chunk_size, KIB)?,
            inter_chunk_delay: Duration::from_millis(parse_or(
                &lookup,
                "MINSUL_UPLOAD_CHUNK_DELAY_MS",
                defaults.inter_chunk_delay.as_millis() as u64,
            )?),
            simple_upload_timeout: Duration::from_secs(parse_or(
                &lookup,
                "MINSUL_UPLOAD_TIMEOUT_SECS",
                defaults.simple_upload_timeout.as_secs(),
            )?),
        };
        upload.validate()?;

        let http_timeout_secs = parse_or(&lookup, "MINSUL_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        if http_timeout_secs == 0 {
            anyhow::bail!("MINSUL_HTTP_TIMEOUT_SECS must be greater than 0");
        }

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            service_type,
            token_file: lookup("MINSUL_TOKEN_FILE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            http_timeout: Duration::from_secs(http_timeout_secs),
            refresh_path: lookup("MINSUL_REFRESH_PATH").unwrap_or_else(|| REFRESH_PATH.to_string()),
            upload,
        })
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: u64) -> Result<u64, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

/// Parse a count of `unit`-sized blocks into bytes; `default` is already in bytes.
fn parse_scaled<F>(lookup: &F, key: &str, default: u64, unit: u64) -> Result<u64, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, default / unit)?
        .checked_mul(unit)
        .ok_or_else(|| anyhow::anyhow!("{} is too large", key))
}
