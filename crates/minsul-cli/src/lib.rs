use chrono::{DateTime, TimeZone, Utc};
use minsul_api_client::token_store::expiry;
use minsul_api_client::{is_expired, TokenStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// `~/.minsul/tokens.json`, or `None` when there is no home directory.
pub fn default_token_file(home: Option<PathBuf>) -> Option<PathBuf> {
    home.map(|h| h.join(".minsul").join("tokens.json"))
}

/// Snapshot of the stored session, safe to print (no token values).
#[derive(Debug, Serialize)]
pub struct TokenStatus {
    pub service: String,
    pub has_access_token: bool,
    pub has_refresh_token: bool,
    pub expired: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenStatus {
    pub fn from_store(tokens: &TokenStore) -> Self {
        let access = tokens.access_token();
        Self {
            service: tokens.service_type().to_string(),
            has_access_token: access.is_some(),
            has_refresh_token: tokens.refresh_token().is_some(),
            expired: access.as_deref().map(is_expired).unwrap_or(true),
            expires_at: access
                .as_deref()
                .and_then(expiry)
                .and_then(|exp| Utc.timestamp_opt(exp as i64, 0).single()),
        }
    }
}

/// Load `.env` and initialize tracing for the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(load_env(None))
        .with_writer(std::io::stderr)
        .init();
}

/// Load the env file, then build the log filter from `RUST_LOG`.
fn load_env(env_file: Option<&Path>) -> EnvFilter {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path).ok();
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
