//! Fixed protocol values shared by the client and CLI.

use std::time::Duration;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;

/// Absolute ceiling for any upload, chunked or not.
pub const MAX_UPLOAD_SIZE: u64 = 50 * MIB;
/// Files strictly larger than this are uploaded in chunks.
pub const CHUNK_THRESHOLD: u64 = MIB;
pub const CHUNK_SIZE: u64 = 512 * KIB;
pub const INTER_CHUNK_DELAY: Duration = Duration::from_millis(100);
pub const SIMPLE_UPLOAD_TIMEOUT: Duration = Duration::from_secs(5 * 60);

pub const DEFAULT_API_URL: &str = "http://localhost:18080";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;
pub const REFRESH_PATH: &str = "/api/auth/refresh";

// Storage keys. The admin console and the public site keep separate sessions.
pub const SITE_ACCESS_TOKEN_KEY: &str = "auth_token";
pub const SITE_REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const ADMIN_ACCESS_TOKEN_KEY: &str = "admin_token";
pub const ADMIN_REFRESH_TOKEN_KEY: &str = "admin_refresh_token";

pub const DEFAULT_PAGE_SIZE: u32 = 10;
