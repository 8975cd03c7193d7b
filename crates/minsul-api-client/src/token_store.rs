//! Bearer token persistence.
//!
//! [`TokenStore`] owns the access/refresh pair of one application session on top
//! of a key/value [`TokenStorage`]. Keys are namespaced per [`ServiceType`], so a
//! single storage file can hold a site session and an admin session side by side.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::Utc;
use minsul_core::{ServiceType, TokenPair};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{ClientError, ClientResult};

/// Key/value backend for tokens.
///
/// Each call is applied as one unit: a reader never observes half of a
/// multi-key write.
pub trait TokenStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set_entries(&self, entries: &[(&str, &str)]) -> ClientResult<()>;

    fn remove_entries(&self, keys: &[&str]) -> ClientResult<()>;
}

/// Process-local storage; tokens are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_entries(&self, entries: &[(&str, &str)]) -> ClientResult<()> {
        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_entries(&self, keys: &[&str]) -> ClientResult<()> {
        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// JSON file storage, rewritten through a temp file and rename on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the token file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(raw) if raw.is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_slice(&raw).map_err(|e| {
                ClientError::Storage(format!("Invalid token file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_vec_pretty(entries)
            .map_err(|e| ClientError::Storage(format!("Failed to serialize tokens: {}", e)))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TokenStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_entries(&self, entries: &[(&str, &str)]) -> ClientResult<()> {
        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = map.clone();
        for (key, value) in entries {
            next.insert(key.to_string(), value.to_string());
        }
        self.persist(&next)?;
        *map = next;
        Ok(())
    }

    fn remove_entries(&self, keys: &[&str]) -> ClientResult<()> {
        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !keys.iter().any(|k| map.contains_key(*k)) {
            return Ok(());
        }
        let mut next = map.clone();
        for key in keys {
            next.remove(*key);
        }
        self.persist(&next)?;
        *map = next;
        Ok(())
    }
}

/// Token pair of one application session.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
    service_type: ServiceType,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("service_type", &self.service_type)
            .finish()
    }
}

impl TokenStore {
    pub fn new(storage: Arc<dyn TokenStorage>, service_type: ServiceType) -> Self {
        Self {
            storage,
            service_type,
        }
    }

    pub fn in_memory(service_type: ServiceType) -> Self {
        Self::new(Arc::new(MemoryStorage::new()), service_type)
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    /// Store the access token and, when given, the refresh token. No validation.
    pub fn set_tokens(&self, access: &str, refresh: Option<&str>) -> ClientResult<()> {
        let access_key = self.service_type.access_token_key();
        match refresh {
            Some(refresh) => self.storage.set_entries(&[
                (access_key, access),
                (self.service_type.refresh_token_key(), refresh),
            ]),
            None => self.storage.set_entries(&[(access_key, access)]),
        }
    }

    pub fn set_pair(&self, pair: &TokenPair) -> ClientResult<()> {
        self.set_tokens(&pair.access_token, Some(&pair.refresh_token))
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage
            .get(self.service_type.access_token_key())
            .filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.storage
            .get(self.service_type.refresh_token_key())
            .filter(|t| !t.is_empty())
    }

    /// Remove both tokens. Calling it on an empty store is a no-op.
    pub fn clear(&self) -> ClientResult<()> {
        self.storage.remove_entries(&[
            self.service_type.access_token_key(),
            self.service_type.refresh_token_key(),
        ])
    }

    /// An access token is present and not yet expired.
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some_and(|t| !is_expired(&t))
    }
}

/// Whether a three-part signed token is past its `exp` claim.
///
/// Anything that cannot be decoded, or carries no `exp`, counts as expired so
/// the caller refreshes instead of sending a token of unknown validity.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now().timestamp())
}

pub fn is_expired_at(token: &str, now: i64) -> bool {
    match expiry(token) {
        Some(exp) => exp < now as f64,
        None => true,
    }
}

/// The `exp` claim in epoch seconds.
pub fn expiry(token: &str) -> Option<f64> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let payload = payload.trim_end_matches('=');
    let decoded = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    claims.get("exp")?.as_f64()
}
