use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    ADMIN_ACCESS_TOKEN_KEY, ADMIN_REFRESH_TOKEN_KEY, SITE_ACCESS_TOKEN_KEY, SITE_REFRESH_TOKEN_KEY,
};

/// Access/refresh bearer tokens as issued by the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .finish()
    }
}

/// Body of the refresh request.
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
    pub service_type: ServiceType,
}

/// Which front-end application a session belongs to.
///
/// The backend scopes tokens per application, so the discriminator is sent on
/// refresh and the tokens are stored under application-specific keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    #[default]
    Site,
    Admin,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Site => "site",
            ServiceType::Admin => "admin",
        }
    }

    pub fn access_token_key(&self) -> &'static str {
        match self {
            ServiceType::Site => SITE_ACCESS_TOKEN_KEY,
            ServiceType::Admin => ADMIN_ACCESS_TOKEN_KEY,
        }
    }

    pub fn refresh_token_key(&self) -> &'static str {
        match self {
            ServiceType::Site => SITE_REFRESH_TOKEN_KEY,
            ServiceType::Admin => ADMIN_REFRESH_TOKEN_KEY,
        }
    }

    pub fn login_path(&self) -> &'static str {
        match self {
            ServiceType::Site => "/api/auth/login",
            ServiceType::Admin => "/api/admin/login",
        }
    }

    pub fn logout_path(&self) -> &'static str {
        match self {
            ServiceType::Site => "/api/auth/logout",
            ServiceType::Admin => "/api/admin/logout",
        }
    }

    pub fn me_path(&self) -> &'static str {
        match self {
            ServiceType::Site => "/api/auth/me",
            ServiceType::Admin => "/api/admin/me",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "site" => Ok(ServiceType::Site),
            "admin" => Ok(ServiceType::Admin),
            other => Err(format!(
                "Invalid service type: {}. Must be one of: site, admin",
                other
            )),
        }
    }
}
