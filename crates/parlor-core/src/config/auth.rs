//! Credential verification configuration.

use serde::{Deserialize, Serialize};

/// Authentication configuration.
///
/// The gateway only verifies tokens; issuance lives with the surrounding
/// platform. The secret must match the issuer's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT verification (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Token TTL in minutes, used when this process mints tokens itself
    /// (tests and dev tooling).
    #[serde(default = "default_jwt_ttl")]
    pub jwt_ttl_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_ttl_minutes: default_jwt_ttl(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_jwt_ttl() -> u64 {
    60
}
