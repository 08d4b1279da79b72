//! JWT claims structure carried by gateway connection tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parlor_core::types::{TenantId, UserId};

/// JWT claims payload embedded in every connection token.
///
/// The issuing platform signs user and tenant identity into the token; the
/// gateway trusts these fields after signature verification but still
/// re-checks them against the user directory (tenant match, active flag).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the user ID.
    pub sub: UserId,
    /// Tenant the user belongs to.
    pub tid: TenantId,
    /// Username for convenience.
    pub username: String,
    /// Human-readable name for convenience.
    pub name: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Returns the user ID from the subject claim.
    pub fn user_id(&self) -> UserId {
        self.sub
    }

    /// Returns the tenant ID.
    pub fn tenant_id(&self) -> TenantId {
        self.tid
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Checks whether this token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}
