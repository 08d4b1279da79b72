//! Identity resolution trait for connection authentication.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::id::{TenantId, UserId};
use crate::types::message::SenderInfo;

/// The identity a bearer credential resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    /// Authenticated user.
    pub user_id: UserId,
    /// Tenant the user belongs to.
    pub tenant_id: TenantId,
    /// Login name.
    pub username: String,
    /// Human-readable name.
    pub display_name: String,
    /// Whether the account is currently active. Sessions from inactive
    /// accounts are rejected before any group or presence side effect.
    pub is_active: bool,
}

impl ResolvedIdentity {
    /// Sender metadata for messages authored by this identity.
    pub fn sender_info(&self) -> SenderInfo {
        SenderInfo {
            user_id: self.user_id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Resolves a bearer credential into a [`ResolvedIdentity`].
///
/// Called exactly once per connection attempt. Implementations must fail
/// with an `Authentication` error for absent, malformed, expired, or
/// otherwise invalid credentials; an inactive account is returned with
/// `is_active == false` and rejected by the session.
#[async_trait]
pub trait IdentityResolver: Send + Sync + 'static {
    /// Resolve the credential carried by a connection attempt.
    async fn resolve(&self, credential: &str) -> AppResult<ResolvedIdentity>;
}
