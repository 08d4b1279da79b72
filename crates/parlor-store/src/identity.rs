//! Directory-backed identity resolver.

use std::sync::Arc;

use async_trait::async_trait;

use parlor_auth::JwtDecoder;
use parlor_core::error::AppError;
use parlor_core::result::AppResult;
use parlor_core::traits::identity::{IdentityResolver, ResolvedIdentity};

use crate::directory::Directory;

/// Resolves bearer credentials by verifying the token signature and then
/// cross-checking the directory: the user must exist, the token's tenant
/// claim must match the directory record, and the identity fields come from
/// the directory rather than the token.
pub struct DirectoryIdentityResolver {
    decoder: JwtDecoder,
    directory: Arc<Directory>,
}

impl DirectoryIdentityResolver {
    /// Creates a resolver over the given decoder and directory.
    pub fn new(decoder: JwtDecoder, directory: Arc<Directory>) -> Self {
        Self { decoder, directory }
    }
}

#[async_trait]
impl IdentityResolver for DirectoryIdentityResolver {
    async fn resolve(&self, credential: &str) -> AppResult<ResolvedIdentity> {
        let claims = self.decoder.decode(credential)?;

        let user = self
            .directory
            .user(claims.sub)
            .ok_or_else(|| AppError::authentication("Unknown user"))?;

        if user.tenant_id != claims.tid {
            return Err(AppError::authentication("Token tenant mismatch"));
        }

        Ok(ResolvedIdentity {
            user_id: user.id,
            tenant_id: user.tenant_id,
            username: user.username,
            display_name: user.display_name,
            is_active: user.active,
        })
    }
}
