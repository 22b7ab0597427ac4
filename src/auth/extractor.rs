use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::state::SharedState;

/// The caller's identity, resolved from a verified bearer token against the
/// users table. Never carries the password hash.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

impl AuthUser {
    /// Admin gate. Decides on the stored role flag, not the token claim, so
    /// a token issued before a role change reflects the current account.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Access denied, admin privileges required".to_string(),
            ))
        }
    }

    /// Owner-or-admin gate for per-user routes.
    pub fn require_self_or_admin(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.id == user_id || self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Not authorized to access this profile".to_string(),
            ))
        }
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Access denied, token missing".to_string()))?;

        let claims = state.tokens.verify(token).map_err(|e| {
            tracing::debug!("rejected bearer token: {e}");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        // The token outlives the account: a valid signature for a deleted
        // user must not authenticate.
        let user = db::users::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            email: user.email,
            is_admin: user.is_admin,
        })
    }
}
