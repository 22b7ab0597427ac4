use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::{Claims, TokenError, TokenKeys};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub profile_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Issue a short-lived (7 day) token bound to this account, e.g. for
    /// links handed out outside the normal login flow.
    pub fn auth_token(&self, keys: &TokenKeys) -> Result<String, TokenError> {
        keys.issue(&Claims::new(self.id, self.is_admin, Duration::days(7)))
    }
}
