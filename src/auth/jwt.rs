use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session tokens issued by register/login/admin-login live this long.
pub const SESSION_TTL_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub admin: bool,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, admin: bool, ttl: Duration) -> Self {
        Self {
            sub: user_id,
            admin,
            exp: (Utc::now() + ttl).timestamp(),
        }
    }

    pub fn session(user_id: Uuid, admin: bool) -> Self {
        Self::new(user_id, admin, Duration::days(SESSION_TTL_DAYS))
    }
}

/// Why a presented token was rejected. Both outcomes surface to the caller
/// as the same 401; the distinction exists for logging.
#[derive(Debug)]
pub enum TokenError {
    Expired,
    Invalid,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "token expired"),
            TokenError::Invalid => write!(f, "malformed token or bad signature"),
        }
    }
}

/// Signing and verification keys, built once from the configured secret and
/// immutable afterwards.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding).map_err(|_| TokenError::Invalid)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}
