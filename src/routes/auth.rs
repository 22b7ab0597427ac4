use std::sync::LazyLock;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::Claims;
use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

// Absent fields deserialize to empty strings so they fail validation with
// the same 400 as explicitly empty ones.
#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}

/// The minimal projection login hands back to the client.
#[derive(Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

pub(crate) fn email_is_valid(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Validate the fields of a new account. Shared by self-registration and
/// admin-initiated creation.
pub(crate) fn validate_new_user(
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), AppError> {
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide all required fields.".to_string(),
        ));
    }

    if !email_is_valid(email) {
        return Err(AppError::BadRequest("Invalid email format.".to_string()));
    }

    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long."
        )));
    }

    Ok(())
}

/// Map a unique-violation on `users.email` to the same conflict outcome as
/// the pre-insert lookup, so a concurrent duplicate registration is
/// indistinguishable from a sequential one.
pub(crate) fn map_duplicate_email(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("User already exists".to_string())
        }
        _ => AppError::Database(err),
    }
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();

    validate_new_user(name, &email, &req.password)?;

    if db::users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // Self-registration never creates an admin, whatever the body claimed.
    let user = db::users::create(&state.pool, name, &email, &pw_hash)
        .await
        .map_err(map_duplicate_email)?;

    let token = state
        .tokens
        .issue(&Claims::session(user.id, false))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            token,
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = req.email.trim().to_lowercase();

    // Unknown email and wrong password must be indistinguishable.
    let user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify(&req.password, &user.password_hash)
        .map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = state
        .tokens
        .issue(&Claims::session(user.id, false))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: UserSummary {
            id: user.id,
            email: user.email,
            is_admin: user.is_admin,
        },
    }))
}

pub async fn admin_login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = req.email.trim().to_lowercase();

    let user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    // The password is checked before the role flag: a caller who cannot
    // authenticate learns nothing about whether the account is an admin.
    let valid = password::verify(&req.password, &user.password_hash)
        .map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    if !user.is_admin {
        return Err(AppError::Forbidden(
            "Access denied. Admin privileges required.".to_string(),
        ));
    }

    let token = state
        .tokens
        .issue(&Claims::session(user.id, true))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(LoginResponse {
        message: "Admin login successful".to_string(),
        token,
        user: UserSummary {
            id: user.id,
            email: user.email,
            is_admin: true,
        },
    }))
}
