use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

use super::auth::{map_duplicate_email, validate_new_user};

#[derive(Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub image_url: String,
    pub user: User,
}

/// An uploaded file plus the fields that came with it in the same
/// multipart body.
struct ProfileForm {
    name: Option<String>,
    email: Option<String>,
    image: Option<UploadedImage>,
}

struct UploadedImage {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

pub async fn create_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    auth.require_admin()?;

    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();

    validate_new_user(name, &email, &req.password)?;

    if db::users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let user = db::users::create(&state.pool, name, &email, &pw_hash)
        .await
        .map_err(map_duplicate_email)?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    auth.require_admin()?;
    let users = db::users::list_all(&state.pool).await?;
    Ok(Json(users))
}

pub async fn get_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    auth.require_self_or_admin(id)?;

    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Accepts either a JSON body or a multipart form carrying an optional
/// `profile_image` file alongside the editable fields.
pub async fn update_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<User>, AppError> {
    auth.require_self_or_admin(id)?;

    let form = parse_profile_form(&headers, body).await?;
    apply_update(&state, id, form).await.map(Json)
}

pub async fn delete_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    auth.require_admin()?;

    if !db::users::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(DeleteResponse {
        message: "User deleted successfully".to_string(),
    }))
}

pub async fn get_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<User>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let form = ProfileForm {
        name: req.name,
        email: req.email,
        image: None,
    };
    apply_update(&state, auth.id, form).await.map(Json)
}

/// Store the uploaded image and overwrite the caller's image reference.
/// This write touches nothing but the reference itself.
pub async fn upload_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError> {
    let form = parse_profile_form(&headers, body).await?;

    let image = form
        .image
        .ok_or_else(|| AppError::BadRequest("No image file provided.".to_string()))?;
    ensure_image(&image)?;

    let image_url = state
        .images
        .save(&image.filename, image.data)
        .await
        .map_err(AppError::Internal)?;

    let user = db::users::update_profile_image(&state.pool, auth.id, &image_url)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UploadResponse {
        message: "Profile image uploaded successfully".to_string(),
        image_url,
        user,
    }))
}

/// Shared partial-update path: omitted or empty fields keep their stored
/// values, a supplied email is re-validated and lowercased, and an attached
/// image replaces the stored reference.
async fn apply_update(
    state: &SharedState,
    id: Uuid,
    form: ProfileForm,
) -> Result<User, AppError> {
    let name = form
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let email = match form.email.map(|e| e.trim().to_lowercase()) {
        Some(e) if e.is_empty() => None,
        Some(e) => {
            if !super::auth::email_is_valid(&e) {
                return Err(AppError::BadRequest("Invalid email format.".to_string()));
            }
            Some(e)
        }
        None => None,
    };

    let image_url = match form.image {
        Some(image) => {
            ensure_image(&image)?;
            Some(
                state
                    .images
                    .save(&image.filename, image.data)
                    .await
                    .map_err(AppError::Internal)?,
            )
        }
        None => None,
    };

    db::users::update(
        &state.pool,
        id,
        name.as_deref(),
        email.as_deref(),
        image_url.as_deref(),
    )
    .await
    .map_err(map_duplicate_email)?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

fn ensure_image(image: &UploadedImage) -> Result<(), AppError> {
    match &image.content_type {
        Some(ct) if !ct.starts_with("image/") => Err(AppError::BadRequest(
            "Only image uploads are accepted.".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Parse a profile edit from either a JSON body or a multipart form.
/// Multipart text fields map onto the same names as the JSON shape; the
/// file field is `profile_image`.
async fn parse_profile_form(headers: &HeaderMap, body: Bytes) -> Result<ProfileForm, AppError> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json");

    if content_type.contains("multipart/form-data") {
        return parse_multipart(content_type, body).await;
    }

    let req: UpdateUserRequest = if body.is_empty() {
        UpdateUserRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?
    };

    Ok(ProfileForm {
        name: req.name,
        email: req.email,
        image: None,
    })
}

async fn parse_multipart(content_type: &str, body: Bytes) -> Result<ProfileForm, AppError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| AppError::BadRequest("Missing multipart boundary".to_string()))?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut form = ProfileForm {
        name: None,
        email: None,
        image: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "profile_image" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(|m| m.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("File read error: {e}")))?;
            form.image = Some(UploadedImage {
                filename,
                content_type,
                data,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("Field read error: {e}")))?;
        match name.as_str() {
            "name" => form.name = Some(value),
            "email" => form.email = Some(value),
            _ => {}
        }
    }

    Ok(form)
}
