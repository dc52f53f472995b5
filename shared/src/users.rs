use lambda_http::{http::StatusCode, Body, Response};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::records::RecordStore;
use crate::response;
use crate::s3::BlobStore;
use crate::types::{CreateUserRequest, User, UserPatch};

/// Parse a JSON object request body; an empty body reads as `{}`.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_value(serde_json::json!({})).map_err(invalid_body);
    }

    let value: serde_json::Value = serde_json::from_slice(body).map_err(invalid_body)?;
    if !value.is_object() {
        tracing::warn!("Request body is not a JSON object");
        return Err(ApiError::validation("Request body must be a JSON object"));
    }
    serde_json::from_value(value).map_err(invalid_body)
}

fn invalid_body(e: serde_json::Error) -> ApiError {
    tracing::warn!("Invalid request body: {}", e);
    ApiError::validation(format!("Invalid request body: {}", e))
}

pub(crate) fn require_user_id(user_id: Option<&str>) -> Result<&str, ApiError> {
    user_id.filter(|id| !id.is_empty()).ok_or_else(ApiError::missing_user_id)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Create a user with a fresh id and an empty attachment list
pub async fn create_user(records: &dyn RecordStore, body: &[u8]) -> Result<Response<Body>, ApiError> {
    let req: CreateUserRequest = parse_body(body)?;

    let name = non_blank(req.name).ok_or_else(|| ApiError::validation("Field 'nome' is required"))?;

    let user = User {
        user_id: uuid::Uuid::new_v4().to_string(),
        name,
        email: req.email,
        phone: req.phone,
        created_at: chrono::Utc::now().to_rfc3339(),
        updated_at: None,
        attachments: Vec::new(),
    };

    records.put_user(&user).await?;
    tracing::info!("User created: {}", user.user_id);

    response::success(
        StatusCode::CREATED,
        &serde_json::json!({
            "message": "User created successfully",
            "userId": user.user_id,
            "usuario": user,
        }),
    )
}

pub async fn get_user(records: &dyn RecordStore, user_id: Option<&str>) -> Result<Response<Body>, ApiError> {
    let user_id = require_user_id(user_id)?;

    let user = records
        .get_user(user_id)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    response::success(StatusCode::OK, &serde_json::json!({ "usuario": user }))
}

/// Update only the supplied fields; `updated_at` is always refreshed
pub async fn update_user(
    records: &dyn RecordStore,
    user_id: Option<&str>,
    body: &[u8],
) -> Result<Response<Body>, ApiError> {
    let user_id = require_user_id(user_id)?;
    let patch: UserPatch = parse_body(body)?;

    if let Some(name) = &patch.name {
        if name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            return Err(ApiError::validation("Field 'nome' cannot be empty"));
        }
    }

    let now = chrono::Utc::now().to_rfc3339();
    let user = records
        .update_user(user_id, &patch, &now)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    tracing::info!("User updated: {} (fields supplied: {})", user_id, !patch.is_empty());

    response::success(
        StatusCode::OK,
        &serde_json::json!({
            "message": "User updated successfully",
            "usuario": user,
        }),
    )
}

/// Delete a user and, best-effort, every attachment blob it owns
pub async fn delete_user(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    user_id: Option<&str>,
) -> Result<Response<Body>, ApiError> {
    let user_id = require_user_id(user_id)?;

    let user = records
        .get_user(user_id)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    let mut removed = 0usize;
    let mut failed = Vec::new();
    for attachment in &user.attachments {
        match blobs.delete_object(&attachment.storage_key).await {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::error!("Failed to delete file {}: {}", attachment.storage_key, e);
                failed.push(attachment.storage_key.clone());
            }
        }
    }

    records.delete_user(user_id).await?;
    tracing::info!(
        "User deleted: {} ({} files removed, {} failed)",
        user_id,
        removed,
        failed.len()
    );

    response::success(
        StatusCode::OK,
        &serde_json::json!({
            "message": "User and files removed successfully",
            "arquivos_removidos": removed,
            "arquivos_com_falha": failed,
        }),
    )
}
