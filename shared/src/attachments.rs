use base64::Engine;
use lambda_http::{http::StatusCode, Body, Response};
use std::time::Duration;

use crate::error::ApiError;
use crate::records::RecordStore;
use crate::response;
use crate::s3::BlobStore;
use crate::types::{Attachment, DownloadLink, UploadAttachmentRequest, DEFAULT_CONTENT_TYPE};
use crate::users::{parse_body, require_user_id};

/// Upload a base64 file to the blob store and link it to the user
pub async fn upload_attachment(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    user_id: Option<&str>,
    body: &[u8],
) -> Result<Response<Body>, ApiError> {
    let user_id = require_user_id(user_id)?;
    let req: UploadAttachmentRequest = parse_body(body)?;

    let encoded = req
        .file_base64
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation("Field 'arquivo_base64' is required"))?;
    let filename = req
        .filename
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Field 'nome_arquivo' is required"))?;
    let content_type = req
        .content_type
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    if records.get_user(user_id).await?.is_none() {
        return Err(ApiError::user_not_found());
    }

    // Line-wrapped payloads: whitespace is not part of the alphabet
    let compact: Vec<u8> = encoded.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    let file_bytes = base64::engine::general_purpose::STANDARD
        .decode(&compact)
        .map_err(|e| ApiError::Internal(format!("Failed to decode base64: {}", e)))?;

    let file_id = uuid::Uuid::new_v4().to_string();
    let storage_key = Attachment::storage_key_for(user_id, &file_id, &filename);

    tracing::info!("Uploading {} bytes to {}", file_bytes.len(), storage_key);
    blobs.put_object(&storage_key, file_bytes, &content_type).await?;

    let attachment = Attachment {
        file_id,
        filename,
        storage_key,
        content_type,
        uploaded_at: chrono::Utc::now().to_rfc3339(),
    };

    if !records.append_attachment(user_id, &attachment).await? {
        // Record deleted between the existence check and the append
        tracing::warn!("User {} vanished during upload, removing {}", user_id, attachment.storage_key);
        if let Err(e) = blobs.delete_object(&attachment.storage_key).await {
            tracing::error!("Failed to remove orphaned file {}: {}", attachment.storage_key, e);
        }
        return Err(ApiError::user_not_found());
    }

    response::success(
        StatusCode::CREATED,
        &serde_json::json!({
            "message": "File uploaded successfully",
            "arquivo": attachment,
        }),
    )
}

/// List presigned download links for every attachment of a user
pub async fn list_downloads(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    user_id: Option<&str>,
    expires_in: Duration,
) -> Result<Response<Body>, ApiError> {
    let user_id = require_user_id(user_id)?;

    let user = records
        .get_user(user_id)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    if user.attachments.is_empty() {
        return response::success(
            StatusCode::OK,
            &serde_json::json!({
                "message": "User has no files",
                "arquivos": [],
            }),
        );
    }

    let mut links = Vec::with_capacity(user.attachments.len());
    let mut omitted = 0usize;
    for attachment in user.attachments {
        match blobs.presigned_get_url(&attachment.storage_key, expires_in).await {
            Ok(download_url) => links.push(DownloadLink {
                file_id: attachment.file_id,
                filename: attachment.filename,
                download_url,
                uploaded_at: attachment.uploaded_at,
            }),
            Err(e) => {
                tracing::error!("Failed to generate URL for {}: {}", attachment.storage_key, e);
                omitted += 1;
            }
        }
    }

    response::success(
        StatusCode::OK,
        &serde_json::json!({
            "arquivos": links,
            "arquivos_omitidos": omitted,
        }),
    )
}
