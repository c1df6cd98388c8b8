//! Upload handler.

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::db::Privacy;
use crate::file::{UploadCoordinator, UploadRequest};
use crate::web::dto::{ApiResponse, UploadResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /upload - multipart file upload.
///
/// Expected parts: `file` (bytes + filename), `email`, optional `privacy`
/// ("public"/"private") and optional `size` (declared size for the quota
/// check; defaults to the received length).
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let mut file_name: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;
    let mut email: Option<String> = None;
    let mut privacy = Privacy::Public;
    let mut declared_size: Option<u64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart payload: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                let original_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read file: {e}")))?;
                file_name = original_name;
                content = Some(bytes.to_vec());
            }
            Some("email") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid email field: {e}")))?;
                email = Some(value);
            }
            Some("privacy") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid privacy field: {e}")))?;
                privacy = value.parse().unwrap_or_default();
            }
            Some("size") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid size field: {e}")))?;
                declared_size = value.parse().ok();
            }
            _ => {}
        }
    }

    let file_name = file_name.ok_or_else(|| ApiError::bad_request("missing file part"))?;
    let content = content.ok_or_else(|| ApiError::bad_request("missing file part"))?;
    let email = email.ok_or_else(|| ApiError::bad_request("missing email part"))?;

    let mut request = UploadRequest::new(email, file_name, content).with_privacy(privacy);
    if let Some(size) = declared_size {
        request = request.with_declared_size(size);
    }

    let coordinator = UploadCoordinator::new(
        state.db.pool(),
        &state.remote,
        &state.staging,
        &state.sidecar,
    );
    let outcome = coordinator.upload(&request).await?;

    Ok(Json(ApiResponse::new(outcome.into())))
}
