//! File handlers: listing, metadata, rename, delete, thumbnails, download.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::db::{
    FileMetaRepository, NewFileToken, Privacy, TokenLedgerRepository,
};
use crate::file::{storage_location, DeletionCoordinator, DownloadGate, RenameCoordinator};
use crate::remote::RemoteStorage;
use crate::web::dto::{
    AnalyticsResponse, ApiResponse, CreateMetadataRequest, DeleteResponse, DownloadResponse,
    FileListEntry, ListFilesQuery, RenameResponse, RequestTokenRequest, TokenResponse,
    UpdateFileNameRequest,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /files - list a user's files from the sidecar cache.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ApiResponse<Vec<FileListEntry>>>, ApiError> {
    let records = state.sidecar.list(&query.email).map_err(|e| {
        tracing::error!("failed to list sidecar records: {}", e);
        ApiError::internal("failed to list files")
    })?;

    let entries = records.into_iter().map(FileListEntry::from).collect();
    Ok(Json(ApiResponse::new(entries)))
}

/// POST /create-metadata - out-of-band file metadata registration.
///
/// The encoding pipeline calls this with a token that may not have a ledger
/// row yet; the write is an upsert either way.
pub async fn create_metadata(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateMetadataRequest>,
) -> Result<Json<ApiResponse<AnalyticsResponse>>, ApiError> {
    let privacy: Privacy = body
        .privacy
        .as_deref()
        .map(|p| p.parse().unwrap_or_default())
        .unwrap_or_default();

    let meta = FileMetaRepository::new(state.db.pool());
    let row = meta.upsert(&body.token, body.size, privacy).await?;

    // The ledger row may not exist yet for out-of-band registrations
    let ledger = TokenLedgerRepository::new(state.db.pool());
    let owner_email = ledger
        .get_by_token(&body.token)
        .await?
        .map(|entry| entry.user_email)
        .unwrap_or_default();

    Ok(Json(ApiResponse::new(AnalyticsResponse {
        token: row.token,
        owner_email,
        size: row.size,
        privacy: row.privacy,
        views: row.views,
        created_at: row.created_at,
    })))
}

/// POST /api/update-file-name - rename a file.
pub async fn update_file_name(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateFileNameRequest>,
) -> Result<Json<ApiResponse<RenameResponse>>, ApiError> {
    let coordinator = RenameCoordinator::new(state.db.pool(), &state.remote, &state.sidecar);
    let outcome = coordinator.rename(&body.token, &body.new_name).await?;

    Ok(Json(ApiResponse::new(RenameResponse {
        token: outcome.token,
        file_name: outcome.file_name,
    })))
}

/// DELETE /request/delete/:token - delete a file.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let coordinator = DeletionCoordinator::new(state.db.pool(), &state.remote, &state.sidecar);
    let outcome = coordinator.delete(&token).await?;

    Ok(Json(ApiResponse::new(outcome.into())))
}

/// GET /api/thumbnail/:token - fetch the thumbnail, counting the view.
pub async fn thumbnail(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let gate = DownloadGate::new(state.db.pool(), &state.remote);
    let bytes = gate.thumbnail(&token).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, "image/jpeg")
        .body(Body::from(bytes))
        .map_err(|e| {
            tracing::error!("failed to build thumbnail response: {}", e);
            ApiError::internal("internal server error")
        })
}

/// DELETE /request/delete-thumbnail/:token - remove the remote thumbnail.
pub async fn delete_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let gate = DownloadGate::new(state.db.pool(), &state.remote);
    gate.delete_thumbnail(&token).await?;

    Ok(Json(ApiResponse::new(TokenResponse { token })))
}

/// POST /request-token - fallback token issuance for a (file, owner) pair.
///
/// If the ledger already has an entry for the location the existing token
/// is returned instead of minting a duplicate.
pub async fn request_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RequestTokenRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let ledger = TokenLedgerRepository::new(state.db.pool());
    let location = storage_location(&body.email, &body.file_name);

    if let Some(existing) = ledger.find_by_location(&location, &body.email).await? {
        return Ok(Json(ApiResponse::new(TokenResponse {
            token: existing.token,
        })));
    }

    let token = state.remote.issue_token(&body.file_name, &body.email).await?;

    ledger
        .insert(&NewFileToken {
            token: token.clone(),
            file_path: location,
            user_email: body.email.clone(),
            file_size: body.size.unwrap_or(0),
        })
        .await?;

    Ok(Json(ApiResponse::new(TokenResponse { token })))
}

/// GET /api/initiate-download/:token - plan-gated download reference.
pub async fn initiate_download(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<DownloadResponse>>, ApiError> {
    let gate = DownloadGate::new(state.db.pool(), &state.remote);
    let url = gate.initiate_download(&token).await?;

    Ok(Json(ApiResponse::new(DownloadResponse { url })))
}

/// GET /api/file-analytics/:token - analytics record for a file.
pub async fn file_analytics(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<AnalyticsResponse>>, ApiError> {
    let gate = DownloadGate::new(state.db.pool(), &state.remote);
    let analytics = gate.analytics(&token).await?;

    Ok(Json(ApiResponse::new(analytics.into())))
}
