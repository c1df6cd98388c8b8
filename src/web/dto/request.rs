//! Request DTOs for the Web API.

use serde::Deserialize;

/// Body for `POST /create-metadata` (out-of-band registration).
#[derive(Debug, Deserialize)]
pub struct CreateMetadataRequest {
    /// File token.
    pub token: String,
    /// Size in bytes.
    pub size: i64,
    /// Privacy ("public" or "private"), defaults to public.
    #[serde(default)]
    pub privacy: Option<String>,
}

/// Body for `POST /api/update-file-name`.
#[derive(Debug, Deserialize)]
pub struct UpdateFileNameRequest {
    /// File token.
    pub token: String,
    /// New display name.
    pub new_name: String,
}

/// Body for `POST /request-token`.
#[derive(Debug, Deserialize)]
pub struct RequestTokenRequest {
    /// File name to register.
    pub file_name: String,
    /// Owning user's email.
    pub email: String,
    /// Size in bytes, if known.
    #[serde(default)]
    pub size: Option<i64>,
}

/// Body for `POST /check-user-status`.
#[derive(Debug, Deserialize)]
pub struct CheckUserStatusRequest {
    /// User email.
    pub email: String,
}

/// Body for `POST /api/ste` (apply latest payment to the plan).
#[derive(Debug, Deserialize)]
pub struct SyncPlanRequest {
    /// User email.
    pub email: String,
}

/// Query for `GET /files`.
#[derive(Debug, Deserialize)]
pub struct ListFilesQuery {
    /// User email whose files to list.
    pub email: String,
}
