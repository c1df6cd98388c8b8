//! Response DTOs for the Web API.

use serde::Serialize;

use crate::file::{DeletionOutcome, FileAnalytics, SidecarRecord, UploadOutcome};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Upload result.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// File token.
    pub token: String,
    /// Resolved plan.
    pub plan: String,
    /// Bytes accounted after the upload.
    pub storage_used: u64,
    /// Current storage limit.
    pub storage_limit: u64,
    /// Remaining bytes.
    pub remaining: u64,
    /// Privacy of the stored file.
    pub privacy: String,
    /// Current view count.
    pub views: i64,
    /// Whether an existing file was updated.
    pub updated: bool,
}

impl From<UploadOutcome> for UploadResponse {
    fn from(o: UploadOutcome) -> Self {
        Self {
            token: o.token,
            plan: o.plan.to_string(),
            storage_used: o.storage_used,
            storage_limit: o.storage_limit,
            remaining: o.remaining,
            privacy: o.privacy.to_string(),
            views: o.views,
            updated: o.updated,
        }
    }
}

/// One entry in the per-user file listing.
#[derive(Debug, Serialize)]
pub struct FileListEntry {
    /// Display filename.
    pub file_name: String,
    /// Size in bytes.
    pub file_size: i64,
    /// File token.
    pub token: String,
    /// Original upload timestamp.
    pub upload_date: String,
    /// Last update timestamp.
    pub update_date: String,
}

impl From<SidecarRecord> for FileListEntry {
    fn from(r: SidecarRecord) -> Self {
        Self {
            file_name: r.file_name,
            file_size: r.file_size,
            token: r.token,
            upload_date: r.upload_date,
            update_date: r.update_date,
        }
    }
}

/// Deletion result.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Owner of the deleted file.
    pub owner_email: String,
    /// Bytes refunded to the quota.
    pub bytes_freed: u64,
}

impl From<DeletionOutcome> for DeleteResponse {
    fn from(o: DeletionOutcome) -> Self {
        Self {
            owner_email: o.owner_email,
            bytes_freed: o.bytes_freed,
        }
    }
}

/// Rename result.
#[derive(Debug, Serialize)]
pub struct RenameResponse {
    /// File token.
    pub token: String,
    /// New filename.
    pub file_name: String,
}

/// Analytics record.
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    /// File token.
    pub token: String,
    /// Owning user's email.
    pub owner_email: String,
    /// Size in bytes.
    pub size: i64,
    /// Privacy setting.
    pub privacy: String,
    /// View counter.
    pub views: i64,
    /// Creation timestamp.
    pub created_at: String,
}

impl From<FileAnalytics> for AnalyticsResponse {
    fn from(a: FileAnalytics) -> Self {
        Self {
            token: a.token,
            owner_email: a.owner_email,
            size: a.size,
            privacy: a.privacy,
            views: a.views,
            created_at: a.created_at,
        }
    }
}

/// User status with quota figures.
#[derive(Debug, Serialize)]
pub struct UserStatusResponse {
    /// User email.
    pub email: String,
    /// Plan name.
    pub plan: String,
    /// Bytes accounted.
    pub storage_used: u64,
    /// Storage limit.
    pub storage_limit: u64,
    /// Remaining bytes.
    pub remaining: u64,
}

/// Token issuance result.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Issued file token.
    pub token: String,
}

/// Download reference.
#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    /// Remote download URL.
    pub url: String,
}

/// Plan lookup result.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    /// User email.
    pub email: String,
    /// Plan name.
    pub plan: String,
}
