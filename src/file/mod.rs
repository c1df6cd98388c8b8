//! Upload, deletion, rename and download-gating workflows.
//!
//! Each multi-step flow is a saga: no distributed transaction exists across
//! the local disk, the relational store and the remote service. Later steps
//! assume earlier steps succeeded, and the failure path that detects a
//! partial state cleans it up.

mod delete;
mod download;
mod rename;
mod sidecar;
mod staging;
mod upload;

pub use delete::{DeletionCoordinator, DeletionOutcome};
pub use download::{DownloadGate, FileAnalytics};
pub use rename::{RenameCoordinator, RenameOutcome};
pub use sidecar::{SidecarRecord, SidecarStore};
pub use staging::StagingArea;
pub use upload::{UploadCoordinator, UploadOutcome, UploadRequest};

use std::path::Path;

/// File extensions accepted by the upload path.
pub const ALLOWED_MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "webm", "m4v", "mpg", "mpeg", "wmv", "flv",
];

/// Extract the lowercase extension of a filename, if any.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

/// Whether the filename carries an allowed media extension.
pub fn is_allowed_media(file_name: &str) -> bool {
    match file_extension(file_name) {
        Some(ext) => ALLOWED_MEDIA_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// Remote-facing storage location for a file.
///
/// The (location, owner) pair is what the ledger's re-upload check keys on.
pub fn storage_location(owner_email: &str, file_name: &str) -> String {
    format!("{owner_email}/{file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("clip.mp4"), Some("mp4".to_string()));
        assert_eq!(file_extension("CLIP.MP4"), Some("mp4".to_string()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension("noext"), None);
    }

    #[test]
    fn test_is_allowed_media() {
        assert!(is_allowed_media("clip.mp4"));
        assert!(is_allowed_media("movie.MOV"));
        assert!(is_allowed_media("show.webm"));
        assert!(!is_allowed_media("notes.txt"));
        assert!(!is_allowed_media("binary"));
    }

    #[test]
    fn test_storage_location() {
        assert_eq!(storage_location("a@x.com", "clip.mp4"), "a@x.com/clip.mp4");
    }
}
