//! Per-user upload staging area.
//!
//! Staged files are transient: the remote service is the long-term store,
//! and every exit path of the upload saga purges the staged copy.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::Result;

/// Local staging area with one subdirectory per user.
#[derive(Debug, Clone)]
pub struct StagingArea {
    base_path: PathBuf,
}

impl StagingArea {
    /// Create a staging area rooted at the given path.
    ///
    /// The base directory is created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this staging area.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write uploaded bytes into the owner's staging directory.
    ///
    /// The staged name carries a UUID prefix so two in-flight uploads of the
    /// same filename never collide.
    pub fn stage(&self, owner_email: &str, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.base_path.join(owner_email);
        fs::create_dir_all(&dir)?;

        let staged = dir.join(format!("{}-{}", Uuid::new_v4(), file_name));
        fs::write(&staged, bytes)?;

        Ok(staged)
    }

    /// Remove a staged file.
    ///
    /// Returns `true` if the file existed. An already-missing file is not
    /// an error: the purge may run on multiple exit paths.
    pub fn purge(&self, staged: &Path) -> Result<bool> {
        match fs::remove_file(staged) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, StagingArea) {
        let temp_dir = TempDir::new().unwrap();
        let staging = StagingArea::new(temp_dir.path().join("staging")).unwrap();
        (temp_dir, staging)
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("staging");
        assert!(!path.exists());

        let staging = StagingArea::new(&path).unwrap();

        assert!(path.exists());
        assert_eq!(staging.base_path(), path);
    }

    #[test]
    fn test_stage_writes_under_owner_dir() {
        let (_temp_dir, staging) = setup();

        let staged = staging.stage("a@x.com", "clip.mp4", b"bytes").unwrap();

        assert!(staged.starts_with(staging.base_path().join("a@x.com")));
        assert_eq!(fs::read(&staged).unwrap(), b"bytes");
    }

    #[test]
    fn test_stage_same_name_does_not_collide() {
        let (_temp_dir, staging) = setup();

        let a = staging.stage("a@x.com", "clip.mp4", b"one").unwrap();
        let b = staging.stage("a@x.com", "clip.mp4", b"two").unwrap();

        assert_ne!(a, b);
        assert_eq!(fs::read(&a).unwrap(), b"one");
        assert_eq!(fs::read(&b).unwrap(), b"two");
    }

    #[test]
    fn test_purge() {
        let (_temp_dir, staging) = setup();

        let staged = staging.stage("a@x.com", "clip.mp4", b"bytes").unwrap();

        assert!(staging.purge(&staged).unwrap());
        assert!(!staged.exists());
        // Second purge reports the file as already gone
        assert!(!staging.purge(&staged).unwrap());
    }
}
