//! Per-user sidecar metadata cache.
//!
//! One JSON file per (user, filename), used for fast per-user listing. This
//! is a display-oriented cache distinct from the relational `file_meta` row:
//! it is keyed by filename rather than token and may be stale or absent —
//! the workflows tolerate both.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{BrokerError, Result};

/// Sidecar record for one file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SidecarRecord {
    /// Display filename.
    pub file_name: String,
    /// Owning user's email.
    pub user_email: String,
    /// File size in bytes.
    pub file_size: i64,
    /// File token.
    pub token: String,
    /// Original upload timestamp (RFC 3339).
    pub upload_date: String,
    /// Last update timestamp (RFC 3339).
    pub update_date: String,
}

impl SidecarRecord {
    /// Build a fresh record with both timestamps set to now.
    pub fn new(file_name: &str, user_email: &str, file_size: i64, token: &str) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            file_name: file_name.to_string(),
            user_email: user_email.to_string(),
            file_size,
            token: token.to_string(),
            upload_date: now.clone(),
            update_date: now,
        }
    }
}

/// Store for per-user sidecar files.
#[derive(Debug, Clone)]
pub struct SidecarStore {
    base_path: PathBuf,
}

impl SidecarStore {
    /// Create a sidecar store rooted at the given path.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn record_path(&self, user_email: &str, file_name: &str) -> PathBuf {
        self.base_path
            .join(user_email)
            .join(format!("{file_name}.json"))
    }

    /// Write (or overwrite) the record for a file.
    pub fn write(&self, record: &SidecarRecord) -> Result<()> {
        let path = self.record_path(&record.user_email, &record.file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| BrokerError::Internal(format!("sidecar encode: {e}")))?;
        fs::write(&path, json)?;

        Ok(())
    }

    /// Read the record for a (user, filename) pair.
    pub fn read(&self, user_email: &str, file_name: &str) -> Result<Option<SidecarRecord>> {
        let path = self.record_path(user_email, file_name);

        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = serde_json::from_str(&json)
            .map_err(|e| BrokerError::Internal(format!("sidecar decode: {e}")))?;
        Ok(Some(record))
    }

    /// List all records for a user, skipping unreadable entries.
    pub fn list(&self, user_email: &str) -> Result<Vec<SidecarRecord>> {
        let dir = self.base_path.join(user_email);

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let Ok(json) = fs::read_to_string(entry.path()) else {
                continue;
            };
            // A stale or half-written sidecar must not break the listing
            if let Ok(record) = serde_json::from_str::<SidecarRecord>(&json) {
                records.push(record);
            }
        }
        records.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));

        Ok(records)
    }

    /// Find a user's record by token.
    pub fn find_by_token(&self, user_email: &str, token: &str) -> Result<Option<SidecarRecord>> {
        Ok(self
            .list(user_email)?
            .into_iter()
            .find(|r| r.token == token))
    }

    /// Rename a record, preserving the original upload timestamp and
    /// bumping the update timestamp.
    pub fn rename(&self, user_email: &str, old_name: &str, new_name: &str) -> Result<bool> {
        let Some(mut record) = self.read(user_email, old_name)? else {
            return Ok(false);
        };

        record.file_name = new_name.to_string();
        record.update_date = Utc::now().to_rfc3339();
        self.write(&record)?;

        let old_path = self.record_path(user_email, old_name);
        if let Err(e) = fs::remove_file(&old_path) {
            if e.kind() != io::ErrorKind::NotFound {
                return Err(e.into());
            }
        }

        Ok(true)
    }

    /// Remove the record for a (user, filename) pair.
    pub fn remove(&self, user_email: &str, file_name: &str) -> Result<bool> {
        let path = self.record_path(user_email, file_name);

        match fs::remove_file(&path) {
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

    fn setup() -> (TempDir, SidecarStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = SidecarStore::new(temp_dir.path().join("metadata")).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_write_and_read() {
        let (_temp_dir, store) = setup();
        let record = SidecarRecord::new("clip.mp4", "a@x.com", 1024, "tok-1");

        store.write(&record).unwrap();

        let read = store.read("a@x.com", "clip.mp4").unwrap().unwrap();
        assert_eq!(read, record);
    }

    #[test]
    fn test_read_missing() {
        let (_temp_dir, store) = setup();
        assert!(store.read("a@x.com", "nothing.mp4").unwrap().is_none());
    }

    #[test]
    fn test_list_per_user() {
        let (_temp_dir, store) = setup();

        store
            .write(&SidecarRecord::new("a.mp4", "a@x.com", 1, "tok-1"))
            .unwrap();
        store
            .write(&SidecarRecord::new("b.mp4", "a@x.com", 2, "tok-2"))
            .unwrap();
        store
            .write(&SidecarRecord::new("c.mp4", "b@x.com", 3, "tok-3"))
            .unwrap();

        assert_eq!(store.list("a@x.com").unwrap().len(), 2);
        assert_eq!(store.list("b@x.com").unwrap().len(), 1);
        assert!(store.list("nobody@x.com").unwrap().is_empty());
    }

    #[test]
    fn test_list_skips_corrupt_entries() {
        let (_temp_dir, store) = setup();

        store
            .write(&SidecarRecord::new("a.mp4", "a@x.com", 1, "tok-1"))
            .unwrap();
        let dir = store.base_path().join("a@x.com");
        fs::write(dir.join("broken.json"), "{not json").unwrap();

        let records = store.list("a@x.com").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].token, "tok-1");
    }

    #[test]
    fn test_find_by_token() {
        let (_temp_dir, store) = setup();

        store
            .write(&SidecarRecord::new("a.mp4", "a@x.com", 1, "tok-1"))
            .unwrap();

        let found = store.find_by_token("a@x.com", "tok-1").unwrap().unwrap();
        assert_eq!(found.file_name, "a.mp4");
        assert!(store.find_by_token("a@x.com", "tok-9").unwrap().is_none());
    }

    #[test]
    fn test_rename_preserves_upload_date() {
        let (_temp_dir, store) = setup();

        let mut record = SidecarRecord::new("old.mp4", "a@x.com", 1, "tok-1");
        record.upload_date = "2024-01-01T00:00:00+00:00".to_string();
        record.update_date = "2024-01-01T00:00:00+00:00".to_string();
        store.write(&record).unwrap();

        assert!(store.rename("a@x.com", "old.mp4", "new.mp4").unwrap());

        assert!(store.read("a@x.com", "old.mp4").unwrap().is_none());
        let renamed = store.read("a@x.com", "new.mp4").unwrap().unwrap();
        assert_eq!(renamed.file_name, "new.mp4");
        assert_eq!(renamed.token, "tok-1");
        assert_eq!(renamed.upload_date, "2024-01-01T00:00:00+00:00");
        assert_ne!(renamed.update_date, "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_rename_missing_record() {
        let (_temp_dir, store) = setup();
        assert!(!store.rename("a@x.com", "ghost.mp4", "new.mp4").unwrap());
    }

    #[test]
    fn test_remove() {
        let (_temp_dir, store) = setup();

        store
            .write(&SidecarRecord::new("a.mp4", "a@x.com", 1, "tok-1"))
            .unwrap();

        assert!(store.remove("a@x.com", "a.mp4").unwrap());
        assert!(!store.remove("a@x.com", "a.mp4").unwrap());
    }
}
