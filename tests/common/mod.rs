//! Shared test helpers: an in-process remote storage double.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use mediabroker::db::Privacy;
use mediabroker::error::BrokerError;
use mediabroker::remote::RemoteStorage;
use mediabroker::Result;

/// Configurable double for the remote storage server.
///
/// Issues deterministic tokens and records every call so tests can assert
/// on what crossed the wire.
#[derive(Default)]
pub struct MockRemote {
    counter: AtomicUsize,
    pub fail_receive: bool,
    pub fail_delete: bool,
    pub received: Mutex<Vec<(String, String, usize)>>,
    pub deleted: Mutex<Vec<String>>,
    pub renamed: Mutex<Vec<(String, String)>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_receive() -> Self {
        Self {
            fail_receive: true,
            ..Self::default()
        }
    }

    pub fn failing_delete() -> Self {
        Self {
            fail_delete: true,
            ..Self::default()
        }
    }

    fn next_token(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("remote-tok-{n}")
    }
}

#[async_trait]
impl RemoteStorage for MockRemote {
    async fn receive(
        &self,
        bytes: Vec<u8>,
        owner_email: &str,
        file_name: &str,
        _privacy: Privacy,
    ) -> Result<String> {
        if self.fail_receive {
            return Err(BrokerError::UploadFailed("mock transfer refused".into()));
        }
        self.received.lock().unwrap().push((
            owner_email.to_string(),
            file_name.to_string(),
            bytes.len(),
        ));
        Ok(self.next_token())
    }

    async fn rename_file(&self, token: &str, new_name: &str, _owner_email: &str) -> Result<String> {
        self.renamed
            .lock()
            .unwrap()
            .push((token.to_string(), new_name.to_string()));
        Ok(token.to_string())
    }

    async fn delete_file(&self, token: &str, _owner_email: &str) -> Result<()> {
        if self.fail_delete {
            return Err(BrokerError::DeletionFailed("mock delete refused".into()));
        }
        self.deleted.lock().unwrap().push(token.to_string());
        Ok(())
    }

    async fn fetch_thumbnail(&self, _token: &str) -> Result<Vec<u8>> {
        Ok(b"\xff\xd8jpeg".to_vec())
    }

    async fn delete_thumbnail(&self, _token: &str) -> Result<()> {
        Ok(())
    }

    async fn issue_token(&self, _file_name: &str, _owner_email: &str) -> Result<String> {
        Ok(self.next_token())
    }

    async fn resolve_download(&self, token: &str) -> Result<String> {
        Ok(format!("https://cdn.example.com/{token}"))
    }
}
