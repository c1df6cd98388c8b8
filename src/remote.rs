//! Client for the external storage/encoding server.
//!
//! The server owns the physical bytes, encoding and thumbnails; this module
//! only specifies the contract the broker relies on. Coordinators take the
//! [`RemoteStorage`] trait so tests can inject a double.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::RemoteConfig;
use crate::db::Privacy;
use crate::{BrokerError, Result};

/// Operations the broker expects from the remote storage server.
///
/// All calls carry an owner-scoped bearer credential. Failures surface as
/// transport errors with no defined partial-success semantics.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Transfer file bytes to the remote server.
    ///
    /// Returns the canonical token for the stored object.
    async fn receive(
        &self,
        bytes: Vec<u8>,
        owner_email: &str,
        file_name: &str,
        privacy: Privacy,
    ) -> Result<String>;

    /// Rename a stored file.
    async fn rename_file(&self, token: &str, new_name: &str, owner_email: &str) -> Result<String>;

    /// Delete a stored file.
    async fn delete_file(&self, token: &str, owner_email: &str) -> Result<()>;

    /// Fetch the thumbnail JPEG for a stored file.
    async fn fetch_thumbnail(&self, token: &str) -> Result<Vec<u8>>;

    /// Delete the thumbnail for a stored file.
    async fn delete_thumbnail(&self, token: &str) -> Result<()>;

    /// Issue a token for a (file name, owner) pair without a transfer.
    ///
    /// Fallback path for files registered out of band.
    async fn issue_token(&self, file_name: &str, owner_email: &str) -> Result<String>;

    /// Resolve a direct download URL for a token.
    async fn resolve_download(&self, token: &str) -> Result<String>;
}

#[async_trait]
impl<R: RemoteStorage + ?Sized> RemoteStorage for Arc<R> {
    async fn receive(
        &self,
        bytes: Vec<u8>,
        owner_email: &str,
        file_name: &str,
        privacy: Privacy,
    ) -> Result<String> {
        (**self).receive(bytes, owner_email, file_name, privacy).await
    }

    async fn rename_file(&self, token: &str, new_name: &str, owner_email: &str) -> Result<String> {
        (**self).rename_file(token, new_name, owner_email).await
    }

    async fn delete_file(&self, token: &str, owner_email: &str) -> Result<()> {
        (**self).delete_file(token, owner_email).await
    }

    async fn fetch_thumbnail(&self, token: &str) -> Result<Vec<u8>> {
        (**self).fetch_thumbnail(token).await
    }

    async fn delete_thumbnail(&self, token: &str) -> Result<()> {
        (**self).delete_thumbnail(token).await
    }

    async fn issue_token(&self, file_name: &str, owner_email: &str) -> Result<String> {
        (**self).issue_token(file_name, owner_email).await
    }

    async fn resolve_download(&self, token: &str) -> Result<String> {
        (**self).resolve_download(token).await
    }
}

/// Token payload returned by the remote server.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Download payload returned by the remote server.
#[derive(Debug, Deserialize)]
struct DownloadResponse {
    url: String,
}

/// HTTP implementation of [`RemoteStorage`] over reqwest.
#[derive(Debug, Clone)]
pub struct HttpRemoteStorage {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpRemoteStorage {
    /// Build a client from the remote configuration.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BrokerError::Config(format!("remote client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder, owner_email: &str) -> reqwest::RequestBuilder {
        req.bearer_auth(&self.api_key)
            .header("x-owner-email", owner_email)
    }

    /// Map a non-success status through the error variant for the operation.
    fn check(
        resp: reqwest::Response,
        op: &str,
        wrap: fn(String) -> BrokerError,
    ) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(wrap(format!("remote {op} returned {}", resp.status())))
        }
    }
}

#[async_trait]
impl RemoteStorage for HttpRemoteStorage {
    async fn receive(
        &self,
        bytes: Vec<u8>,
        owner_email: &str,
        file_name: &str,
        privacy: Privacy,
    ) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("owner", owner_email.to_string())
            .text("privacy", privacy.as_str().to_string());

        let resp = self
            .authorize(self.client.post(self.url("/receive")), owner_email)
            .multipart(form)
            .send()
            .await?;
        let resp = Self::check(resp, "receive", BrokerError::UploadFailed)?;

        let body: TokenResponse = resp.json().await?;
        Ok(body.token)
    }

    async fn rename_file(&self, token: &str, new_name: &str, owner_email: &str) -> Result<String> {
        let resp = self
            .authorize(self.client.post(self.url("/rename-file")), owner_email)
            .json(&serde_json::json!({
                "token": token,
                "newName": new_name,
                "owner": owner_email,
            }))
            .send()
            .await
            .map_err(|e| BrokerError::Internal(format!("remote rename: {e}")))?;
        let resp = Self::check(resp, "rename", BrokerError::Internal)?;

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| BrokerError::Internal(format!("remote rename: {e}")))?;
        Ok(body.token)
    }

    async fn delete_file(&self, token: &str, owner_email: &str) -> Result<()> {
        let resp = self
            .authorize(
                self.client.delete(self.url(&format!("/file/{token}"))),
                owner_email,
            )
            .send()
            .await
            .map_err(|e| BrokerError::DeletionFailed(e.to_string()))?;
        Self::check(resp, "delete", BrokerError::DeletionFailed)?;

        Ok(())
    }

    async fn fetch_thumbnail(&self, token: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(self.url(&format!("/thumbnail/{token}")))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| BrokerError::Internal(format!("remote thumbnail fetch: {e}")))?;
        let resp = Self::check(resp, "thumbnail fetch", BrokerError::Internal)?;

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| BrokerError::Internal(format!("remote thumbnail fetch: {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn delete_thumbnail(&self, token: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/thumbnail/{token}")))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| BrokerError::DeletionFailed(e.to_string()))?;
        Self::check(resp, "thumbnail delete", BrokerError::DeletionFailed)?;

        Ok(())
    }

    async fn issue_token(&self, file_name: &str, owner_email: &str) -> Result<String> {
        let resp = self
            .authorize(self.client.post(self.url("/issue-token")), owner_email)
            .json(&serde_json::json!({
                "fileName": file_name,
                "owner": owner_email,
            }))
            .send()
            .await
            .map_err(|e| BrokerError::Internal(format!("remote token issue: {e}")))?;
        let resp = Self::check(resp, "token issue", BrokerError::Internal)?;

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| BrokerError::Internal(format!("remote token issue: {e}")))?;
        Ok(body.token)
    }

    async fn resolve_download(&self, token: &str) -> Result<String> {
        let resp = self
            .client
            .get(self.url(&format!("/download/{token}")))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| BrokerError::Internal(format!("remote download resolve: {e}")))?;
        let resp = Self::check(resp, "download resolve", BrokerError::Internal)?;

        let body: DownloadResponse = resp
            .json()
            .await
            .map_err(|e| BrokerError::Internal(format!("remote download resolve: {e}")))?;
        Ok(body.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bad_gateway() -> reqwest::Response {
        reqwest::Response::from(
            axum::http::Response::builder()
                .status(502)
                .body("upstream unavailable")
                .unwrap(),
        )
    }

    #[test]
    fn test_check_passes_success_through() {
        let resp = reqwest::Response::from(
            axum::http::Response::builder().status(200).body("").unwrap(),
        );
        assert!(HttpRemoteStorage::check(resp, "receive", BrokerError::UploadFailed).is_ok());
    }

    #[test]
    fn test_check_names_operation_and_variant() {
        let err = HttpRemoteStorage::check(bad_gateway(), "rename", BrokerError::Internal)
            .unwrap_err();
        assert!(matches!(err, BrokerError::Internal(_)));
        assert!(err.to_string().contains("remote rename returned 502"));

        let err = HttpRemoteStorage::check(bad_gateway(), "receive", BrokerError::UploadFailed)
            .unwrap_err();
        assert!(matches!(err, BrokerError::UploadFailed(_)));
        assert!(err.to_string().contains("remote receive returned 502"));

        let err = HttpRemoteStorage::check(bad_gateway(), "delete", BrokerError::DeletionFailed)
            .unwrap_err();
        assert!(matches!(err, BrokerError::DeletionFailed(_)));
        assert!(err.to_string().contains("remote delete returned 502"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = RemoteConfig {
            base_url: "http://storage.example.com/".to_string(),
            api_key: "k".to_string(),
            timeout_secs: 5,
        };
        let client = HttpRemoteStorage::new(&config).unwrap();
        assert_eq!(
            client.url("/thumbnail/abc"),
            "http://storage.example.com/thumbnail/abc"
        );
    }
}
