//! HTTP client for the Supabase Storage REST API and for downloading the
//! remote images referenced by import files.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::error::StorageError;
use crate::path::encode_object_path;
use crate::retry::retry_with_backoff;

/// Longest error body kept in [`StorageError::UnexpectedStatus`].
const MAX_ERROR_BODY_CHARS: usize = 300;

/// An image fetched from a remote URL, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteImage {
    pub bytes: Vec<u8>,
    /// `Content-Type` reported by the origin, if any.
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StorageErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Client for one storage bucket.
///
/// Transient errors (429, 5xx, network failures) on both download and upload
/// are retried with exponential backoff.
pub struct StorageClient {
    client: Client,
    base_url: String,
    key: String,
    bucket: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .field("key", &"[redacted]")
            .field("max_retries", &self.max_retries)
            .field("backoff_base_secs", &self.backoff_base_secs)
            .finish_non_exhaustive()
    }
}

impl StorageClient {
    /// Creates a client for `bucket` on the project at `base_url`
    /// (e.g. `https://abc.supabase.co`). Retries are disabled until
    /// [`StorageClient::with_retry`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        key: &str,
        bucket: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            bucket: bucket.to_string(),
            max_retries: 0,
            backoff_base_secs: 0,
        })
    }

    /// Sets the retry policy: up to `max_retries` extra attempts, waiting
    /// `backoff_base_secs * 2^(n-1)` seconds before retry `n`.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_secs: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_secs = backoff_base_secs;
        self
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Downloads `url` into memory.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidUrl`] — not an `http(s)` URL.
    /// - [`StorageError::NotFound`] — HTTP 404 (not retried).
    /// - [`StorageError::RateLimited`] / [`StorageError::UnexpectedStatus`] —
    ///   non-2xx after retries.
    /// - [`StorageError::EmptyBody`] — the response had no content.
    /// - [`StorageError::Http`] — network failure after retries.
    pub async fn fetch_remote(&self, url: &str) -> Result<RemoteImage, StorageError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StorageError::InvalidUrl {
                url: url.to_string(),
                reason: "only http and https URLs can be fetched".to_string(),
            });
        }

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            let response = self.client.get(url).send().await?;
            let response = check_status(response, url).await?;

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let bytes = response.bytes().await?.to_vec();
            if bytes.is_empty() {
                return Err(StorageError::EmptyBody {
                    url: url.to_string(),
                });
            }

            Ok(RemoteImage {
                bytes,
                content_type,
            })
        })
        .await
    }

    /// Uploads `image` to `path` inside the bucket, replacing any existing
    /// object, and returns the object's public URL.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidPath`] — empty, absolute or relative-segment path.
    /// - [`StorageError::UnexpectedStatus`] — the storage API rejected the upload.
    /// - [`StorageError::Http`] — network failure after retries.
    pub async fn upload(&self, path: &str, image: &RemoteImage) -> Result<String, StorageError> {
        let encoded = encode_object_path(path)?;
        let url = format!(
            "{}/storage/v1/object/{}/{encoded}",
            self.base_url, self.bucket
        );
        let content_type = image
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(&self.key)
                    .header("apikey", &self.key)
                    .header("x-upsert", "true")
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .body(image.bytes.clone())
                    .send()
                    .await?;
                check_status(response, &url).await?;
                Ok(())
            }
        })
        .await?;

        tracing::debug!(bucket = %self.bucket, path, "uploaded object");
        Ok(self.public_url_encoded(&encoded))
    }

    /// Public URL of an object in this bucket.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidPath`] if `path` is not a valid object path.
    pub fn public_url(&self, path: &str) -> Result<String, StorageError> {
        Ok(self.public_url_encoded(&encode_object_path(path)?))
    }

    fn public_url_encoded(&self, encoded: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{encoded}",
            self.base_url, self.bucket
        )
    }
}

/// Maps non-2xx responses to typed errors, passing successful responses through.
async fn check_status(response: Response, url: &str) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        return Err(StorageError::RateLimited {
            url: url.to_string(),
            retry_after_secs,
        });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(StorageError::NotFound {
            url: url.to_string(),
        });
    }

    let raw = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<StorageErrorBody>(&raw)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or(raw);

    Err(StorageError::UnexpectedStatus {
        status: status.as_u16(),
        url: url.to_string(),
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}
