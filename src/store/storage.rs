use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::store::error::StoreError;
use crate::store::item::{Item, ItemMap};

/// Remote collaborator that owns the canonical item records.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Fetch the full item mapping.
    async fn fetch_all(&self) -> std::result::Result<ItemMap, StoreError>;

    /// Persist one item and return the record the backend stored.
    async fn create(&self, item: &Item) -> std::result::Result<Item, StoreError>;

    /// Human-readable location, for the status bar and logs.
    fn describe(&self) -> String;
}

/// `FileStorage` over the REST-ish `/files` endpoint.
pub struct HttpFileStorage {
    base_url: String,
    client: reqwest::Client,
}

impl HttpFileStorage {
    /// Build a client for `base_url` (e.g. `http://localhost:3001`).
    ///
    /// Without a timeout, requests wait until the backend answers or the
    /// connection drops.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let url = reqwest::Url::parse(base_url)
            .map_err(|e| AppError::Http(format!("invalid server URL {}: {}", base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Http(format!(
                "unsupported scheme {} in {}",
                url.scheme(),
                base_url
            )));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| AppError::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.base_url)
    }
}

#[async_trait]
impl FileStorage for HttpFileStorage {
    async fn fetch_all(&self) -> std::result::Result<ItemMap, StoreError> {
        let url = self.files_url();
        tracing::debug!(%url, "GET");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        decode(resp).await
    }

    async fn create(&self, item: &Item) -> std::result::Result<Item, StoreError> {
        let url = self.files_url();
        tracing::debug!(%url, id = %item.id, "POST");
        let resp = self
            .client
            .post(&url)
            .json(item)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        decode(resp).await
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// Map a response to its JSON body, or to the matching error kind.
async fn decode<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> std::result::Result<T, StoreError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(StoreError::Response {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| StoreError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Unexpected(e.to_string()))
}
