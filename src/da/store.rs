use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::da::BlobStore;
use crate::error::{DaError, Result};
use crate::utils::to_hex_prefixed;

/// HTTP client for a DA storage service exposing `/put/` and `/get/0x<ref>`
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    url: String,
    client: Client,
}

impl HttpBlobStore {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn store(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Err(DaError::InvalidInput("refusing to store an empty payload"));
        }

        let url = format!("{}/put/", self.url);
        debug!("Storing {} bytes at {}", data.len(), url);
        let resp = self
            .client
            .post(url)
            .header("content-type", "application/octet-stream")
            .body(data.to_vec())
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(DaError::RemoteError {
                action: "store data",
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    async fn fetch(&self, reference: &[u8]) -> Result<Vec<u8>> {
        let url = format!("{}/get/{}", self.url, to_hex_prefixed(reference));
        debug!("Fetching {}", url);
        let resp = self.client.get(url).send().await?;

        match resp.status() {
            StatusCode::OK => Ok(resp.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(DaError::NotFound {
                reference: to_hex_prefixed(reference),
            }),
            status => Err(DaError::RemoteError {
                action: "get preimage",
                status: status.as_u16(),
            }),
        }
    }
}
