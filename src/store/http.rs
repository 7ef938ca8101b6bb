use async_trait::async_trait;
use url::Url;

use super::PhotoStore;
use crate::error::StoreError;

/// Store backed by a static web server
pub struct HttpStore {
    client: reqwest::Client,
    base: Url,
}

impl HttpStore {
    pub fn new(base: &str) -> Result<Self, StoreError> {
        // Url::join drops the last segment unless the base ends with '/'
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };

        let base = Url::parse(&normalized).map_err(|e| StoreError::Transport {
            uri: base.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }

    fn url_for(&self, path: &str) -> Result<Url, StoreError> {
        self.base.join(path).map_err(|e| StoreError::Transport {
            uri: path.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl PhotoStore for HttpStore {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let url = self.url_for(path)?;
        let uri = url.to_string();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Transport {
                uri: uri.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(uri));
        }
        if !status.is_success() {
            return Err(StoreError::Http {
                uri,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| StoreError::Transport {
            uri: uri.clone(),
            reason: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }

    fn resolve(&self, path: &str) -> String {
        self.url_for(path)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| path.to_string())
    }
}
