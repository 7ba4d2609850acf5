//! reqwest による取得

use crate::error::Result;
use std::time::Duration;
use wordcard_common::{Error, Fetcher};

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("wordcard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> wordcard_common::Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::SourceUnavailable(format!("HTTP {}: {}", status.as_u16(), url)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("{}: {}", url, e)))?;
        tracing::debug!(url, bytes = bytes.len(), "取得完了");
        Ok(bytes.to_vec())
    }

    async fn exists(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url, error = %e, "存在確認に失敗");
                false
            }
        }
    }
}
