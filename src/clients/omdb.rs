use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use crate::config::ExternalConfig;

/// Thin proxy over the OMDb HTTP API. Responses are passed through as
/// raw JSON; the frontend owns their shape.
#[derive(Clone)]
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    pub fn new(config: &ExternalConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.request_timeout_seconds)))
            .build()
            .context("Failed to build OMDb HTTP client")?;

        Ok(Self {
            client,
            base_url: config.omdb_base_url.clone(),
            api_key: config.omdb_api_key.clone(),
        })
    }

    /// Whether an API key was configured at all.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Title search. `media_type` narrows results to "movie" or "series"
    /// when given.
    pub async fn search(
        &self,
        query: &str,
        media_type: Option<&str>,
    ) -> Result<serde_json::Value> {
        let mut params = vec![("apikey", self.api_key.as_str()), ("s", query)];
        if let Some(t) = media_type {
            params.push(("type", t));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("OMDb API error: {} - {}", status, body));
        }

        Ok(response.json().await?)
    }

    /// Full-plot lookup of a single title by `IMDb` id.
    pub async fn details(&self, imdb_id: &str) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("i", imdb_id),
                ("plot", "full"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("OMDb API error: {} - {}", status, body));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_without_key_is_unconfigured() {
        let client = OmdbClient::new(&ExternalConfig::default()).unwrap();
        assert!(!client.is_configured());

        let mut config = ExternalConfig::default();
        config.omdb_api_key = "k".to_string();
        assert!(OmdbClient::new(&config).unwrap().is_configured());
    }
}
