use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use crate::config::ExternalConfig;

/// Proxy over the Google Books volumes API. No key needed for search.
#[derive(Clone)]
pub struct GoogleBooksClient {
    client: Client,
    base_url: String,
}

impl GoogleBooksClient {
    pub fn new(config: &ExternalConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.request_timeout_seconds)))
            .build()
            .context("Failed to build Google Books HTTP client")?;

        Ok(Self {
            client,
            base_url: config.google_books_base_url.clone(),
        })
    }

    pub async fn search(&self, query: &str) -> Result<serde_json::Value> {
        let url = format!("{}/volumes", self.base_url);

        let response = self.client.get(&url).query(&[("q", query)]).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Google Books API error: {} - {}",
                status,
                body
            ));
        }

        Ok(response.json().await?)
    }
}
