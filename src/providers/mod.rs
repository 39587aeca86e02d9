pub mod html_source;
pub mod json_source;

use crate::core::QuoteSource;
use crate::core::config::SourceConfig;
use anyhow::{Context, Result};
use html_source::HtmlSource;
use json_source::JsonSource;
use std::sync::Arc;
use std::time::Duration;

/// HTTP client shared by every source.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("altinkur/1.0")
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Instantiates the configured source strategy.
pub fn build_source(config: &SourceConfig, client: &reqwest::Client) -> Arc<dyn QuoteSource> {
    match config {
        SourceConfig::Json { url } => Arc::new(JsonSource::new(url, client.clone())),
        SourceConfig::Html { url, aliases } => {
            Arc::new(HtmlSource::new(url, client.clone(), aliases.clone()))
        }
    }
}
