//! Quote types and the upstream source abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Market a quote belongs to. Each domain has its own upstream and allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Gold,
    Currency,
}

impl Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Domain::Gold => "gold",
                Domain::Currency => "currency",
            }
        )
    }
}

impl FromStr for Domain {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gold" => Ok(Domain::Gold),
            "currency" => Ok(Domain::Currency),
            _ => Err(anyhow::anyhow!("Invalid domain: {}", s)),
        }
    }
}

/// One upstream record, before filtering. Prices keep their source text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawQuote {
    pub code: String,
    pub description: String,
    pub mobile_description: Option<String>,
    pub buy: String,
    pub sell: String,
    pub updated_at: String,
    pub change: Option<f64>,
}

/// Canonical record shown to the user and read by the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayQuote {
    pub label: String,
    pub buying_text: String,
    pub selling_text: String,
    pub code: String,
    pub updated_at: String,
    pub change: Option<f64>,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to parse response from {url}: {reason}")]
    Parse { url: String, reason: String },
}

/// Fetches raw records for one domain.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_raw(&self) -> Result<Vec<RawQuote>, FeedError>;
}
