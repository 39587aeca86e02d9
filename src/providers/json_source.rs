use crate::core::quote::{FeedError, QuoteSource, RawQuote};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, warn};

/// Upstream price field; some feeds send text, others plain numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceField {
    Text(String),
    Number(f64),
}

impl PriceField {
    fn into_text(self) -> String {
        match self {
            PriceField::Text(s) => s,
            PriceField::Number(n) => n.to_string().replace('.', ","),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiQuote {
    #[serde(rename = "Kod", default)]
    code: String,
    #[serde(rename = "Aciklama", default)]
    description: String,
    #[serde(rename = "MobilAciklama")]
    mobile_description: Option<String>,
    #[serde(rename = "Alis", default)]
    buy: Option<PriceField>,
    #[serde(rename = "Satis", default)]
    sell: Option<PriceField>,
    #[serde(rename = "GuncellenmeZamani", default)]
    updated_at: Option<String>,
    #[serde(rename = "Change")]
    change: Option<f64>,
}

impl From<ApiQuote> for RawQuote {
    fn from(q: ApiQuote) -> Self {
        RawQuote {
            code: q.code,
            description: q.description,
            mobile_description: q.mobile_description,
            buy: q.buy.map(PriceField::into_text).unwrap_or_default(),
            sell: q.sell.map(PriceField::into_text).unwrap_or_default(),
            updated_at: q.updated_at.unwrap_or_default(),
            change: q.change,
        }
    }
}

/// Reads a JSON array of quotes, either straight from upstream or through the proxy.
pub struct JsonSource {
    url: String,
    client: reqwest::Client,
}

impl JsonSource {
    pub fn new(url: &str, client: reqwest::Client) -> Self {
        Self {
            url: url.to_string(),
            client,
        }
    }
}

#[async_trait]
impl QuoteSource for JsonSource {
    async fn fetch_raw(&self) -> Result<Vec<RawQuote>, FeedError> {
        debug!("Requesting quotes from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| FeedError::Transport {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FeedError::Transport {
                url: self.url.clone(),
                source,
            })?;

        let records: Vec<serde_json::Value> = match serde_json::from_str(&body) {
            Ok(data) => data,
            Err(e) => {
                error!(error = ?e, response = %body, "Failed to parse quote response");
                return Err(FeedError::Parse {
                    url: self.url.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let total = records.len();
        let quotes: Vec<RawQuote> = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<ApiQuote>(record.clone()) {
                Ok(quote) => Some(RawQuote::from(quote)),
                Err(e) => {
                    warn!(error = %e, %record, "Skipping malformed quote record");
                    None
                }
            })
            .collect();

        debug!(count = quotes.len(), total, "Received quotes from {}", self.url);
        Ok(quotes)
    }
}
