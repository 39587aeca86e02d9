use crate::core::quote::{FeedError, QuoteSource, RawQuote};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::debug;

/// Scrapes quotes out of the `table tr` rows of an HTML page.
///
/// Cell 0 holds the instrument label, cells 2 and 3 the buying and selling prices.
/// `aliases` maps label text to an instrument code; unmapped labels are used as-is.
pub struct HtmlSource {
    url: String,
    client: reqwest::Client,
    aliases: HashMap<String, String>,
}

impl HtmlSource {
    pub fn new(url: &str, client: reqwest::Client, aliases: HashMap<String, String>) -> Self {
        Self {
            url: url.to_string(),
            client,
            aliases,
        }
    }
}

fn cell_text(cells: &[ElementRef<'_>], index: usize) -> String {
    cells
        .get(index)
        .map(|c| c.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Extracts one record per row with at least three cells. Shorter rows are skipped.
pub fn parse_table(
    html: &str,
    aliases: &HashMap<String, String>,
) -> Result<Vec<RawQuote>, String> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("table tr").map_err(|e| e.to_string())?;
    let cell_selector = Selector::parse("td").map_err(|e| e.to_string())?;

    let mut quotes = Vec::new();
    for row in document.select(&row_selector) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
        if cells.len() < 3 {
            continue;
        }

        let label = cell_text(&cells, 0);
        let code = aliases.get(&label).cloned().unwrap_or_else(|| label.clone());
        quotes.push(RawQuote {
            code,
            description: label,
            mobile_description: None,
            buy: cell_text(&cells, 2),
            sell: cell_text(&cells, 3),
            updated_at: String::new(),
            change: None,
        });
    }

    Ok(quotes)
}

#[async_trait]
impl QuoteSource for HtmlSource {
    async fn fetch_raw(&self) -> Result<Vec<RawQuote>, FeedError> {
        debug!("Requesting quote page from {}", self.url);

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

        let quotes = parse_table(&body, &self.aliases).map_err(|reason| FeedError::Parse {
            url: self.url.clone(),
            reason,
        })?;

        debug!(rows = quotes.len(), "Scraped quote rows from {}", self.url);
        Ok(quotes)
    }
}
