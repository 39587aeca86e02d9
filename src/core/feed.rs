//! Price feed adapter: curates raw upstream records into display quotes

use super::quote::{Domain, DisplayQuote, QuoteSource, RawQuote};
use tracing::{debug, error};

/// Gold instruments shown, in display order: 24k gram first, then quarter/half/full
/// coins, 22k, and finally Ata and Reşat.
pub const GOLD_CODES: &[&str] = &["GA", "C", "Y", "T", "GAT22", "B", "A", "R"];

/// Currencies shown, in display order.
pub const CURRENCY_CODES: &[&str] = &[
    "USD", "EUR", "GBP", "CHF", "JPY", "SAR", "AUD", "CAD", "RUB", "AZN", "CNY", "RON", "AED",
    "KWD",
];

pub fn allow_list(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::Gold => GOLD_CODES,
        Domain::Currency => CURRENCY_CODES,
    }
}

/// Position of `code` in the domain's allow-list, `None` if it is not listed.
pub fn rank(domain: Domain, code: &str) -> Option<usize> {
    allow_list(domain).iter().position(|c| *c == code)
}

fn to_display(domain: Domain, raw: RawQuote) -> DisplayQuote {
    let text = raw
        .mobile_description
        .filter(|d| !d.is_empty())
        .unwrap_or(raw.description);
    let label = match domain {
        Domain::Gold => text,
        Domain::Currency => format!("{} - {}", raw.code, text),
    };

    DisplayQuote {
        label,
        buying_text: raw.buy,
        selling_text: raw.sell,
        code: raw.code,
        updated_at: raw.updated_at,
        change: raw.change,
    }
}

/// Stable sort by allow-list position. Unlisted codes go last in their original order.
pub fn sort_by_allow_list(domain: Domain, quotes: &mut [DisplayQuote]) {
    quotes.sort_by_key(|q| rank(domain, &q.code).unwrap_or(usize::MAX));
}

/// Filters, maps and orders raw records. Duplicate listed codes are all kept.
pub fn normalize(domain: Domain, raw: Vec<RawQuote>) -> Vec<DisplayQuote> {
    let total = raw.len();
    let mut quotes: Vec<DisplayQuote> = raw
        .into_iter()
        .filter(|r| rank(domain, &r.code).is_some())
        .map(|r| to_display(domain, r))
        .collect();
    sort_by_allow_list(domain, &mut quotes);

    debug!(%domain, total, kept = quotes.len(), "Normalized quotes");
    quotes
}

/// Fetches and normalizes quotes for `domain`. Never fails: any source error is logged
/// and an empty list is returned, meaning "no data yet".
pub async fn fetch_quotes(domain: Domain, source: &dyn QuoteSource) -> Vec<DisplayQuote> {
    match source.fetch_raw().await {
        Ok(raw) => normalize(domain, raw),
        Err(e) => {
            error!(%domain, error = %e, "Error fetching prices");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quote::FeedError;
    use async_trait::async_trait;

    fn raw(code: &str, description: &str) -> RawQuote {
        RawQuote {
            code: code.to_string(),
            description: description.to_string(),
            buy: "1,00".to_string(),
            sell: "2,00".to_string(),
            ..Default::default()
        }
    }

    fn codes(quotes: &[DisplayQuote]) -> Vec<&str> {
        quotes.iter().map(|q| q.code.as_str()).collect()
    }

    struct StaticSource(Vec<RawQuote>);

    #[async_trait]
    impl QuoteSource for StaticSource {
        async fn fetch_raw(&self) -> Result<Vec<RawQuote>, FeedError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl QuoteSource for FailingSource {
        async fn fetch_raw(&self) -> Result<Vec<RawQuote>, FeedError> {
            Err(FeedError::Status {
                url: "http://upstream/Gold".to_string(),
                status: 503,
            })
        }
    }

    #[test]
    fn test_normalize_filters_and_orders_gold() {
        let input = vec![
            raw("R", "Reşat"),
            raw("HH", "Has Altın"),
            raw("GA", "Gram Altın"),
            raw("C", "Çeyrek"),
            raw("XAU", "Ons"),
            raw("GAT22", "22 Ayar"),
        ];

        let quotes = normalize(Domain::Gold, input);

        assert_eq!(codes(&quotes), vec!["GA", "C", "GAT22", "R"]);
        assert_eq!(quotes[0].label, "Gram Altın");
        assert_eq!(quotes[0].buying_text, "1,00");
        assert_eq!(quotes[0].selling_text, "2,00");
    }

    #[test]
    fn test_normalize_currency_label_includes_code() {
        let mut usd = raw("USD", "Amerikan Doları");
        usd.mobile_description = Some("Dolar".to_string());
        let input = vec![raw("KWD", "Kuveyt Dinarı"), usd, raw("EUR", "Euro")];

        let quotes = normalize(Domain::Currency, input);

        assert_eq!(codes(&quotes), vec!["USD", "EUR", "KWD"]);
        assert_eq!(quotes[0].label, "USD - Dolar");
        assert_eq!(quotes[1].label, "EUR - Euro");
    }

    #[test]
    fn test_normalize_empty_mobile_description_falls_back() {
        let mut ga = raw("GA", "Gram Altın");
        ga.mobile_description = Some(String::new());

        let quotes = normalize(Domain::Gold, vec![ga]);
        assert_eq!(quotes[0].label, "Gram Altın");
    }

    #[test]
    fn test_normalize_order_independent_of_input_order() {
        let forward: Vec<RawQuote> = CURRENCY_CODES.iter().map(|c| raw(c, c)).collect();
        let mut backward = forward.clone();
        backward.reverse();

        let a = normalize(Domain::Currency, forward);
        let b = normalize(Domain::Currency, backward);

        assert_eq!(codes(&a), CURRENCY_CODES.to_vec());
        assert_eq!(codes(&a), codes(&b));
        for pair in a.windows(2) {
            assert!(
                rank(Domain::Currency, &pair[0].code) < rank(Domain::Currency, &pair[1].code)
            );
        }
    }

    #[test]
    fn test_normalize_keeps_duplicates_in_upstream_order() {
        let input = vec![
            raw("EUR", "Euro"),
            raw("USD", "first"),
            raw("USD", "second"),
        ];

        let quotes = normalize(Domain::Currency, input);

        assert_eq!(codes(&quotes), vec!["USD", "USD", "EUR"]);
        assert_eq!(quotes[0].label, "USD - first");
        assert_eq!(quotes[1].label, "USD - second");
    }

    #[test]
    fn test_sort_puts_unlisted_codes_last() {
        let mut quotes = normalize(Domain::Gold, vec![raw("T", "Tam"), raw("GA", "Gram")]);
        quotes.insert(0, to_display(Domain::Gold, raw("ZZ", "Unknown")));
        quotes.insert(1, to_display(Domain::Gold, raw("YY", "Other")));

        sort_by_allow_list(Domain::Gold, &mut quotes);

        assert_eq!(codes(&quotes), vec!["GA", "T", "ZZ", "YY"]);
    }

    #[test]
    fn test_normalize_carries_metadata() {
        let mut ga = raw("GA", "Gram Altın");
        ga.updated_at = "17.10.2026 10:15:00".to_string();
        ga.change = Some(-0.42);

        let quotes = normalize(Domain::Gold, vec![ga]);
        assert_eq!(quotes[0].updated_at, "17.10.2026 10:15:00");
        assert_eq!(quotes[0].change, Some(-0.42));
    }

    #[tokio::test]
    async fn test_fetch_quotes_normalizes_source_output() {
        let source = StaticSource(vec![raw("B", "Beşli"), raw("GA", "Gram Altın")]);
        let quotes = fetch_quotes(Domain::Gold, &source).await;
        assert_eq!(codes(&quotes), vec!["GA", "B"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_fetch_quotes_returns_empty_on_error() {
        let quotes = fetch_quotes(Domain::Gold, &FailingSource).await;
        assert!(quotes.is_empty());
    }
}
