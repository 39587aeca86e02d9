//! Transaction calculator over the quotes currently on screen

use super::quote::DisplayQuote;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Side of the trade from the end user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Buy,
    Sell,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Direction::Buy => "buy",
                Direction::Sell => "sell",
            }
        )
    }
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(Direction::Buy),
            "sell" => Ok(Direction::Sell),
            _ => Err(anyhow::anyhow!("Invalid direction: {}", s)),
        }
    }
}

/// How a line item refers to a quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instrument {
    Code(String),
    Label(String),
}

impl Instrument {
    fn is_empty(&self) -> bool {
        match self {
            Instrument::Code(s) | Instrument::Label(s) => s.is_empty(),
        }
    }

    pub fn matches(&self, quote: &DisplayQuote) -> bool {
        match self {
            Instrument::Code(code) => quote.code == *code,
            Instrument::Label(label) => quote.label == *label,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub instrument: Instrument,
    pub quantity: Decimal,
}

impl LineItem {
    pub fn by_code(code: &str, quantity: Decimal) -> Self {
        Self {
            instrument: Instrument::Code(code.to_string()),
            quantity,
        }
    }

    pub fn by_label(label: &str, quantity: Decimal) -> Self {
        Self {
            instrument: Instrument::Label(label.to_string()),
            quantity,
        }
    }

    /// Whether the item has an instrument and a positive quantity.
    pub fn is_selected(&self) -> bool {
        !self.instrument.is_empty() && self.quantity > Decimal::ZERO
    }
}

/// Significant digits a `Decimal` holds exactly.
const DECIMAL_DIGITS: usize = 28;

/// Parses a price in decimal-comma notation, e.g. `"₺1.234,56"` -> `1234.56`.
///
/// Everything except digits and commas is discarded, then the first comma becomes the
/// decimal point. Digits after a second comma are ignored. Fraction digits beyond the
/// 28 significant digits a `Decimal` carries are truncated. Returns `None` when no
/// digits remain or the whole part alone does not fit.
pub fn parse_price_text(text: &str) -> Option<Decimal> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();

    let mut parts = kept.split(',');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    let whole = whole.trim_start_matches('0');
    let whole = if whole.is_empty() { "0" } else { whole };
    let fraction = &fraction[..fraction.len().min(DECIMAL_DIGITS.saturating_sub(whole.len()))];
    let number = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    };
    Decimal::from_str(&number).ok()
}

/// Unit price applied to `direction`: buying pays the institution's selling price,
/// selling receives its buying price.
pub fn unit_price(quote: &DisplayQuote, direction: Direction) -> Option<Decimal> {
    let text = match direction {
        Direction::Buy => &quote.selling_text,
        Direction::Sell => &quote.buying_text,
    };
    parse_price_text(text)
}

fn resolve<'a>(quotes: &'a [DisplayQuote], item: &LineItem) -> Option<&'a DisplayQuote> {
    if !item.is_selected() {
        return None;
    }
    quotes.iter().find(|q| item.instrument.matches(q))
}

/// `unit price × quantity` for one item, `None` when the item contributes nothing.
///
/// Amounts saturate at `Decimal::MAX` instead of overflowing.
pub fn subtotal(quotes: &[DisplayQuote], direction: Direction, item: &LineItem) -> Option<Decimal> {
    let quote = resolve(quotes, item)?;
    let price = unit_price(quote, direction)?;
    Some(price.checked_mul(item.quantity).unwrap_or(Decimal::MAX))
}

fn saturating_sum(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, |acc, amount| {
        acc.checked_add(amount).unwrap_or(Decimal::MAX)
    })
}

/// Sum of every item's subtotal. Saturates at `Decimal::MAX`.
pub fn compute_total(quotes: &[DisplayQuote], direction: Direction, items: &[LineItem]) -> Decimal {
    saturating_sum(
        items
            .iter()
            .filter_map(|item| subtotal(quotes, direction, item)),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub direction: Direction,
    pub subtotals: Vec<Option<Decimal>>,
    pub total: Decimal,
}

impl Calculation {
    /// True when at least one item resolved to a price.
    pub fn has_priced_items(&self) -> bool {
        self.subtotals.iter().any(Option::is_some)
    }

    /// True when the total hit the `Decimal` range limit and is only a lower bound.
    pub fn is_capped(&self) -> bool {
        self.total == Decimal::MAX
    }
}

/// Per-item subtotals plus the total, recomputed from scratch.
pub fn calculate(quotes: &[DisplayQuote], direction: Direction, items: &[LineItem]) -> Calculation {
    let subtotals: Vec<Option<Decimal>> = items
        .iter()
        .map(|item| subtotal(quotes, direction, item))
        .collect();
    let total = saturating_sum(subtotals.iter().flatten().copied());

    Calculation {
        direction,
        subtotals,
        total,
    }
}

/// Formats an amount as Turkish lira, e.g. `₺1.234,56`.
pub fn format_lira(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("{sign}₺{grouped},{fraction}")
}
