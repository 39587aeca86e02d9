use super::ui;
use crate::core::calculator::{self, Calculation, Direction, Instrument, LineItem, format_lira};
use crate::core::config::AppConfig;
use crate::core::{DisplayQuote, Domain, fetch_quotes};
use crate::providers;
use anyhow::{Context, Result, bail};
use comfy_table::{Cell, CellAlignment};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses `NAME=QUANTITY`; a bare `NAME` means one unit. The quantity accepts either
/// `.` or `,` as decimal separator.
///
/// A name made only of ASCII letters and digits is an instrument code (case-insensitive).
/// Anything else, e.g. `Reşat` or `USD - Dolar`, is matched against quote labels verbatim.
pub fn parse_item(text: &str) -> Result<LineItem> {
    let (name, quantity) = match text.rsplit_once('=') {
        Some((name, quantity)) => (name.trim(), quantity.trim()),
        None => (text.trim(), "1"),
    };
    if name.is_empty() {
        bail!("Missing instrument code in '{text}'");
    }

    let quantity = Decimal::from_str(&quantity.replace(',', "."))
        .with_context(|| format!("Invalid quantity in '{text}'"))?;
    if name.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(LineItem::by_code(&name.to_uppercase(), quantity))
    } else {
        Ok(LineItem::by_label(name, quantity))
    }
}

fn instrument_name(quotes: &[DisplayQuote], item: &LineItem) -> String {
    if let Some(quote) = quotes.iter().find(|q| item.instrument.matches(q)) {
        return quote.label.clone();
    }
    match &item.instrument {
        Instrument::Code(name) | Instrument::Label(name) => name.clone(),
    }
}

fn unit_price_of(quotes: &[DisplayQuote], direction: Direction, item: &LineItem) -> Option<Decimal> {
    let quote = quotes.iter().find(|q| item.instrument.matches(q))?;
    calculator::unit_price(quote, direction)
}

pub fn display_calculation(
    domain: Domain,
    quotes: &[DisplayQuote],
    items: &[LineItem],
    calc: &Calculation,
) {
    let (subtotal_header, total_label, summary) = match calc.direction {
        Direction::Buy => ("Cost", "Total cost", "You will pay"),
        Direction::Sell => ("Value", "Total value", "You will receive"),
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Instrument"),
        ui::header_cell("Quantity"),
        ui::header_cell("Unit price"),
        ui::header_cell(subtotal_header),
    ]);
    for (item, &subtotal) in items.iter().zip(&calc.subtotals) {
        let unit = subtotal.and_then(|_| unit_price_of(quotes, calc.direction, item));
        table.add_row(vec![
            Cell::new(instrument_name(quotes, item)),
            Cell::new(item.quantity.normalize()).set_alignment(CellAlignment::Right),
            unit.map_or_else(|| ui::na_cell(false), |u| ui::price_cell(&format_lira(u))),
            subtotal.map_or_else(|| ui::na_cell(true), |s| ui::price_cell(&format_lira(s))),
        ]);
    }
    println!("{table}");

    let total = format_lira(calc.total);
    let purchase = match (calc.direction, domain) {
        (Direction::Buy, Domain::Gold) => "for your gold purchase",
        (Direction::Buy, Domain::Currency) => "for your currency purchase",
        (Direction::Sell, Domain::Gold) => "for your gold sale",
        (Direction::Sell, Domain::Currency) => "for your currency sale",
    };
    println!(
        "\n{}: {}",
        ui::style_text(total_label, ui::StyleType::TotalLabel),
        ui::style_text(&total, ui::StyleType::TotalValue)
    );
    println!(
        "{}",
        ui::style_text(&format!("{summary} {total} {purchase}"), ui::StyleType::Subtle)
    );
    if calc.is_capped() {
        println!(
            "{}",
            ui::style_text(
                "Amounts exceed the supported range; the total shown is a lower bound.",
                ui::StyleType::Error
            )
        );
    }
}

pub async fn run(
    config: &AppConfig,
    domain: Domain,
    direction: Direction,
    raw_items: &[String],
) -> Result<()> {
    let items = raw_items
        .iter()
        .map(|s| parse_item(s))
        .collect::<Result<Vec<_>>>()?;

    let client = providers::http_client(config.poll.timeout())?;
    let source = providers::build_source(config.sources.for_domain(domain), &client);

    let spinner = ui::new_spinner("Fetching prices...");
    let quotes = fetch_quotes(domain, source.as_ref()).await;
    spinner.finish_and_clear();

    let calc = calculator::calculate(&quotes, direction, &items);
    if !calc.has_priced_items() {
        let reason = if quotes.is_empty() {
            format!("No {domain} prices available yet.")
        } else {
            format!("Nothing to calculate: no item matches a {domain} quote with a positive quantity.")
        };
        println!("{}", ui::style_text(&reason, ui::StyleType::Error));
        return Ok(());
    }

    display_calculation(domain, &quotes, &items, &calc);
    Ok(())
}
