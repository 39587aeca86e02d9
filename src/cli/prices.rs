use super::ui;
use crate::core::config::AppConfig;
use crate::core::poller::{Board, Poller};
use crate::core::{DisplayQuote, Domain, fetch_quotes};
use crate::providers;
use anyhow::{Context, Result};
use comfy_table::Cell;
use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

fn title(domain: Domain) -> &'static str {
    match domain {
        Domain::Gold => "Gold",
        Domain::Currency => "Currency",
    }
}

pub fn display_quotes(domain: Domain, quotes: &[DisplayQuote]) {
    println!("\n{}", ui::style_text(title(domain), ui::StyleType::Title));

    if quotes.is_empty() {
        println!(
            "{}",
            ui::style_text(
                &format!("No {domain} prices available yet."),
                ui::StyleType::Subtle
            )
        );
        return;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Instrument"),
        ui::header_cell("Buying"),
        ui::header_cell("Selling"),
        ui::header_cell("Change"),
        ui::header_cell("Updated"),
    ]);
    for quote in quotes {
        table.add_row(vec![
            Cell::new(&quote.label),
            ui::price_cell(&quote.buying_text),
            ui::price_cell(&quote.selling_text),
            ui::change_cell(quote.change),
            Cell::new(&quote.updated_at),
        ]);
    }
    println!("{table}");
}

/// Fetches each requested domain once and prints it.
pub async fn run(config: &AppConfig, domains: &[Domain]) -> Result<()> {
    let client = providers::http_client(config.poll.timeout())?;

    let spinner = ui::new_spinner("Fetching prices...");
    let fetches = domains.iter().map(|&domain| {
        let source = providers::build_source(config.sources.for_domain(domain), &client);
        async move { (domain, fetch_quotes(domain, source.as_ref()).await) }
    });
    let results = join_all(fetches).await;
    spinner.finish_and_clear();

    for (domain, quotes) in &results {
        display_quotes(*domain, quotes);
    }
    Ok(())
}

fn display_board(board: &Board) {
    let _ = console::Term::stdout().clear_screen();
    display_quotes(Domain::Gold, &board.gold);
    ui::print_separator();
    display_quotes(Domain::Currency, &board.currency);

    if let Some(updated_at) = board.updated_at {
        println!(
            "\n{}",
            ui::style_text(
                &format!("Last updated: {}", updated_at.format("%d.%m.%Y %H:%M:%S")),
                ui::StyleType::Subtle
            )
        );
    }
}

/// Keeps both tables on screen, refreshing on every poll until Ctrl-C.
pub async fn watch(config: &AppConfig) -> Result<()> {
    let client = providers::http_client(config.poll.timeout())?;
    let poller = Arc::new(Poller::new(
        providers::build_source(&config.sources.gold, &client),
        providers::build_source(&config.sources.currency, &client),
        config.poll.timeout(),
    ));
    let mut updates = poller.subscribe();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let runner = tokio::spawn(Arc::clone(&poller).run(config.poll.interval(), async move {
        let _ = stop_rx.await;
    }));

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let board = updates.borrow_and_update().clone();
                debug!(generation = board.generation, "Rendering board");
                display_board(&board);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let _ = stop_tx.send(());
    runner.await.context("Quote poller task failed")
}
