//! Periodic refresh of both quote domains

use super::feed::fetch_quotes;
use super::quote::{DisplayQuote, Domain, QuoteSource};
use chrono::{DateTime, Local};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Latest applied poll result.
#[derive(Debug, Clone, Default)]
pub struct Board {
    pub gold: Vec<DisplayQuote>,
    pub currency: Vec<DisplayQuote>,
    pub updated_at: Option<DateTime<Local>>,
    /// Sequence number of the poll that produced this board, 0 before the first one.
    pub generation: u64,
}

impl Board {
    pub fn quotes(&self, domain: Domain) -> &[DisplayQuote] {
        match domain {
            Domain::Gold => &self.gold,
            Domain::Currency => &self.currency,
        }
    }
}

pub struct Poller {
    gold: Arc<dyn QuoteSource>,
    currency: Arc<dyn QuoteSource>,
    timeout: Duration,
    next_seq: AtomicU64,
    board: watch::Sender<Board>,
}

impl Poller {
    pub fn new(
        gold: Arc<dyn QuoteSource>,
        currency: Arc<dyn QuoteSource>,
        timeout: Duration,
    ) -> Self {
        let (board, _) = watch::channel(Board::default());
        Self {
            gold,
            currency,
            timeout,
            next_seq: AtomicU64::new(0),
            board,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Board> {
        self.board.subscribe()
    }

    pub fn snapshot(&self) -> Board {
        self.board.borrow().clone()
    }

    async fn fetch(&self, domain: Domain, source: &dyn QuoteSource) -> Vec<DisplayQuote> {
        match tokio::time::timeout(self.timeout, fetch_quotes(domain, source)).await {
            Ok(quotes) => quotes,
            Err(_) => {
                error!(%domain, timeout = ?self.timeout, "Timed out fetching prices");
                Vec::new()
            }
        }
    }

    /// Fetches both domains concurrently and publishes the result unless a poll that
    /// started later has already been applied. Returns whether the result was applied.
    pub async fn poll_once(&self) -> bool {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, "Polling quotes");

        let (gold, currency) = futures::join!(
            self.fetch(Domain::Gold, self.gold.as_ref()),
            self.fetch(Domain::Currency, self.currency.as_ref())
        );
        self.apply(seq, gold, currency)
    }

    fn apply(&self, seq: u64, gold: Vec<DisplayQuote>, currency: Vec<DisplayQuote>) -> bool {
        self.board.send_if_modified(|board| {
            if seq <= board.generation {
                debug!(seq, applied = board.generation, "Discarding stale poll result");
                return false;
            }
            *board = Board {
                gold,
                currency,
                updated_at: Some(Local::now()),
                generation: seq,
            };
            true
        })
    }

    /// Polls immediately, then on every `interval` tick until `shutdown` resolves.
    /// Each poll runs in its own task so a slow upstream never delays the next tick.
    /// Polls still in flight at shutdown are aborted.
    pub async fn run(self: Arc<Self>, interval: Duration, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        let mut polls = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let poller = Arc::clone(&self);
                    polls.spawn(async move {
                        poller.poll_once().await;
                    });
                }
                Some(joined) = polls.join_next(), if !polls.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Poll task failed");
                    }
                }
                _ = &mut shutdown => {
                    info!(in_flight = polls.len(), "Stopping quote poller");
                    break;
                }
            }
        }

        polls.abort_all();
        while polls.join_next().await.is_some() {}
    }
}
