//! Core business logic abstractions

pub mod calculator;
pub mod config;
pub mod feed;
pub mod log;
pub mod poller;
pub mod quote;

// Re-export main types for cleaner imports
pub use calculator::{Direction, LineItem};
pub use feed::fetch_quotes;
pub use quote::{DisplayQuote, Domain, QuoteSource, RawQuote};
