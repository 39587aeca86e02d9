use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Picks the crate log level: `--verbose` wins, a long-running server logs at info,
/// anything else is silent unless `RUST_LOG` says otherwise.
pub fn log_level(verbose: bool, serving: bool) -> (LevelFilter, &'static str) {
    if verbose {
        (LevelFilter::DEBUG, "debug")
    } else if serving {
        (LevelFilter::INFO, "info")
    } else {
        (LevelFilter::OFF, "off")
    }
}

pub fn init_logging(verbose: bool, serving: bool) {
    let (level_filter, level) = log_level(verbose, serving);
    let app_filter = Targets::new()
        .with_target("altinkur", level_filter)
        .with_target("tower_http", level_filter);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(app_filter)
        .with(env_filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(true, false).0, LevelFilter::DEBUG);
        assert_eq!(log_level(true, true).0, LevelFilter::DEBUG);
        assert_eq!(log_level(false, true).1, "info");
        assert_eq!(log_level(false, false).0, LevelFilter::OFF);
    }
}
