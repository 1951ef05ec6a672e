use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install the global subscriber. `level` is an env-filter directive such as
/// `info` or `sk_scrapers=debug,info`; an invalid directive falls back to `info`.
pub fn init_logging(level: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    INIT.call_once(|| {
        let filter = EnvFilter::try_new(level).unwrap_or_else(|e| {
            eprintln!("Invalid log filter {:?} ({}), using info", level, e);
            EnvFilter::new("info")
        });
        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}
