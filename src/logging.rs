// src/logging.rs
//
// Tracing subscriber setup for binaries and tests.
//
// Library code only emits `tracing` events; installing a subscriber is the
// caller's choice. `RUST_LOG` selects the filter, defaulting to `info`.
// Output goes to stderr so stdout stays free for listings.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<bool> = OnceLock::new();

pub const DEFAULT_FILTER: &str = "info";

/// Install the global fmt subscriber once.
///
/// Returns whether a subscriber from this crate is active. Later calls are
/// no-ops, and a subscriber installed elsewhere first is left alone.
pub fn init_tracing() -> bool {
    *INITIALISED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr);
        Registry::default()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let first = init_tracing();
        assert_eq!(init_tracing(), first);
        tracing::info!("logging initialised in test");
    }
}
