//! Tracing setup for binaries and hosts embedding the runtime.
//!
//! The library crates only emit events; installing a subscriber is left to
//! whoever owns the process, through [`init_tracing`].

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;

/// Install a formatting subscriber on stderr.
///
/// `RUST_LOG` selects what is shown and defaults to `info`; `debug` raises the
/// default to `debug` when `RUST_LOG` is unset. Fails if a global subscriber
/// is already installed.
pub fn init_tracing(debug: bool) -> Result<(), TryInitError> {
    let default = if debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(debug)
        .with_line_number(debug)
        .with_filter(env_filter);

    Registry::default().with(fmt_layer).try_init()
}
