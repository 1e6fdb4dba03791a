//! Tracing initialisation for the `rubric` binary.
//!
//! Library crates only emit events; this is the one place a subscriber
//! is installed.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Later calls are ignored.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let registry = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    if json {
        registry.with(fmt_layer.json()).try_init().ok();
    } else {
        registry.with(fmt_layer).try_init().ok();
    }
}
