//! Tracing initialisation.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. The filter comes from `RUST_LOG` and falls
/// back to `default_level`; `json` switches to one JSON object per line.
///
/// Safe to call more than once; only the first call takes effect.
pub fn init(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let _ = if json {
        builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init()
    } else {
        builder.try_init()
    };
}
