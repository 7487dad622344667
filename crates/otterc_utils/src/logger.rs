use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "otterc_inline=info,otter_inline_tuner=info";

/// Initialise tracing subscriber once per process.
pub fn init_logging() {
    init_logging_with(DEFAULT_DIRECTIVE);
}

/// Initialise tracing with a fallback filter directive. `RUST_LOG` still wins
/// when it is set. Only the first call in a process has any effect.
pub fn init_logging_with(default_directive: &str) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    });
}
