//! Tracing subscriber setup for binaries embedding the store.

use std::env;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "TASKBOARD_LOG";
/// `json` or `compact` (default).
pub const LOG_FORMAT_ENV: &str = "TASKBOARD_LOG_FORMAT";

fn default_directive(debug: bool) -> &'static str {
    if debug {
        "taskboard=debug,info"
    } else {
        "taskboard=info,warn"
    }
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(env::var("DEBUG").is_ok())));

    let format = env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_ansi(false))
            .try_init()
            .is_ok(),
        _ => registry.with(fmt::layer().compact()).try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_widens_default_filter() {
        assert_eq!(default_directive(false), "taskboard=info,warn");
        assert_eq!(default_directive(true), "taskboard=debug,info");
    }

    #[test]
    fn second_install_is_refused() {
        init_tracing();
        assert!(!init_tracing());
    }
}
