//! Logging setup
//!
//! `CONSOUL_LOG` takes an `EnvFilter` directive (e.g. `consoul_core=debug`).
//! Without it the level comes from the number of `-v` flags.

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CONSOUL_LOG";

/// Install the global subscriber, writing to stderr
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(0), "warn");
        assert_eq!(default_level(2), "debug");
        assert_eq!(default_level(9), "trace");
    }
}
