//! Logging setup.
//!
//! The dashboard owns the terminal, so log lines go to a file instead of
//! stdout/stderr. `RUST_LOG` wins over the `-v` flags when it is set.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Level used when `RUST_LOG` is not set.
pub fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize tracing, appending to `log_file`.
pub fn init_logging(log_file: &str, verbose: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(verbose >= 2)
                        .with_writer(Mutex::new(file)),
                )
                .with(env_filter)
                .init();
            debug!(path = log_file, verbose, "logging initialized");
        }
        Err(e) => {
            // No file means no logs; writing to the terminal would corrupt the UI.
            tracing_subscriber::registry().with(env_filter).init();
            warn!("could not open log file {}: {}", log_file, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_the_level() {
        assert_eq!(default_level(0), "info");
        assert_eq!(default_level(1), "debug");
        assert_eq!(default_level(4), "trace");
    }
}
