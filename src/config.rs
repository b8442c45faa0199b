//! Runtime settings read from the environment.
//!
//! | Variable             | Effect                                   |
//! |----------------------|------------------------------------------|
//! | `ANONLANG_PRECISION` | significant digits for decimal math      |
//! | `ANONLANG_LOG`       | log filter when `RUST_LOG` is unset      |
//! | `HOME`               | where the interactive history is kept    |

use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::decimal::MathContext;

const HISTORY_FILE: &str = ".anonlang_history";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub precision: u64,
    pub log_filter: String,
    pub history_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            precision: MathContext::DEFAULT_PRECISION,
            log_filter: "warn".to_string(),
            history_file: env::var("HOME").ok().map(|h| PathBuf::from(h).join(HISTORY_FILE)),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key/value source. Invalid values are
    /// reported and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config {
            history_file: lookup("HOME").map(|h| PathBuf::from(h).join(HISTORY_FILE)),
            ..Config::default()
        };

        if let Some(raw) = lookup("ANONLANG_PRECISION") {
            match raw.trim().parse::<u64>() {
                Ok(n) if n > 0 => config.precision = n,
                _ => warn!(value = %raw, "ignoring ANONLANG_PRECISION, expected a positive integer"),
            }
        }
        if let Some(filter) = lookup("ANONLANG_LOG") {
            if !filter.trim().is_empty() {
                config.log_filter = filter.trim().to_string();
            }
        }
        config
    }
}
