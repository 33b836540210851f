use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling [`Settings`](crate::Settings).
///
/// All of these are detected before any network call is made.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing credential: {name} (set {flag}, {env} or the config file)")]
    MissingCredential {
        name: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    #[error("invalid {what} '{value}': expected {expected}")]
    InvalidPair {
        what: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for '{key}' in config {}: '{value}'", path.display())]
    InvalidValue {
        path: PathBuf,
        key: String,
        value: String,
    },

    #[error("endpoint should not end with a slash: {0}")]
    TrailingSlash(String),
}
