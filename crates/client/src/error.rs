//! Transport errors. Every one of them is fatal for the run.

use reqwest::Method;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote answered with a non-2xx status.
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: Method,
        url: String,
        status: u16,
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("endpoint discovery failed: {0}")]
    Discovery(String),

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}
