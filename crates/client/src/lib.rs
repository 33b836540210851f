//! HTTP transport for the Sumo Logic content API.
//!
//! [`SumoClient`] owns the authenticated session and the raw verbs; the
//! [`ContentApi`] trait is the narrow surface the import engine depends on.

pub mod client;
pub mod content;
pub mod error;

pub use client::{SumoClient, DEFAULT_API_BASE};
pub use content::{ContentApi, ImportOptions};
pub use error::ApiError;
