pub mod config;
pub mod error;
pub mod model;

pub use config::{
    Credentials, Endpoint, FileConfig, MalformedPolicy, ManifestSettings, Overrides, PollPolicy,
    Settings,
};
pub use error::*;
pub use model::*;
