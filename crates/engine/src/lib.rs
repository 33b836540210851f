//! Import orchestration: destination folder, sources, import jobs, manifest.

pub mod destination;
pub mod driver;
pub mod error;
pub mod manifest;
pub mod run;
pub mod source;

pub use destination::resolve_destination;
pub use driver::{DriverOutcome, ImportDriver, ImportFailure};
pub use error::ImportError;
pub use manifest::{write_manifest, MANIFEST_HEADER};
pub use run::{run_import, RunReport};
pub use source::{resolve_sources, SourceScan};
