//! One import run, start to finish.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info};

use sumo_import_client::ContentApi;
use sumo_import_core::{DestinationFolder, Settings, SourceItem};

use crate::destination::resolve_destination;
use crate::driver::{ImportDriver, ImportFailure};
use crate::error::ImportError;
use crate::manifest::write_manifest;
use crate::source::resolve_sources;

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub destination: DestinationFolder,
    /// Every resolved item, in processing order, in a terminal state.
    pub items: Vec<SourceItem>,
    pub failures: Vec<ImportFailure>,
    /// Malformed files left out of the run.
    pub skipped: Vec<PathBuf>,
    pub manifest_path: PathBuf,
}

impl RunReport {
    /// Item count per final status label.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.items {
            *counts.entry(item.state.label().to_string()).or_insert(0) += 1;
        }
        counts
    }
}

fn log_source_map(items: &[SourceItem]) {
    for item in items {
        debug!("file: {} - {}", item.state, item.path.display());
    }
}

fn log_destination_map(destination: &DestinationFolder, items: &[SourceItem]) {
    for item in items {
        debug!("file: {} - {}", item.state, item.path.display());
    }
    debug!("folder: {} - {}", destination.id, destination.name);
}

/// Import everything under `source` into the personal folder `destination_name`.
///
/// The destination is resolved before the sources, so a source tree that
/// fails to resolve can still leave a newly created, empty folder behind.
pub async fn run_import(
    api: &dyn ContentApi,
    settings: &Settings,
    source: &Path,
    destination_name: &str,
) -> Result<RunReport, ImportError> {
    let started_at = Local::now();

    info!("Step 2/5: resolving destination folder '{}'", destination_name);
    let destination = resolve_destination(api, destination_name, settings.poll.settle).await?;

    info!("Step 3/5: resolving sources under {}", source.display());
    let scan = resolve_sources(source, settings.on_malformed)?;
    info!(
        scanned = scan.scanned,
        importable = scan.items.len(),
        excluded = scan.excluded,
        skipped = scan.skipped.len(),
        "Sources resolved"
    );
    log_source_map(&scan.items);

    info!("Step 4/5: importing {} item(s)", scan.items.len());
    let driver = ImportDriver::new(api, settings.poll);
    let outcome = driver.run(&destination, scan.items).await?;
    log_destination_map(&destination, &outcome.items);

    info!("Step 5/5: writing import manifest");
    let manifest_path = write_manifest(&settings.manifest, &started_at, &destination, &outcome.items)?;

    Ok(RunReport {
        started_at,
        destination,
        items: outcome.items,
        failures: outcome.failures,
        skipped: scan.skipped,
        manifest_path,
    })
}
