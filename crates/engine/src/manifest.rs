//! Run manifest: one CSV row per processed item.

use std::borrow::Cow;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use tracing::{info, warn};

use sumo_import_core::{DestinationFolder, ManifestRecord, ManifestSettings, SourceItem};

use crate::error::ImportError;

pub const MANIFEST_HEADER: &str = "type,parent_name,parent_oid,dst_oid,src_file";

/// `<tag>.<YYYYMMDD>.<HHMMSS>.csv`
pub fn manifest_file_name(tag: &str, at: &DateTime<Local>) -> String {
    format!("{}.{}.csv", tag, at.format("%Y%m%d.%H%M%S"))
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Render one record as a CSV line (no trailing newline).
///
/// A source path that is not valid UTF-8 is written with replacement
/// characters, and a warning names it.
pub fn csv_row(record: &ManifestRecord) -> String {
    let src = record.src_file.to_string_lossy();
    if matches!(src, Cow::Owned(_)) {
        warn!(path = ?record.src_file, "Source path is not valid UTF-8; manifest row is lossy");
    }
    [
        csv_field(record.kind),
        csv_field(&record.parent_name),
        csv_field(&record.parent_oid),
        csv_field(&record.dst_oid),
        csv_field(&src),
    ]
    .join(",")
}

/// Append the manifest for a finished run and return its path.
///
/// The header is written only when the file is new or empty.
pub fn write_manifest(
    settings: &ManifestSettings,
    started_at: &DateTime<Local>,
    destination: &DestinationFolder,
    items: &[SourceItem],
) -> Result<PathBuf, ImportError> {
    let path = settings
        .dir
        .join(manifest_file_name(&settings.tag, started_at));
    info!("Creating import manifest: {}", path.display());

    let io_err = |source| ImportError::Manifest {
        path: path.clone(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(io_err)?;
    let needs_header = file.metadata().map_err(io_err)?.len() == 0;

    let mut out = String::new();
    if needs_header {
        out.push_str(MANIFEST_HEADER);
        out.push('\n');
    }
    for item in items {
        out.push_str(&csv_row(&ManifestRecord::for_item(destination, item)));
        out.push('\n');
    }
    file.write_all(out.as_bytes()).map_err(io_err)?;

    Ok(path)
}
