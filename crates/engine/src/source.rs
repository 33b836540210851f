//! Source resolution: turn a file or directory into the ordered work list.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use sumo_import_core::{MalformedPolicy, SourceItem};

use crate::error::ImportError;

/// Result of resolving a source root.
#[derive(Debug, Clone, Default)]
pub struct SourceScan {
    /// Importable documents, in walk order, all `Pending`.
    pub items: Vec<SourceItem>,
    /// Files looked at.
    pub scanned: usize,
    /// Valid documents that are not importable content (folders, `itemType` wrappers).
    pub excluded: usize,
    /// Malformed files and unreadable entries left out under [`MalformedPolicy::Skip`].
    pub skipped: Vec<PathBuf>,
}

/// Read and parse one JSON document.
pub(crate) fn load_document(path: &Path) -> Result<Value, ImportError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|e| ImportError::MalformedSource {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// A document is importable content when it has no `itemType` key and its
/// `type` is anything but `"Folder"`.
fn is_importable(doc: &Value, path: &Path) -> Result<bool, ImportError> {
    let malformed = |reason: &str| ImportError::MalformedSource {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let obj = doc
        .as_object()
        .ok_or_else(|| malformed("document is not a JSON object"))?;

    if obj.contains_key("itemType") {
        return Ok(false);
    }

    match obj.get("type").and_then(Value::as_str) {
        Some(kind) => Ok(kind != "Folder"),
        None => Err(malformed("missing string field 'type'")),
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ImportError> {
    std::path::absolute(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve `root` (a single file or a directory tree) into importable items.
pub fn resolve_sources(root: &Path, policy: MalformedPolicy) -> Result<SourceScan, ImportError> {
    if !root.exists() {
        return Err(ImportError::SourceNotFound(root.to_path_buf()));
    }

    let mut candidates = Vec::new();
    let mut skipped = Vec::new();
    if root.is_dir() {
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    candidates.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) if policy == MalformedPolicy::Skip => {
                    warn!(error = %e, "Skipping unreadable entry");
                    if let Some(path) = e.path() {
                        skipped.push(absolute(path)?);
                    }
                }
                Err(e) => return Err(ImportError::Walk(e)),
            }
        }
    } else {
        candidates.push(root.to_path_buf());
    }

    let mut scan = SourceScan {
        skipped,
        ..SourceScan::default()
    };
    for candidate in candidates {
        scan.scanned += 1;
        let path = absolute(&candidate)?;

        let verdict = load_document(&path).and_then(|doc| is_importable(&doc, &path));
        match verdict {
            Ok(true) => {
                debug!(path = %path.display(), "Source accepted");
                scan.items.push(SourceItem::pending(path));
            }
            Ok(false) => {
                debug!(path = %path.display(), "Source excluded (not importable content)");
                scan.excluded += 1;
            }
            Err(e) if policy == MalformedPolicy::Skip => {
                warn!(path = %path.display(), error = %e, "Skipping malformed source");
                scan.skipped.push(path);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(scan)
}
