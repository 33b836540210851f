//! Typed records shared by the import pipeline.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Remote-side state of an asynchronous import job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    InProgress,
    Success,
    Failed,
    /// Any other terminal value the remote store reports.
    Other(String),
}

impl JobState {
    pub fn as_str(&self) -> &str {
        match self {
            JobState::InProgress => "InProgress",
            JobState::Success => "Success",
            JobState::Failed => "Failed",
            JobState::Other(s) => s,
        }
    }

    /// Everything except `InProgress` ends the poll loop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::InProgress)
    }
}

impl From<&str> for JobState {
    fn from(s: &str) -> Self {
        match s {
            "InProgress" => JobState::InProgress,
            "Success" => JobState::Success,
            "Failed" => JobState::Failed,
            other => JobState::Other(other.to_string()),
        }
    }
}

impl From<String> for JobState {
    fn from(s: String) -> Self {
        JobState::from(s.as_str())
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One polled status of an import job.
///
/// The full response body is kept in `payload` so that a failed job can be
/// reported to the operator verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatus {
    pub state: JobState,
    pub payload: serde_json::Value,
}

impl JobStatus {
    /// Build from a status response body. Returns `None` when the body has
    /// no string `status` field.
    pub fn from_payload(payload: serde_json::Value) -> Option<Self> {
        let state = payload.get("status")?.as_str().map(JobState::from)?;
        Some(Self { state, payload })
    }
}

/// Handle for a submitted import job.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportJob {
    pub id: String,
}

/// Lifecycle of one source file within a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemState {
    Pending,
    Finished(JobState),
    /// The job was still `InProgress` when the poll limit was reached.
    TimedOut { polls: u32 },
}

impl ItemState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ItemState::Pending)
    }

    /// True for outcomes that are reported to the operator as failures.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ItemState::Finished(JobState::Failed) | ItemState::TimedOut { .. }
        )
    }

    pub fn label(&self) -> &str {
        match self {
            ItemState::Pending => "pending",
            ItemState::Finished(state) => state.as_str(),
            ItemState::TimedOut { .. } => "TimedOut",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An importable content document on the local filesystem.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceItem {
    /// Absolute path of the JSON document.
    pub path: PathBuf,
    pub state: ItemState,
}

impl SourceItem {
    pub fn pending(path: PathBuf) -> Self {
        Self {
            path,
            state: ItemState::Pending,
        }
    }
}

/// The single folder every item of a run is imported into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationFolder {
    pub id: String,
    pub name: String,
    /// `true` when this run created the folder, `false` when it was found.
    pub created: bool,
}

impl DestinationFolder {
    pub fn tag(&self) -> &'static str {
        if self.created {
            "CREATED"
        } else {
            "EXISTING"
        }
    }
}

/// A folder as returned by the content API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FolderSummary {
    pub id: String,
    pub name: String,
}

/// A folder together with its direct children.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FolderListing {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub children: Vec<FolderSummary>,
}

/// One row of the run manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    pub kind: &'static str,
    pub parent_name: String,
    pub parent_oid: String,
    /// Final job status of the item.
    pub dst_oid: String,
    pub src_file: PathBuf,
}

impl ManifestRecord {
    pub fn for_item(destination: &DestinationFolder, item: &SourceItem) -> Self {
        Self {
            kind: "file",
            parent_name: destination.name.clone(),
            parent_oid: destination.id.clone(),
            dst_oid: item.state.label().to_string(),
            src_file: item.path.clone(),
        }
    }
}
