//! Import job driver.
//!
//! Items are processed strictly one at a time: submit, poll until the job
//! leaves `InProgress`, record the outcome, then move to the next item. A
//! failed (or timed-out) job is reported and the run continues; transport
//! errors abort the run.

use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, error, trace};

use sumo_import_client::{ContentApi, ImportOptions};
use sumo_import_core::{DestinationFolder, ItemState, JobStatus, PollPolicy, SourceItem};

use crate::error::ImportError;
use crate::source::load_document;

/// A processed item whose job did not succeed.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportFailure {
    pub path: PathBuf,
    pub state: ItemState,
    /// Last status payload returned by the remote.
    pub status: Value,
}

/// Everything the driver produced for one run.
#[derive(Debug, Clone, Default)]
pub struct DriverOutcome {
    /// Input items in the same order, every one in a terminal state.
    pub items: Vec<SourceItem>,
    pub failures: Vec<ImportFailure>,
}

enum PollOutcome {
    Terminal(JobStatus),
    TimedOut { polls: u32, last: JobStatus },
}

pub struct ImportDriver<'a> {
    api: &'a dyn ContentApi,
    policy: PollPolicy,
    options: ImportOptions,
}

impl<'a> ImportDriver<'a> {
    pub fn new(api: &'a dyn ContentApi, policy: PollPolicy) -> Self {
        Self {
            api,
            policy,
            options: ImportOptions::default(),
        }
    }

    /// Import every item into `destination`, in order.
    pub async fn run(
        &self,
        destination: &DestinationFolder,
        items: Vec<SourceItem>,
    ) -> Result<DriverOutcome, ImportError> {
        let mut outcome = DriverOutcome {
            items: Vec::with_capacity(items.len()),
            failures: Vec::new(),
        };

        for mut item in items {
            let last_status = self.import_one(&destination.id, &mut item).await?;

            if item.state.is_failure() {
                error!(
                    path = %item.path.display(),
                    state = %item.state,
                    status = %last_status,
                    "Import failed"
                );
                outcome.failures.push(ImportFailure {
                    path: item.path.clone(),
                    state: item.state.clone(),
                    status: last_status,
                });
            }

            outcome.items.push(item);
        }

        Ok(outcome)
    }

    /// Submit one item and wait for its job. Returns the last status payload.
    async fn import_one(&self, folder_id: &str, item: &mut SourceItem) -> Result<Value, ImportError> {
        let body = load_document(&item.path)?;
        debug!("UPLOAD: {}", item.path.display());

        tokio::time::sleep(self.policy.settle).await;
        let job = self.api.start_import(folder_id, &body, self.options).await?;
        debug!(job_id = %job.id, path = %item.path.display(), "Import job submitted");

        match self.poll_until_terminal(folder_id, &job.id).await? {
            PollOutcome::Terminal(status) => {
                item.state = ItemState::Finished(status.state);
                Ok(status.payload)
            }
            PollOutcome::TimedOut { polls, last } => {
                item.state = ItemState::TimedOut { polls };
                Ok(last.payload)
            }
        }
    }

    async fn poll_until_terminal(
        &self,
        folder_id: &str,
        job_id: &str,
    ) -> Result<PollOutcome, ImportError> {
        let mut polls: u32 = 0;

        loop {
            let status = self.api.import_status(folder_id, job_id, self.options).await?;
            polls = polls.saturating_add(1);
            trace!(job_id = %job_id, polls, "STATUS: {}", status.payload);

            if status.state.is_terminal() {
                return Ok(PollOutcome::Terminal(status));
            }

            if self.policy.max_polls.is_some_and(|max| polls >= max) {
                return Ok(PollOutcome::TimedOut {
                    polls,
                    last: status,
                });
            }

            tokio::time::sleep(self.policy.interval).await;
        }
    }
}
