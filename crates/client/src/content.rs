//! Content-store operations used by the import engine.

use async_trait::async_trait;
use serde_json::{json, Value};

use sumo_import_core::{FolderListing, FolderSummary, ImportJob, JobStatus};

use crate::client::{decode, SumoClient};
use crate::error::ApiError;

/// Flags sent with every import request.
///
/// Both default to `false` and are not exposed to the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub admin_mode: bool,
    pub overwrite: bool,
}

impl ImportOptions {
    fn admin_header(&self) -> &'static str {
        if self.admin_mode {
            "true"
        } else {
            "false"
        }
    }

    fn overwrite_param(&self) -> &'static str {
        if self.overwrite {
            "true"
        } else {
            "false"
        }
    }
}

/// The remote content store, as seen by the import engine.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// The caller's personal root folder and its direct children.
    async fn personal_folder(&self) -> Result<FolderListing, ApiError>;

    /// Create a folder named `name` (also used as its description).
    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<FolderSummary, ApiError>;

    /// Submit one content document for import into `folder_id`.
    async fn start_import(
        &self,
        folder_id: &str,
        content: &Value,
        options: ImportOptions,
    ) -> Result<ImportJob, ApiError>;

    /// Fetch the current status of an import job.
    async fn import_status(
        &self,
        folder_id: &str,
        job_id: &str,
        options: ImportOptions,
    ) -> Result<JobStatus, ApiError>;
}

#[async_trait]
impl ContentApi for SumoClient {
    async fn personal_folder(&self) -> Result<FolderListing, ApiError> {
        let resp = self.get("/v2/content/folders/personal/", &[], &[]).await?;
        decode(resp).await
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<FolderSummary, ApiError> {
        let payload = json!({
            "name": name,
            "description": name,
            "parentId": parent_id,
        });
        let resp = self.post("/v2/content/folders", &payload, &[], &[]).await?;
        decode(resp).await
    }

    async fn start_import(
        &self,
        folder_id: &str,
        content: &Value,
        options: ImportOptions,
    ) -> Result<ImportJob, ApiError> {
        let path = format!("/v2/content/folders/{folder_id}/import");
        let resp = self
            .post(
                &path,
                content,
                &[("overwrite", options.overwrite_param())],
                &[("isAdminMode", options.admin_header())],
            )
            .await?;
        decode(resp).await
    }

    async fn import_status(
        &self,
        folder_id: &str,
        job_id: &str,
        options: ImportOptions,
    ) -> Result<JobStatus, ApiError> {
        let path = format!("/v2/content/folders/{folder_id}/import/{job_id}/status");
        let resp = self
            .get(&path, &[], &[("isAdminMode", options.admin_header())])
            .await?;
        let url = resp.url().to_string();
        let payload: Value = decode(resp).await?;
        JobStatus::from_payload(payload).ok_or_else(|| ApiError::Decode {
            url,
            reason: "missing string field 'status'".to_string(),
        })
    }
}

/// In-memory content store for exercising the import engine without HTTP.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use sumo_import_core::JobState;

    /// One recorded call, in the order the engine made it.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        PersonalFolder,
        CreateFolder { name: String, parent_id: String },
        StartImport { folder_id: String, job_id: String, content: Value },
        ImportStatus { job_id: String, state: JobState },
    }

    /// A mock content store with a personal root folder and scripted jobs.
    ///
    /// Each submitted job takes the next queued status script; polls walk the
    /// script and keep returning its last entry once exhausted. A job with no
    /// queued script succeeds on its first poll.
    pub struct MockContentApi {
        root: Mutex<FolderListing>,
        scripts: Mutex<VecDeque<Vec<JobState>>>,
        jobs: Mutex<HashMap<String, VecDeque<JobState>>>,
        calls: Mutex<Vec<Call>>,
        fail_submissions: Mutex<bool>,
        next_id: Mutex<u32>,
    }

    impl MockContentApi {
        pub fn new(root_id: &str) -> Self {
            Self {
                root: Mutex::new(FolderListing {
                    id: root_id.to_string(),
                    name: "Personal".to_string(),
                    children: Vec::new(),
                }),
                scripts: Mutex::new(VecDeque::new()),
                jobs: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                fail_submissions: Mutex::new(false),
                next_id: Mutex::new(0),
            }
        }

        /// Add an existing child folder under the personal root.
        pub fn with_folder(self, id: &str, name: &str) -> Self {
            self.root.lock().unwrap().children.push(FolderSummary {
                id: id.to_string(),
                name: name.to_string(),
            });
            self
        }

        /// Queue the status sequence for the next submitted job.
        pub fn queue_job(&self, states: &[&str]) {
            self.scripts
                .lock()
                .unwrap()
                .push_back(states.iter().map(|s| JobState::from(*s)).collect());
        }

        /// Make every import submission answer with HTTP 500.
        pub fn fail_submissions(&self) {
            *self.fail_submissions.lock().unwrap() = true;
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn folder_count(&self) -> usize {
            self.root.lock().unwrap().children.len()
        }

        fn next_id(&self, prefix: &str) -> String {
            let mut n = self.next_id.lock().unwrap();
            *n += 1;
            format!("{prefix}-{n}")
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl ContentApi for MockContentApi {
        async fn personal_folder(&self) -> Result<FolderListing, ApiError> {
            self.record(Call::PersonalFolder);
            Ok(self.root.lock().unwrap().clone())
        }

        async fn create_folder(
            &self,
            name: &str,
            parent_id: &str,
        ) -> Result<FolderSummary, ApiError> {
            self.record(Call::CreateFolder {
                name: name.to_string(),
                parent_id: parent_id.to_string(),
            });
            let folder = FolderSummary {
                id: self.next_id("FOLDER"),
                name: name.to_string(),
            };
            self.root.lock().unwrap().children.push(folder.clone());
            Ok(folder)
        }

        async fn start_import(
            &self,
            folder_id: &str,
            content: &Value,
            _options: ImportOptions,
        ) -> Result<ImportJob, ApiError> {
            if *self.fail_submissions.lock().unwrap() {
                return Err(ApiError::Status {
                    method: reqwest::Method::POST,
                    url: format!("mock://v2/content/folders/{folder_id}/import"),
                    status: 500,
                    body: "internal error".to_string(),
                });
            }
            let job_id = self.next_id("JOB");
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| vec![JobState::Success]);
            self.jobs
                .lock()
                .unwrap()
                .insert(job_id.clone(), script.into_iter().collect());
            self.record(Call::StartImport {
                folder_id: folder_id.to_string(),
                job_id: job_id.clone(),
                content: content.clone(),
            });
            Ok(ImportJob { id: job_id })
        }

        async fn import_status(
            &self,
            _folder_id: &str,
            job_id: &str,
            _options: ImportOptions,
        ) -> Result<JobStatus, ApiError> {
            let state = {
                let mut jobs = self.jobs.lock().unwrap();
                let script = jobs.get_mut(job_id).ok_or_else(|| ApiError::Status {
                    method: reqwest::Method::GET,
                    url: format!("mock://import/{job_id}/status"),
                    status: 404,
                    body: "unknown job".to_string(),
                })?;
                if script.len() > 1 {
                    script.pop_front().unwrap_or(JobState::Success)
                } else {
                    script.front().cloned().unwrap_or(JobState::Success)
                }
            };
            self.record(Call::ImportStatus {
                job_id: job_id.to_string(),
                state: state.clone(),
            });
            Ok(JobStatus {
                payload: json!({ "status": state.as_str(), "jobId": job_id }),
                state,
            })
        }
    }
}
