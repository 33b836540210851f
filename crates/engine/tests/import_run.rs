use std::fs;
use std::path::Path;
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tokio::time::Instant;

use sumo_import_client::content::mock::{Call, MockContentApi};
use sumo_import_core::{
    Credentials, Endpoint, ItemState, JobState, MalformedPolicy, ManifestSettings, PollPolicy,
    Settings, SourceItem,
};
use sumo_import_engine::{
    resolve_destination, run_import, ImportDriver, ImportError, MANIFEST_HEADER,
};

fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, value.to_string()).unwrap();
}

fn settings(manifest_dir: &Path) -> Settings {
    Settings {
        credentials: Credentials {
            access_id: "suABC".into(),
            access_key: "secret".into(),
        },
        endpoint: Endpoint::Discover,
        org_id: None,
        manifest: ManifestSettings {
            dir: manifest_dir.to_path_buf(),
            tag: "test-import".into(),
        },
        poll: PollPolicy::default(),
        on_malformed: MalformedPolicy::Abort,
    }
}

fn pending_items(dir: &TempDir, names: &[&str]) -> Vec<SourceItem> {
    names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            write_json(&path, &json!({"type": "SavedSearchWithScheduleSyncDefinition", "name": name}));
            SourceItem::pending(path)
        })
        .collect()
}

// ── Destination ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn destination_is_created_once_then_reused() {
    let api = MockContentApi::new("ROOT");

    let first = resolve_destination(&api, "restore", Duration::from_millis(500))
        .await
        .unwrap();
    assert!(first.created);
    assert_eq!(first.tag(), "CREATED");

    let second = resolve_destination(&api, "restore", Duration::from_millis(500))
        .await
        .unwrap();
    assert!(!second.created);
    assert_eq!(second.tag(), "EXISTING");
    assert_eq!(second.id, first.id);
    assert_eq!(api.folder_count(), 1);

    let creates = api
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::CreateFolder { .. }))
        .count();
    assert_eq!(creates, 1);
}

#[tokio::test(start_paused = true)]
async fn first_matching_child_wins() {
    let api = MockContentApi::new("ROOT")
        .with_folder("A1", "other")
        .with_folder("B2", "restore")
        .with_folder("C3", "restore");

    let dest = resolve_destination(&api, "restore", Duration::ZERO).await.unwrap();
    assert_eq!(dest.id, "B2");
    assert!(!dest.created);
}

#[tokio::test(start_paused = true)]
async fn name_match_is_exact() {
    let api = MockContentApi::new("ROOT").with_folder("A1", "Restore");

    let dest = resolve_destination(&api, "restore", Duration::ZERO).await.unwrap();
    assert!(dest.created);
    assert_eq!(
        api.calls()[1],
        Call::CreateFolder {
            name: "restore".into(),
            parent_id: "ROOT".into(),
        }
    );
}

// ── Driver ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn jobs_run_strictly_one_after_another() {
    let dir = tempdir().unwrap();
    let api = MockContentApi::new("ROOT").with_folder("DEST", "restore");
    api.queue_job(&["InProgress", "InProgress", "Success"]);
    api.queue_job(&["InProgress", "Success"]);

    let dest = resolve_destination(&api, "restore", Duration::ZERO).await.unwrap();
    let items = pending_items(&dir, &["a.json", "b.json"]);
    let outcome = ImportDriver::new(&api, PollPolicy::default())
        .run(&dest, items)
        .await
        .unwrap();

    assert!(outcome.failures.is_empty());
    assert!(outcome
        .items
        .iter()
        .all(|i| i.state == ItemState::Finished(JobState::Success)));

    // Every job reaches a terminal poll before the next submission.
    let mut open_job: Option<String> = None;
    let mut polls_per_job = Vec::new();
    for call in api.calls() {
        match call {
            Call::StartImport { job_id, folder_id, .. } => {
                assert!(open_job.is_none(), "submitted {job_id} while another job was running");
                assert_eq!(folder_id, "DEST");
                open_job = Some(job_id);
                polls_per_job.push(0);
            }
            Call::ImportStatus { job_id, state } => {
                assert_eq!(open_job.as_deref(), Some(job_id.as_str()));
                *polls_per_job.last_mut().unwrap() += 1;
                if state.is_terminal() {
                    open_job = None;
                }
            }
            _ => {}
        }
    }
    assert!(open_job.is_none());
    assert_eq!(polls_per_job, vec![3, 2]);
}

#[tokio::test(start_paused = true)]
async fn submitted_body_is_the_file_content() {
    let dir = tempdir().unwrap();
    let api = MockContentApi::new("ROOT").with_folder("DEST", "restore");
    let path = dir.path().join("search.json");
    let doc = json!({"type": "SavedSearchWithScheduleSyncDefinition", "name": "errors", "search": {"queryText": "error"}});
    write_json(&path, &doc);

    let dest = resolve_destination(&api, "restore", Duration::ZERO).await.unwrap();
    ImportDriver::new(&api, PollPolicy::default())
        .run(&dest, vec![SourceItem::pending(path)])
        .await
        .unwrap();

    let content = api
        .calls()
        .into_iter()
        .find_map(|c| match c {
            Call::StartImport { content, .. } => Some(content),
            _ => None,
        })
        .unwrap();
    assert_eq!(content, doc);
}

#[tokio::test(start_paused = true)]
async fn failed_job_is_reported_and_run_continues() {
    let dir = tempdir().unwrap();
    let api = MockContentApi::new("ROOT").with_folder("DEST", "restore");
    api.queue_job(&["InProgress", "Failed"]);
    api.queue_job(&["Success"]);

    let dest = resolve_destination(&api, "restore", Duration::ZERO).await.unwrap();
    let items = pending_items(&dir, &["bad.json", "good.json"]);
    let outcome = ImportDriver::new(&api, PollPolicy::default())
        .run(&dest, items)
        .await
        .unwrap();

    assert_eq!(outcome.items[0].state, ItemState::Finished(JobState::Failed));
    assert_eq!(outcome.items[1].state, ItemState::Finished(JobState::Success));
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].path.ends_with("bad.json"));
    assert_eq!(outcome.failures[0].status["status"], "Failed");
}

#[tokio::test(start_paused = true)]
async fn unfamiliar_status_is_terminal_and_not_a_failure() {
    let dir = tempdir().unwrap();
    let api = MockContentApi::new("ROOT").with_folder("DEST", "restore");
    api.queue_job(&["InProgress", "PartialSuccess"]);

    let dest = resolve_destination(&api, "restore", Duration::ZERO).await.unwrap();
    let outcome = ImportDriver::new(&api, PollPolicy::default())
        .run(&dest, pending_items(&dir, &["x.json"]))
        .await
        .unwrap();

    assert_eq!(
        outcome.items[0].state,
        ItemState::Finished(JobState::Other("PartialSuccess".into()))
    );
    assert!(outcome.failures.is_empty());
}

#[tokio::test(start_paused = true)]
async fn stuck_job_times_out_after_max_polls() {
    let dir = tempdir().unwrap();
    let api = MockContentApi::new("ROOT").with_folder("DEST", "restore");
    api.queue_job(&["InProgress"]);

    let dest = resolve_destination(&api, "restore", Duration::ZERO).await.unwrap();
    let policy = PollPolicy::default().with_max_polls(3);
    let outcome = ImportDriver::new(&api, policy)
        .run(&dest, pending_items(&dir, &["stuck.json", "next.json"]))
        .await
        .unwrap();

    assert_eq!(outcome.items[0].state, ItemState::TimedOut { polls: 3 });
    assert_eq!(outcome.items[1].state, ItemState::Finished(JobState::Success));
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].state, ItemState::TimedOut { polls: 3 });
}

#[tokio::test(start_paused = true)]
async fn zero_max_polls_waits_past_the_default_bound() {
    let dir = tempdir().unwrap();
    let api = MockContentApi::new("ROOT").with_folder("DEST", "restore");
    let mut script = vec!["InProgress"; 4000];
    script.push("Success");
    api.queue_job(&script);

    let dest = resolve_destination(&api, "restore", Duration::ZERO).await.unwrap();
    let policy = PollPolicy::default().with_max_polls(0);
    assert_eq!(policy.max_polls, None);
    let outcome = ImportDriver::new(&api, policy)
        .run(&dest, pending_items(&dir, &["slow.json"]))
        .await
        .unwrap();

    assert_eq!(outcome.items[0].state, ItemState::Finished(JobState::Success));
    let polls = api
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::ImportStatus { .. }))
        .count();
    assert_eq!(polls, 4001);
}

// ── Pacing ────────────────────────────────────────────────────

fn assert_elapsed(start: Instant, expected: Duration) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(5),
        "expected {expected:?}, took {elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn each_job_waits_settle_then_interval_between_polls() {
    let dir = tempdir().unwrap();
    let api = MockContentApi::new("ROOT").with_folder("DEST", "restore");
    let dest = resolve_destination(&api, "restore", Duration::ZERO).await.unwrap();

    api.queue_job(&["InProgress", "InProgress", "Success"]);
    let start = Instant::now();
    ImportDriver::new(&api, PollPolicy::default())
        .run(&dest, pending_items(&dir, &["a.json"]))
        .await
        .unwrap();
    assert_elapsed(start, Duration::from_millis(1500));

    let policy = PollPolicy {
        interval: Duration::from_millis(200),
        settle: Duration::from_millis(50),
        max_polls: None,
    };
    api.queue_job(&["InProgress", "InProgress", "Success"]);
    api.queue_job(&["Success"]);
    let start = Instant::now();
    ImportDriver::new(&api, policy)
        .run(&dest, pending_items(&dir, &["b.json", "c.json"]))
        .await
        .unwrap();
    // b: settle + 2 intervals, c: settle only
    assert_elapsed(start, Duration::from_millis(50 + 400 + 50));
}

#[tokio::test(start_paused = true)]
async fn new_folder_waits_settle_and_existing_folder_does_not() {
    let api = MockContentApi::new("ROOT");
    let settle = Duration::from_millis(500);

    let start = Instant::now();
    let created = resolve_destination(&api, "restore", settle).await.unwrap();
    assert!(created.created);
    assert_elapsed(start, settle);

    let start = Instant::now();
    let existing = resolve_destination(&api, "restore", settle).await.unwrap();
    assert!(!existing.created);
    assert_elapsed(start, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_aborts_the_run() {
    let dir = tempdir().unwrap();
    let api = MockContentApi::new("ROOT").with_folder("DEST", "restore");
    api.fail_submissions();

    let dest = resolve_destination(&api, "restore", Duration::ZERO).await.unwrap();
    let err = ImportDriver::new(&api, PollPolicy::default())
        .run(&dest, pending_items(&dir, &["a.json", "b.json"]))
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Api(_)));
    assert!(!api
        .calls()
        .iter()
        .any(|c| matches!(c, Call::ImportStatus { .. })));
}

// ── Full run ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn full_run_creates_folder_imports_and_writes_manifest() {
    let source = tempdir().unwrap();
    let manifests = tempdir().unwrap();
    write_json(&source.path().join("a.json"), &json!({"type": "SavedSearchWithScheduleSyncDefinition", "name": "a"}));
    write_json(&source.path().join("sub/b.json"), &json!({"type": "DashboardV2SyncDefinition", "name": "b"}));
    write_json(&source.path().join("listing.json"), &json!({"itemType": "Folder", "id": "X"}));

    let api = MockContentApi::new("ROOT");
    api.queue_job(&["InProgress", "Success"]);
    api.queue_job(&["InProgress", "Success"]);
    let report = run_import(&api, &settings(manifests.path()), source.path(), "restore")
        .await
        .unwrap();

    assert!(report.destination.created);
    assert_eq!(report.destination.tag(), "CREATED");
    assert_eq!(report.items.len(), 2);
    assert!(report.failures.is_empty());
    assert_eq!(report.counts().get("Success"), Some(&2));

    let content = fs::read_to_string(&report.manifest_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], MANIFEST_HEADER);
    for line in &lines[1..] {
        let prefix = format!("file,restore,{},Success,", report.destination.id);
        assert!(line.starts_with(&prefix), "unexpected row {line}");
    }
    assert!(lines[1].ends_with("a.json"));
    assert!(lines[2].ends_with("b.json"));

    let file_name = report.manifest_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("test-import."));
    assert!(file_name.ends_with(".csv"));
}

#[tokio::test(start_paused = true)]
async fn malformed_source_aborts_before_any_import() {
    let source = tempdir().unwrap();
    let manifests = tempdir().unwrap();
    write_json(&source.path().join("a.json"), &json!({"type": "Search"}));
    fs::write(source.path().join("broken.json"), "{").unwrap();

    let api = MockContentApi::new("ROOT");
    let err = run_import(&api, &settings(manifests.path()), source.path(), "restore")
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::MalformedSource { .. }));
    assert!(!api
        .calls()
        .iter()
        .any(|c| matches!(c, Call::StartImport { .. })));
    assert_eq!(fs::read_dir(manifests.path()).unwrap().count(), 0);
}

#[tokio::test(start_paused = true)]
async fn skip_policy_reports_skipped_files() {
    let source = tempdir().unwrap();
    let manifests = tempdir().unwrap();
    write_json(&source.path().join("a.json"), &json!({"type": "Search"}));
    fs::write(source.path().join("broken.json"), "{").unwrap();

    let mut settings = settings(manifests.path());
    settings.on_malformed = MalformedPolicy::Skip;

    let api = MockContentApi::new("ROOT");
    let report = run_import(&api, &settings, source.path(), "restore").await.unwrap();

    assert_eq!(report.items.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].ends_with("broken.json"));
}

#[tokio::test(start_paused = true)]
async fn empty_source_still_writes_header_only_manifest() {
    let source = tempdir().unwrap();
    let manifests = tempdir().unwrap();

    let api = MockContentApi::new("ROOT");
    let report = run_import(&api, &settings(manifests.path()), source.path(), "restore")
        .await
        .unwrap();

    assert!(report.items.is_empty());
    let content = fs::read_to_string(&report.manifest_path).unwrap();
    assert_eq!(content.trim_end(), MANIFEST_HEADER);
}
