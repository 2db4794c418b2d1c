#![allow(dead_code)]

use chrono::{DateTime, Utc};
use issue_desk::model::{Issue, IssueFields};
use issue_desk::service::IssueService;
use issue_desk::storage::{IssueStore, MemoryStore, SqliteStore};
use issue_desk::util::id::ObjectId;
use issue_desk::util::time::parse_timestamp;
use std::sync::Once;
use std::time::Instant;
use tempfile::TempDir;
use tracing::info;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        issue_desk::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl TestLogGuard {
    fn new(name: &str) -> Self {
        init_test_logging();
        info!("{name}: starting");
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    TestLogGuard::new(name)
}

pub fn memory_service() -> IssueService<MemoryStore> {
    init_test_logging();
    IssueService::new(MemoryStore::new())
}

pub fn sqlite_service() -> (IssueService<SqliteStore>, TempDir) {
    init_test_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::open(&dir.path().join("issues.db"))
        .expect("Failed to create test database");
    (IssueService::new(store), dir)
}

/// Fields for a create request.
pub fn create_fields(title: &str, text: &str, creator: &str) -> IssueFields {
    IssueFields {
        issue_title: Some(title.to_string()),
        issue_text: Some(text.to_string()),
        created_by: Some(creator.to_string()),
        ..IssueFields::default()
    }
}

/// A stored record with a fixed id and timestamp.
pub fn fixture_issue(id: &str, title: &str, text: &str, creator: &str, at: &str) -> Issue {
    let at: DateTime<Utc> = parse_timestamp(at).expect("fixture timestamp");
    Issue {
        issue_title: title.to_string(),
        issue_text: text.to_string(),
        created_on: at,
        updated_on: at,
        created_by: creator.to_string(),
        assigned_to: String::new(),
        open: true,
        status_text: String::new(),
        id: ObjectId::parse(id).expect("fixture id"),
    }
}

/// Seed the read fixtures: four records in `test-data-get` and one in
/// `test-data-put`.
pub fn seed_fixtures<S: IssueStore>(store: &mut S) {
    let records = [
        (
            "test-data-get",
            fixture_issue("6423308a046cbee7a8a106b1", "get", "issue", "mushu", "2023-03-28T18:23:06.930Z"),
        ),
        (
            "test-data-get",
            fixture_issue("64233094046cbee7a8a106b3", "get", "another issue", "mulan", "2023-03-28T18:23:16.201Z"),
        ),
        (
            "test-data-get",
            fixture_issue("6423309b046cbee7a8a106b5", "test", "other", "tester", "2023-03-28T18:23:23.112Z"),
        ),
        (
            "test-data-get",
            fixture_issue("642330a2046cbee7a8a106b7", "test", "testing", "tester", "2023-03-28T18:23:30.424Z"),
        ),
        (
            "test-data-put",
            fixture_issue("642336fd43e6adf6c43d8fd1", "put", "issue", "tester", "2023-03-28T18:50:37.655Z"),
        ),
    ];
    for (project, issue) in records {
        store.insert(project, &issue).expect("seed fixture");
    }
}
