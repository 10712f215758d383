//! End-to-end scenarios for the persistence engine over the in-memory driver.

use docstore::memory::MemoryConnector;
use docstore::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Task {
    id: Option<i64>,
    title: String,
    done: bool,
    priority: i64,
}

impl Task {
    fn new(id: impl Into<Option<i64>>, title: &str, done: bool, priority: i64) -> Self {
        Self { id: id.into(), title: title.to_string(), done, priority }
    }
}

impl Record for Task {
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = Some(key);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Note {
    id: Option<String>,
    body: String,
}

impl Record for Note {
    type Key = String;

    fn key(&self) -> Option<String> {
        self.id.clone()
    }

    fn set_key(&mut self, key: String) {
        self.id = Some(key);
    }
}

async fn opened_tasks() -> DocumentPersistence<MemoryConnector, Task> {
    let options = PersistenceOptions::builder("tasks").build().unwrap();
    let persistence = DocumentPersistence::new(options, MemoryConnector::new())
        .with_connection(
            ConnectionParams::new()
                .with_host("localhost")
                .with_port(27017)
                .with_database("test"),
        );

    persistence.open("test-open").await.unwrap();
    persistence
}

async fn seeded_tasks() -> DocumentPersistence<MemoryConnector, Task> {
    let persistence = opened_tasks().await;
    for task in [
        Task::new(1, "alpha", false, 3),
        Task::new(2, "bravo", true, 1),
        Task::new(3, "charlie", false, 2),
    ] {
        persistence.create("test-seed", task).await.unwrap();
    }
    persistence
}

#[tokio::test]
async fn operations_fail_before_open() {
    let options = PersistenceOptions::builder("tasks").build().unwrap();
    let persistence: DocumentPersistence<MemoryConnector, Task> =
        DocumentPersistence::new(options, MemoryConnector::new());

    assert!(!persistence.is_open().await);
    assert!(matches!(
        persistence.get_one_by_id("t", &1).await,
        Err(PersistenceError::NotOpened(_))
    ));
    assert!(matches!(
        persistence.create("t", Task::new(1, "x", false, 1)).await,
        Err(PersistenceError::NotOpened(_))
    ));
    assert!(matches!(
        persistence.clear("t").await,
        Err(PersistenceError::NotOpened(_))
    ));
}

#[tokio::test]
async fn open_fails_without_connection_configuration() {
    let options = PersistenceOptions::builder("tasks").build().unwrap();
    let persistence: DocumentPersistence<MemoryConnector, Task> =
        DocumentPersistence::new(options, MemoryConnector::new());

    assert!(matches!(
        persistence.open("t").await,
        Err(PersistenceError::Configuration(_))
    ));
    assert!(!persistence.is_open().await);
}

#[tokio::test]
async fn lifecycle_open_close_round_trip() {
    let persistence = opened_tasks().await;
    assert!(persistence.is_open().await);

    // Reopening an open component is a no-op.
    persistence.open("test-reopen").await.unwrap();
    assert!(persistence.is_open().await);

    persistence.close("test-close").await.unwrap();
    assert!(!persistence.is_open().await);

    // Closing again stays a no-op.
    persistence.close("test-close").await.unwrap();
}

#[tokio::test]
async fn create_then_fetch_then_delete() {
    let persistence = opened_tasks().await;

    let created = persistence
        .create("t", Task::new(7, "write docs", false, 1))
        .await
        .unwrap();
    assert_eq!(created.id, Some(7));

    let fetched = persistence.get_one_by_id("t", &7).await.unwrap();
    assert_eq!(fetched, Some(created.clone()));

    let removed = persistence.delete_by_id("t", &7).await.unwrap();
    assert_eq!(removed, Some(created));

    assert_eq!(persistence.get_one_by_id("t", &7).await.unwrap(), None);
    assert_eq!(persistence.delete_by_id("t", &7).await.unwrap(), None);
}

#[tokio::test]
async fn create_generates_unique_long_identities() {
    let persistence = opened_tasks().await;

    let mut keys = Vec::new();
    for i in 0..10 {
        let created = persistence
            .create("t", Task::new(None, &format!("task {}", i), false, 1))
            .await
            .unwrap();
        keys.push(created.id.expect("identity should be generated"));
    }

    let mut deduped = keys.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), keys.len());
    assert!(keys.iter().all(|k| *k > 0));
}

#[tokio::test]
async fn concurrent_creates_generate_distinct_identities() {
    let persistence = std::sync::Arc::new(opened_tasks().await);

    let mut handles = Vec::new();
    for i in 0..16 {
        let persistence = persistence.clone();
        handles.push(tokio::spawn(async move {
            persistence
                .create("t", Task::new(None, &format!("task {}", i), false, 1))
                .await
                .unwrap()
        }));
    }

    let mut keys = Vec::new();
    for handle in handles {
        keys.push(handle.await.unwrap().id.expect("identity should be generated"));
    }

    let mut deduped = keys.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), keys.len());

    // No create overwrote another: every record is retrievable by its key.
    for key in &keys {
        let fetched = persistence.get_one_by_id("t", key).await.unwrap();
        assert_eq!(fetched.as_ref().and_then(|t| t.id), Some(*key));
    }
}

#[tokio::test]
async fn create_never_generates_string_identities() {
    let options = PersistenceOptions::builder("notes").build().unwrap();
    let persistence: DocumentPersistence<MemoryConnector, Note> =
        DocumentPersistence::new(options, MemoryConnector::new())
            .with_connection(ConnectionParams::from_uri("mongodb://localhost/test"));
    persistence.open("t").await.unwrap();

    let created = persistence
        .create("t", Note { id: None, body: "unkeyed".to_string() })
        .await
        .unwrap();
    assert_eq!(created.id, None);

    let keyed = persistence
        .create("t", Note { id: Some("n-1".to_string()), body: "keyed".to_string() })
        .await
        .unwrap();
    assert_eq!(keyed.id, Some("n-1".to_string()));
}

#[tokio::test]
async fn create_respects_disabled_generation() {
    let options = PersistenceOptions::builder("tasks")
        .auto_generate_identity(false)
        .build()
        .unwrap();
    let persistence: DocumentPersistence<MemoryConnector, Task> =
        DocumentPersistence::new(options, MemoryConnector::new())
            .with_connection(ConnectionParams::from_uri("mongodb://localhost/test"));
    persistence.open("t").await.unwrap();

    let created = persistence
        .create("t", Task::new(None, "no identity", false, 1))
        .await
        .unwrap();
    assert_eq!(created.id, None);
}

#[tokio::test]
async fn create_rejects_duplicate_identities() {
    let persistence = opened_tasks().await;
    persistence
        .create("t", Task::new(1, "first", false, 1))
        .await
        .unwrap();

    let result = persistence
        .create("t", Task::new(1, "second", false, 1))
        .await;

    match result {
        Err(PersistenceError::DuplicateKey(key, collection)) => {
            assert_eq!(key, "1");
            assert_eq!(collection, "tasks");
        }
        other => panic!("expected DuplicateKey, got {:?}", other),
    }
}

#[tokio::test]
async fn set_upserts_and_replaces() {
    let persistence = opened_tasks().await;

    // Nothing matches, so set inserts.
    let inserted = persistence
        .set("t", Task::new(5, "initial", false, 1))
        .await
        .unwrap();
    assert_eq!(inserted.title, "initial");

    // A second set on the same identity replaces the full document.
    let replaced = persistence
        .set("t", Task::new(5, "replaced", true, 9))
        .await
        .unwrap();
    assert_eq!(replaced, Task::new(5, "replaced", true, 9));

    let fetched = persistence.get_one_by_id("t", &5).await.unwrap();
    assert_eq!(fetched, Some(Task::new(5, "replaced", true, 9)));
}

#[tokio::test]
async fn set_without_identity_inserts_with_generated_key() {
    let persistence = opened_tasks().await;

    let written = persistence
        .set("t", Task::new(None, "keyless", false, 1))
        .await
        .unwrap();
    let key = written.id.expect("identity should be generated");

    let fetched = persistence.get_one_by_id("t", &key).await.unwrap();
    assert_eq!(fetched, Some(written));
}

#[tokio::test]
async fn update_never_upserts() {
    let persistence = opened_tasks().await;

    let missing = persistence
        .update("t", Task::new(99, "ghost", false, 1))
        .await
        .unwrap();
    assert_eq!(missing, None);
    assert_eq!(persistence.get_one_by_id("t", &99).await.unwrap(), None);

    // A record without identity updates nothing.
    let keyless = persistence
        .update("t", Task::new(None, "ghost", false, 1))
        .await
        .unwrap();
    assert_eq!(keyless, None);

    persistence
        .create("t", Task::new(4, "present", false, 1))
        .await
        .unwrap();
    let updated = persistence
        .update("t", Task::new(4, "renamed", true, 2))
        .await
        .unwrap();
    assert_eq!(updated, Some(Task::new(4, "renamed", true, 2)));
}

#[tokio::test]
async fn modify_applies_partial_updates() {
    let persistence = seeded_tasks().await;

    let update = UpdateSpec::new().with("done", true).with("priority", 5i64);
    let filter = FilterSpec::new().with("title", "alpha");

    let modified = persistence.modify("t", &filter, &update).await.unwrap();
    assert_eq!(modified, Some(Task::new(1, "alpha", true, 5)));

    // Untouched fields survive the partial update.
    let fetched = persistence.get_one_by_id("t", &1).await.unwrap().unwrap();
    assert_eq!(fetched.title, "alpha");
}

#[tokio::test]
async fn modify_with_empty_specs_is_a_no_write() {
    let persistence = seeded_tasks().await;

    let empty_update = persistence
        .modify("t", &FilterSpec::new().with("title", "alpha"), &UpdateSpec::new())
        .await
        .unwrap();
    assert_eq!(empty_update, None);

    let empty_filter = persistence
        .modify("t", &FilterSpec::new(), &UpdateSpec::new().with("done", true))
        .await
        .unwrap();
    assert_eq!(empty_filter, None);

    // Nothing was written by either call.
    let fetched = persistence.get_one_by_id("t", &1).await.unwrap().unwrap();
    assert_eq!(fetched, Task::new(1, "alpha", false, 3));
}

#[tokio::test]
async fn modify_by_id_targets_one_record() {
    let persistence = seeded_tasks().await;

    let modified = persistence
        .modify_by_id("t", &2, &UpdateSpec::new().with("priority", 8i64))
        .await
        .unwrap();
    assert_eq!(modified, Some(Task::new(2, "bravo", true, 8)));

    let absent = persistence
        .modify_by_id("t", &99, &UpdateSpec::new().with("priority", 8i64))
        .await
        .unwrap();
    assert_eq!(absent, None);

    let empty = persistence
        .modify_by_id("t", &2, &UpdateSpec::new())
        .await
        .unwrap();
    assert_eq!(empty, None);
}

#[tokio::test]
async fn get_page_windows_and_counts() {
    let persistence = seeded_tasks().await;

    let page = persistence
        .get_page(
            "t",
            Some(&FilterSpec::new().with("ids", "1,2,3")),
            Some(&PagingParams::new().skip(1).limit(1).with_total()),
            None,
        )
        .await
        .unwrap();

    assert_eq!(page.data, vec![Task::new(2, "bravo", true, 1)]);
    assert_eq!(page.total, Some(3));

    // Without an explicit request the total is not computed.
    let untotaled = persistence
        .get_page("t", None, Some(&PagingParams::new().limit(2)), None)
        .await
        .unwrap();
    assert_eq!(untotaled.data.len(), 2);
    assert_eq!(untotaled.total, None);
}

#[tokio::test]
async fn unparseable_ids_filter_matches_nothing() {
    let persistence = seeded_tasks().await;
    let unparseable = FilterSpec::new().with("ids", "a,b,c");

    let page = persistence
        .get_page("t", Some(&unparseable), None, None)
        .await
        .unwrap();
    assert!(page.data.is_empty());

    // The same composition feeds deletes: nothing may be removed.
    persistence.delete_by_filter("t", &unparseable).await.unwrap();

    let remaining = persistence.get_list("t", None, None).await.unwrap();
    assert_eq!(remaining.len(), 3);
}

#[tokio::test]
async fn get_page_sorts_before_windowing() {
    let persistence = seeded_tasks().await;

    let page = persistence
        .get_page(
            "t",
            None,
            Some(&PagingParams::new().limit(2)),
            Some(&SortSpec::new().ascending("priority")),
        )
        .await
        .unwrap();

    assert_eq!(
        page.data,
        vec![Task::new(2, "bravo", true, 1), Task::new(3, "charlie", false, 2)]
    );
}

#[tokio::test]
async fn get_list_filters_and_sorts() {
    let persistence = seeded_tasks().await;

    let open_tasks = persistence
        .get_list(
            "t",
            Some(&FilterSpec::new().with("done", false)),
            Some(&SortSpec::new().descending("priority")),
        )
        .await
        .unwrap();

    assert_eq!(
        open_tasks,
        vec![Task::new(1, "alpha", false, 3), Task::new(3, "charlie", false, 2)]
    );
}

#[tokio::test]
async fn get_list_by_ids_matches_the_key_set() {
    let persistence = seeded_tasks().await;

    let listed = persistence.get_list_by_ids("t", &[1, 3, 99]).await.unwrap();
    assert_eq!(
        listed,
        vec![Task::new(1, "alpha", false, 3), Task::new(3, "charlie", false, 2)]
    );

    let none = persistence.get_list_by_ids("t", &[]).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn csv_filter_values_become_membership_tests() {
    let persistence = seeded_tasks().await;

    let matched = persistence
        .get_list("t", Some(&FilterSpec::new().with("title", "alpha,charlie")), None)
        .await
        .unwrap();

    assert_eq!(
        matched,
        vec![Task::new(1, "alpha", false, 3), Task::new(3, "charlie", false, 2)]
    );
}

#[tokio::test]
async fn projection_excludes_identity_unless_named() {
    let persistence = seeded_tasks().await;

    let without_identity = persistence
        .get_one_by_id_with_projection("t", &1, &ProjectionSpec::new().include("title"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(without_identity, bson::doc! { "title": "alpha" });

    let with_identity = persistence
        .get_one_by_id_with_projection(
            "t",
            &1,
            &ProjectionSpec::new().include("id").include("title"),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(with_identity, bson::doc! { "id": 1i64, "title": "alpha" });
}

#[tokio::test]
async fn empty_projection_results_collapse_to_absent() {
    let persistence = seeded_tasks().await;
    let projection = ProjectionSpec::new().include("no_such_field");

    // A record exists for id 1, but its projection carries zero fields;
    // the caller sees the same answer as for a missing record.
    let found_but_empty = persistence
        .get_one_by_id_with_projection("t", &1, &projection)
        .await
        .unwrap();
    assert_eq!(found_but_empty, None);

    let not_found = persistence
        .get_one_by_id_with_projection("t", &99, &projection)
        .await
        .unwrap();
    assert_eq!(not_found, None);
}

#[tokio::test]
async fn projected_pages_skip_empty_documents() {
    let persistence = seeded_tasks().await;

    let page = persistence
        .get_page_with_projection(
            "t",
            None,
            None,
            None,
            &ProjectionSpec::new().include("no_such_field"),
        )
        .await
        .unwrap();
    assert!(page.data.is_empty());

    let titles = persistence
        .get_page_with_projection("t", None, None, None, &ProjectionSpec::new().include("title"))
        .await
        .unwrap();
    assert_eq!(
        titles.data,
        vec![
            bson::doc! { "title": "alpha" },
            bson::doc! { "title": "bravo" },
            bson::doc! { "title": "charlie" },
        ]
    );
}

#[tokio::test]
async fn random_pick_handles_empty_and_single_sets() {
    let persistence = opened_tasks().await;

    let nothing = persistence.get_one_random("t", None).await.unwrap();
    assert_eq!(nothing, None);

    let only = persistence
        .create("t", Task::new(1, "only", false, 1))
        .await
        .unwrap();
    let picked = persistence.get_one_random("t", None).await.unwrap();
    assert_eq!(picked, Some(only));
}

#[tokio::test]
async fn random_pick_honors_the_filter() {
    let persistence = seeded_tasks().await;

    for _ in 0..10 {
        let picked = persistence
            .get_one_random("t", Some(&FilterSpec::new().with("done", true)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(picked, Task::new(2, "bravo", true, 1));
    }
}

#[tokio::test]
async fn delete_by_ids_removes_the_key_set() {
    let persistence = seeded_tasks().await;

    persistence.delete_by_ids("t", &[1, 3]).await.unwrap();

    let remaining = persistence.get_list("t", None, None).await.unwrap();
    assert_eq!(remaining, vec![Task::new(2, "bravo", true, 1)]);
}

#[tokio::test]
async fn delete_by_filter_removes_matches_only() {
    let persistence = seeded_tasks().await;

    persistence
        .delete_by_filter("t", &FilterSpec::new().with("done", false))
        .await
        .unwrap();

    let remaining = persistence.get_list("t", None, None).await.unwrap();
    assert_eq!(remaining, vec![Task::new(2, "bravo", true, 1)]);
}

#[tokio::test]
async fn clear_drops_the_collection() {
    let persistence = seeded_tasks().await;

    persistence.clear("t").await.unwrap();

    let remaining = persistence.get_list("t", None, None).await.unwrap();
    assert!(remaining.is_empty());
}
