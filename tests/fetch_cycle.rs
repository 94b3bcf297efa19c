//! End-to-end fetcher scenarios against the mock remote interface and an
//! in-memory cache database

use std::sync::Arc;
use std::time::Duration;

use roost::api::mock::MockClient;
use roost::api::{Client, Credential};
use roost::db::{Database, SharedDatabase};
use roost::fetch::{
    AccountFetcher, DirectorySource, ListFetcher, Loadable, ProfileSource, RecordFetcher,
    StatuslogSource,
};
use roost::models::{Paste, Profile, Record, Status};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn harness() -> (SharedDatabase, Arc<Client>) {
    init_logging();
    let db = Database::open_in_memory().unwrap().into_shared();
    let client = Arc::new(Client::Mock(MockClient::new()));
    (db, client)
}

fn mock(client: &Client) -> &MockClient {
    client.as_mock().unwrap()
}

#[tokio::test]
async fn at_most_one_cycle_in_flight() {
    init_logging();
    let db = Database::open_in_memory().unwrap().into_shared();

    // Slow the mock down so the two cycles overlap.
    let slow = Arc::new(Client::Mock(
        MockClient::new().with_latency(Duration::from_millis(50)),
    ));
    mock(&slow).set_directory(&["app", "calvin"]);

    let fetcher = Arc::new(ListFetcher::new(DirectorySource, db, slow.clone(), 24));
    tokio::join!(fetcher.perform(), fetcher.perform());

    assert_eq!(mock(&slow).calls("directory"), 1);
    assert!(fetcher.loaded().is_some());
}

#[tokio::test]
async fn blank_key_never_touches_the_network() {
    let (db, client) = harness();

    let fetcher = RecordFetcher::new(ProfileSource::new(""), db, client.clone());
    fetcher.perform().await;

    assert!(fetcher.loaded().is_some());
    assert!(fetcher.error().is_none());
    assert!(fetcher.result().is_none());
    assert_eq!(mock(&client).calls("profile"), 0);
}

#[tokio::test]
async fn record_cycle_reads_through_the_store() {
    let (db, client) = harness();
    mock(&client).set_profile(Profile::new("calvin", "hello from calvin"));

    let fetcher = RecordFetcher::new(ProfileSource::new("calvin"), db.clone(), client);
    fetcher.perform().await;

    let result = fetcher.result().unwrap();
    assert_eq!(result.content, "hello from calvin");
    assert!(fetcher.has_content());

    // The store, not the raw response, is what got published.
    let stored = db.lock().await.profile("calvin").unwrap().unwrap();
    assert_eq!(stored, result);
}

#[tokio::test]
async fn update_if_needed_is_idempotent_when_nothing_changed() {
    let (db, client) = harness();
    mock(&client).set_statuses(vec![
        Status::new("1", "app", "first"),
        Status::new("2", "calvin", "second"),
    ]);

    let fetcher = ListFetcher::new(StatuslogSource::latest(), db, client, 24);
    fetcher.perform().await;
    let before = fetcher.results();

    fetcher.update_if_needed().await;
    let after = fetcher.results();

    assert_eq!(
        before.iter().map(Record::record_id).collect::<Vec<_>>(),
        after.iter().map(Record::record_id).collect::<Vec<_>>(),
    );
    assert_eq!(before.len(), after.len());
}

#[tokio::test]
async fn background_refresh_never_advances_the_pagination_cursor() {
    let (db, client) = harness();
    let limit = 4;

    // Two full pages exist, identical in the cache and remotely.
    let mut statuses = Vec::new();
    for i in 0..(2 * limit) {
        let mut status = Status::new(&format!("s{i:02}"), "app", "steady");
        status.posted = chrono::Utc::now() - chrono::Duration::minutes(i as i64);
        statuses.push(status);
    }
    {
        let store = db.lock().await;
        for status in &statuses {
            store.put_status(status).unwrap();
        }
    }
    mock(&client).set_statuses(statuses);

    let fetcher = ListFetcher::new(StatuslogSource::for_address("app"), db, client, limit);
    fetcher.perform().await;
    assert_eq!(fetcher.results().len(), limit);
    assert_eq!(fetcher.page(), Some(0));

    // A background refresh with nothing new must not creep onto page 1.
    fetcher.update_if_needed().await;
    assert_eq!(fetcher.results().len(), limit);
    assert_eq!(fetcher.page(), Some(0));

    // Scrolling is what advances the cursor.
    fetcher.fetch_models().await.unwrap();
    assert_eq!(fetcher.page(), Some(1));
    fetcher.fetch_models().await.unwrap();
    assert_eq!(fetcher.results().len(), 2 * limit);
}

#[tokio::test]
async fn failed_refresh_preserves_cached_results() {
    let (db, client) = harness();
    mock(&client).set_statuses(vec![Status::new("1", "app", "still here")]);

    let fetcher = ListFetcher::new(StatuslogSource::latest(), db, client.clone(), 24);
    fetcher.perform().await;
    assert_eq!(fetcher.results().len(), 1);

    mock(&client).fail_with("service unavailable");
    fetcher.perform().await;

    assert!(fetcher.error().is_some());
    assert_eq!(fetcher.results().len(), 1);
    assert_eq!(fetcher.results()[0].content, "still here");
}

#[tokio::test]
async fn pagination_terminates_after_a_short_page() {
    let (db, client) = harness();
    let limit = 4;

    // Exactly 2*limit + 3 matching records already in the cache.
    {
        let store = db.lock().await;
        for i in 0..(2 * limit + 3) {
            let mut status = Status::new(&format!("s{i:02}"), "app", "cached");
            status.posted = chrono::Utc::now() - chrono::Duration::minutes(i as i64);
            store.put_status(&status).unwrap();
        }
    }

    let fetcher = ListFetcher::new(StatuslogSource::for_address("app"), db, client, limit);

    fetcher.fetch_models().await.unwrap();
    assert_eq!(fetcher.results().len(), limit);
    assert_eq!(fetcher.page(), Some(1));

    fetcher.fetch_models().await.unwrap();
    assert_eq!(fetcher.results().len(), 2 * limit);
    assert_eq!(fetcher.page(), Some(2));

    fetcher.fetch_models().await.unwrap();
    assert_eq!(fetcher.results().len(), 2 * limit + 3);
    assert_eq!(fetcher.page(), None);

    // Further calls are no-ops.
    fetcher.fetch_models().await.unwrap();
    assert_eq!(fetcher.results().len(), 2 * limit + 3);
}

#[tokio::test]
async fn empty_cache_on_page_zero_keeps_paging_open_until_first_load() {
    let (db, client) = harness();
    mock(&client).set_statuses(vec![Status::new("1", "app", "late arrival")]);

    let fetcher = ListFetcher::new(StatuslogSource::latest(), db, client, 4);

    // Nothing cached yet: a short page 0 must not be mistaken for the end.
    fetcher.fetch_models().await.unwrap();
    assert!(fetcher.results().is_empty());
    assert_eq!(fetcher.page(), Some(0));

    // The remote refresh fills the cache and the page is re-readable.
    fetcher.perform().await;
    assert_eq!(fetcher.results().len(), 1);
}

#[tokio::test]
async fn directory_growth_merges_without_duplicates() {
    let (db, client) = harness();
    mock(&client).set_directory(&["app", "calvin"]);

    let fetcher = ListFetcher::new(DirectorySource, db.clone(), client.clone(), 24);
    fetcher.perform().await;

    let stored = db.lock().await.directory_entry("calvin").unwrap().unwrap();
    assert_eq!(stored.address, "calvin");

    mock(&client).set_directory(&["app", "calvin", "newuser"]);
    fetcher.perform().await;

    let mut addresses: Vec<String> = fetcher
        .results()
        .iter()
        .map(|entry| entry.address.clone())
        .collect();
    addresses.sort();
    assert_eq!(addresses, vec!["app", "calvin", "newuser"]);
}

#[tokio::test]
async fn writes_require_a_controlled_address() {
    let (db, client) = harness();
    mock(&client).set_addresses(&["app"]);

    let account = AccountFetcher::new(Credential::new("token"), db, client.clone(), 24);
    account.perform().await;
    assert!(account.controls("app"));
    assert!(!account.controls("calvin"));

    let err = account.follow("calvin", "someone").await.unwrap_err();
    assert_eq!(
        err,
        roost::FetchError::NotAuthorized {
            address: "calvin".to_string()
        }
    );
    // The gate fires before any network call.
    assert_eq!(mock(&client).calls("save_paste"), 0);
}

#[tokio::test]
async fn follow_updates_the_convention_paste_optimistically() {
    let (db, client) = harness();
    mock(&client).set_addresses(&["app"]);
    mock(&client).set_paste(Paste::from_address_list(
        "app",
        roost::models::FOLLOWING_PASTE,
        &["friend".to_string()],
    ));

    let account = AccountFetcher::new(Credential::new("token"), db, client.clone(), 24);
    account.perform().await;

    let summary = account.summary("app");
    summary.following().perform().await;
    assert_eq!(summary.following().results().len(), 1);

    account.follow("app", "newpal").await.unwrap();

    let members: Vec<String> = summary
        .following()
        .results()
        .iter()
        .map(|entry| entry.address.clone())
        .collect();
    assert_eq!(members, vec!["friend", "newpal"]);
    assert_eq!(mock(&client).calls("save_paste"), 1);

    // Repeating the same follow is a no-op, remotely too.
    account.follow("app", "newpal").await.unwrap();
    assert_eq!(mock(&client).calls("save_paste"), 1);
}

#[tokio::test]
async fn follow_before_the_list_loads_keeps_existing_members() {
    let (db, client) = harness();
    mock(&client).set_addresses(&["app"]);
    mock(&client).set_paste(Paste::from_address_list(
        "app",
        roost::models::FOLLOWING_PASTE,
        &["friend1".to_string(), "friend2".to_string()],
    ));

    let account = AccountFetcher::new(Credential::new("token"), db.clone(), client.clone(), 24);
    account.perform().await;

    // No fetch of the follow list has happened yet; the write must still
    // build on what the service holds, not on the empty overlay.
    account.follow("app", "newpal").await.unwrap();

    let stored = db
        .lock()
        .await
        .paste("app", roost::models::FOLLOWING_PASTE)
        .unwrap()
        .unwrap();
    assert_eq!(stored.address_list(), vec!["friend1", "friend2", "newpal"]);

    let members: Vec<String> = account
        .summary("app")
        .following()
        .results()
        .iter()
        .map(|entry| entry.address.clone())
        .collect();
    assert_eq!(members, vec!["friend1", "friend2", "newpal"]);
}

#[tokio::test]
async fn failed_follow_rolls_the_overlay_back() {
    let (db, client) = harness();
    mock(&client).set_addresses(&["app"]);
    mock(&client).set_paste(Paste::from_address_list(
        "app",
        roost::models::FOLLOWING_PASTE,
        &["friend".to_string()],
    ));

    let account = AccountFetcher::new(Credential::new("token"), db, client.clone(), 24);
    account.perform().await;

    let summary = account.summary("app");
    summary.following().perform().await;

    mock(&client).fail_with("write rejected");
    assert!(account.follow("app", "newpal").await.is_err());

    let members: Vec<String> = summary
        .following()
        .results()
        .iter()
        .map(|entry| entry.address.clone())
        .collect();
    assert_eq!(members, vec!["friend"]);
}

#[tokio::test]
async fn posted_status_is_written_through_and_deletable() {
    let (db, client) = harness();
    mock(&client).set_addresses(&["app"]);

    let account = AccountFetcher::new(Credential::new("token"), db.clone(), client, 24);
    account.perform().await;

    let posted = account
        .post_status("app", "hello world", Some("🌍"))
        .await
        .unwrap();
    assert!(db.lock().await.status("app", &posted.id).unwrap().is_some());

    account.delete_status("app", &posted.id).await.unwrap();
    assert!(db.lock().await.status("app", &posted.id).unwrap().is_none());
}

#[tokio::test]
async fn summary_aggregates_child_state() {
    let (db, client) = harness();
    mock(&client).set_profile(Profile::new("calvin", "hi"));
    mock(&client).set_statuses(vec![Status::new("1", "calvin", "around")]);
    mock(&client).set_addresses(&["app"]);

    let account = AccountFetcher::new(Credential::new("token"), db, client, 24);
    let summary = account.summary("calvin");

    assert!(!summary.loading());
    assert!(!summary.all_loaded());

    summary.perform().await;

    assert!(summary.all_loaded());
    assert!(summary.loaded().is_some());
    assert!(summary.has_content());
    assert!(summary.error().is_none());

    // Identity is stable while the cache holds the entry.
    assert!(Arc::ptr_eq(&summary, &account.summary("calvin")));
}
