//! End-to-end poll-cycle tests: a mock HTTP feed on one side, an in-memory
//! SQLite database on the other, and the real fetch→parse→write pipeline
//! between them. Each test owns its database and mock server.

use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::sync::watch;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use trawl::ingest::{build_client, ingest_source, scheduler, IngestError};
use trawl::storage::{Database, NewEntry, Source};

const THREE_ITEM_FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Test Channel</title>
    <description>Testing</description>
    <item>
      <title>Post One</title>
      <link>https://example.com/posts/1</link>
      <description>First</description>
      <pubDate>Mon, 02 Jan 2006 15:04:05 -0700</pubDate>
    </item>
    <item>
      <title>Post Two</title>
      <link>https://example.com/posts/2</link>
      <description>Second</description>
      <pubDate>Tue, 03 Jan 2006 15:04:05 -0700</pubDate>
    </item>
    <item>
      <title>Post Three</title>
      <link>https://example.com/posts/3</link>
      <description>Third</description>
      <pubDate>Wed, 04 Jan 2006 15:04:05 -0700</pubDate>
    </item>
  </channel>
</rss>"#;

async fn serve_feed(body: &str, status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

async fn seed_source(db: &Database, url: &str) -> Source {
    let user = db.create_user("tester").await.unwrap();
    db.create_source("Test Source", url, user.id).await.unwrap()
}

async fn reload(db: &Database, source: &Source) -> Source {
    db.get_source_by_url(&source.url).await.unwrap().unwrap()
}

#[tokio::test]
async fn three_new_items_all_persist() {
    let server = serve_feed(THREE_ITEM_FEED, 200).await;
    let db = Database::open(":memory:").await.unwrap();
    let source = seed_source(&db, &format!("{}/feed", server.uri())).await;
    let client = build_client().unwrap();

    let report = ingest_source(&db, &client, &source).await.unwrap();
    assert_eq!(report.entries_found, 3);
    assert_eq!(report.entries_inserted, 3);

    let entries = db.entries_for_source(source.id).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.published_at.is_some()));

    assert!(reload(&db, &source).await.last_polled_at.is_some());
}

#[tokio::test]
async fn existing_link_is_skipped_silently() {
    let server = serve_feed(THREE_ITEM_FEED, 200).await;
    let db = Database::open(":memory:").await.unwrap();
    let source = seed_source(&db, &format!("{}/feed", server.uri())).await;
    let client = build_client().unwrap();

    // One of the feed's links is already on record.
    db.insert_entry(&NewEntry {
        source_id: source.id,
        title: "Post Two (older copy)".to_string(),
        description: None,
        link: "https://example.com/posts/2".to_string(),
        published_at: None,
    })
    .await
    .unwrap();

    let report = ingest_source(&db, &client, &source).await.unwrap();
    assert_eq!(report.entries_found, 3);
    assert_eq!(report.entries_inserted, 2);

    let entries = db.entries_for_source(source.id).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert!(reload(&db, &source).await.last_polled_at.is_some());
}

#[tokio::test]
async fn ingesting_the_same_feed_twice_is_idempotent() {
    let server = serve_feed(THREE_ITEM_FEED, 200).await;
    let db = Database::open(":memory:").await.unwrap();
    let source = seed_source(&db, &format!("{}/feed", server.uri())).await;
    let client = build_client().unwrap();

    let first = ingest_source(&db, &client, &source).await.unwrap();
    assert_eq!(first.entries_inserted, 3);

    // Second pass over identical content inserts nothing and raises nothing.
    let second = ingest_source(&db, &client, &source).await.unwrap();
    assert_eq!(second.entries_found, 3);
    assert_eq!(second.entries_inserted, 0);

    assert_eq!(db.entries_for_source(source.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn fetch_failure_still_advances_poll_timestamp() {
    let server = serve_feed("", 500).await;
    let db = Database::open(":memory:").await.unwrap();
    let source = seed_source(&db, &format!("{}/feed", server.uri())).await;
    let client = build_client().unwrap();

    let err = ingest_source(&db, &client, &source).await.unwrap_err();
    assert!(matches!(err, IngestError::Fetch(_)));

    // The failing source rotates to the back of the queue instead of being
    // retried immediately: its timestamp moved even though nothing landed.
    assert!(reload(&db, &source).await.last_polled_at.is_some());
    assert!(db.entries_for_source(source.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn parse_failure_aborts_cycle_after_poll_mark() {
    let server = serve_feed("this is not a feed", 200).await;
    let db = Database::open(":memory:").await.unwrap();
    let source = seed_source(&db, &format!("{}/feed", server.uri())).await;
    let client = build_client().unwrap();

    let err = ingest_source(&db, &client, &source).await.unwrap_err();
    assert!(matches!(err, IngestError::Parse(_)));

    assert!(reload(&db, &source).await.last_polled_at.is_some());
    assert!(db.entries_for_source(source.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_item_date_does_not_block_siblings() {
    let feed = r#"<rss version="2.0"><channel><title>t</title>
      <item>
        <title>Dated</title>
        <link>https://example.com/dated</link>
        <pubDate>Mon, 02 Jan 2006 15:04:05 -0700</pubDate>
      </item>
      <item>
        <title>Undated</title>
        <link>https://example.com/undated</link>
        <pubDate>yesterday-ish</pubDate>
      </item>
    </channel></rss>"#;

    let server = serve_feed(feed, 200).await;
    let db = Database::open(":memory:").await.unwrap();
    let source = seed_source(&db, &format!("{}/feed", server.uri())).await;
    let client = build_client().unwrap();

    let report = ingest_source(&db, &client, &source).await.unwrap();
    assert_eq!(report.entries_inserted, 2);

    let entries = db.entries_for_source(source.id).await.unwrap();
    let dated = entries.iter().find(|e| e.title == "Dated").unwrap();
    let undated = entries.iter().find(|e| e.title == "Undated").unwrap();
    assert!(dated.published_at.is_some());
    assert_eq!(undated.published_at, None);
}

#[tokio::test]
async fn scheduler_runs_first_cycle_immediately() {
    let server = serve_feed(THREE_ITEM_FEED, 200).await;
    let db = Database::open(":memory:").await.unwrap();
    let source = seed_source(&db, &format!("{}/feed", server.uri())).await;
    let client = build_client().unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    // An hour-long interval: anything persisted below came from the
    // immediate first cycle, not a later tick.
    let handle = tokio::spawn(scheduler::run(
        db.clone(),
        client,
        Duration::from_secs(3600),
        shutdown_rx,
    ));

    tokio::time::sleep(Duration::from_millis(400)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    assert_eq!(db.entries_for_source(source.id).await.unwrap().len(), 3);
    assert!(reload(&db, &source).await.last_polled_at.is_some());
}

#[tokio::test]
async fn scheduler_keeps_ticking_with_no_sources() {
    let db = Database::open(":memory:").await.unwrap();
    let client = build_client().unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler::run(
        db.clone(),
        client,
        Duration::from_millis(20),
        shutdown_rx,
    ));

    // Several empty ticks pass without the loop dying...
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!handle.is_finished());

    // ...and shutdown still lands cleanly.
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn scheduler_rotates_through_sources_least_recent_first() {
    let server = serve_feed(THREE_ITEM_FEED, 200).await;
    let db = Database::open(":memory:").await.unwrap();
    let user = db.create_user("tester").await.unwrap();
    let first = db
        .create_source("First", &format!("{}/a", server.uri()), user.id)
        .await
        .unwrap();
    let second = db
        .create_source("Second", &format!("{}/b", server.uri()), user.id)
        .await
        .unwrap();
    let client = build_client().unwrap();

    // Poll whichever is due, twice; both sources should end up polled.
    for _ in 0..2 {
        let due = db.next_due_source().await.unwrap().unwrap();
        let _ = ingest_source(&db, &client, &due).await;
    }

    assert!(reload(&db, &first).await.last_polled_at.is_some());
    assert!(reload(&db, &second).await.last_polled_at.is_some());
}
