use thiserror::Error;

use super::fetcher::{fetch_source, FetchError};
use super::parser::{parse_feed, ParseError};
use crate::storage::{Database, NewEntry, Source, StorageError};

/// Why a poll cycle ended early for one source. None of these propagate
/// past the scheduler's per-cycle log line.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The poll-timestamp update failed; the cycle aborts before any fetch
    /// so poll bookkeeping never lags behind network work.
    #[error("couldn't mark source as polled: {0}")]
    PollMark(#[source] StorageError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Outcome of one successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Items present in the fetched document
    pub entries_found: usize,
    /// Items newly persisted (found minus duplicates and write failures)
    pub entries_inserted: usize,
}

/// Run one full ingest cycle for a source: advance its poll timestamp,
/// fetch, parse, and persist whatever is new.
///
/// The timestamp moves first, unconditionally. A source whose fetch or
/// parse keeps failing therefore rotates to the back of the polling order
/// instead of being retried every tick.
///
/// Duplicate links are the expected dedup path and are skipped silently.
/// Any other per-entry write failure is logged and skipped; the remaining
/// entries still land (partial success is normal).
pub async fn ingest_source(
    db: &Database,
    client: &reqwest::Client,
    source: &Source,
) -> Result<IngestReport, IngestError> {
    db.mark_source_polled(source.id)
        .await
        .map_err(IngestError::PollMark)?;

    let bytes = fetch_source(client, &source.url).await?;
    let feed = parse_feed(&bytes)?;

    tracing::debug!(source = %source.name, feed_title = %feed.title, "parsed feed");

    let entries_found = feed.entries.len();
    let mut entries_inserted = 0;

    for item in feed.entries {
        let entry = NewEntry {
            source_id: source.id,
            title: item.title,
            description: (!item.description.is_empty()).then_some(item.description),
            link: item.link,
            published_at: item.published_at,
        };

        match db.insert_entry(&entry).await {
            Ok(_) => entries_inserted += 1,
            // The link has been seen before, from this source or another.
            Err(StorageError::DuplicateKey) => continue,
            Err(e) => {
                tracing::error!(
                    source = %source.name,
                    link = %entry.link,
                    error = %e,
                    "couldn't store entry"
                );
            }
        }
    }

    tracing::info!(
        source = %source.name,
        found = entries_found,
        inserted = entries_inserted,
        "source collected"
    );

    Ok(IngestReport {
        entries_found,
        entries_inserted,
    })
}
