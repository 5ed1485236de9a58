use sqlx::FromRow;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Storage-level errors.
///
/// `DuplicateKey` is a first-class variant because duplicate links are the
/// ingestion pipeline's deduplication mechanism, not a failure: callers must
/// be able to match on it without inspecting error text.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An insert violated a uniqueness constraint (entry link, source URL,
    /// user name, or follow pair).
    #[error("a record with this key already exists")]
    DuplicateKey,

    /// Migration failed
    #[error("database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl StorageError {
    /// Classify a sqlx error, surfacing uniqueness violations as
    /// `DuplicateKey` via the driver's structured error kind rather than by
    /// matching message text.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref dbe) = err {
            if dbe.is_unique_violation() {
                return StorageError::DuplicateKey;
            }
        }
        StorageError::Other(err)
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A registered account. Sources and follows hang off a user; which user is
/// "current" lives in the config file, not here.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A polling target.
///
/// `last_polled_at` is NULL until the scheduler first selects the source;
/// the due-ordering in `next_due_source` sorts those NULLs first.
#[derive(Debug, Clone, FromRow)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: Option<i64>,
    pub last_polled_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A persisted feed entry, unique by `link` across all sources.
#[derive(Debug, Clone, FromRow)]
pub struct Entry {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Candidate entry handed to `insert_entry` by the ingestion writer.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub source_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    pub published_at: Option<i64>,
}

/// An entry joined with the name of the source it came from, as returned by
/// the per-user browse query.
#[derive(Debug, Clone, FromRow)]
pub struct FollowedEntry {
    pub id: i64,
    pub source_name: String,
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    pub published_at: Option<i64>,
}

/// Row for the `sources` listing: source plus its owner's name.
#[derive(Debug, Clone, FromRow)]
pub struct SourceOverview {
    pub name: String,
    pub url: String,
    pub owner: Option<String>,
}
