//! SQLite-backed persistence for sources, entries, users, and follows.
//!
//! [`Database`] is a cheap-to-clone pool handle; the ingestion pipeline
//! receives it explicitly rather than reaching for a global. The pipeline
//! itself only needs four capabilities — next due source, mark polled,
//! insert entry, list entries — but the CLI commands lean on the wider
//! user/follow surface as well.

mod entries;
mod schema;
mod sources;
mod types;
mod users;

pub use schema::Database;
pub use types::{Entry, FollowedEntry, NewEntry, Source, SourceOverview, StorageError, User};
