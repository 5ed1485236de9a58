//! The feed-ingestion pipeline.
//!
//! One poll cycle flows scheduler → fetcher → parser → writer:
//!
//! - [`scheduler`] picks the least-recently-polled source each tick and
//!   drives one cycle, forever, with every failure contained to its cycle
//! - [`fetcher`] retrieves raw feed bytes with a fixed timeout and size cap
//! - [`parser`] decodes RSS into transient [`parser::ParsedFeed`] values
//! - [`writer`] advances poll bookkeeping and persists new entries,
//!   treating duplicate links as the expected dedup path
//!
//! Only the fetch and the tick wait suspend; parsing and entry
//! construction are pure CPU work.

pub mod fetcher;
pub mod parser;
pub mod scheduler;
pub mod writer;

pub use fetcher::{build_client, FetchError};
pub use parser::{parse_feed, ParseError, ParsedEntry, ParsedFeed};
pub use scheduler::{parse_interval, InvalidInterval};
pub use writer::{ingest_source, IngestError, IngestReport};
