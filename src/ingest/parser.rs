use chrono::DateTime;
use serde::Deserialize;
use thiserror::Error;

/// The one pubDate format the pipeline accepts: RFC 1123 with a numeric
/// zone, e.g. `Mon, 02 Jan 2006 15:04:05 -0700`. Anything else yields "no
/// timestamp", never an error.
pub const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

#[derive(Debug, Error)]
pub enum ParseError {
    /// The payload is not a structurally valid RSS document.
    #[error("malformed feed document: {0}")]
    Xml(#[from] quick_xml::DeError),
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct RssDocument {
    channel: RssChannel,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RssChannel {
    title: String,
    description: String,
    #[serde(rename = "item")]
    items: Vec<RssItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RssItem {
    title: String,
    link: String,
    description: String,
    #[serde(rename = "pubDate")]
    pub_date: String,
}

// ============================================================================
// Parsed model
// ============================================================================

/// Transient result of parsing one source's raw bytes. Lives only for the
/// duration of a poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: String,
    pub description: String,
    pub entries: Vec<ParsedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Unix seconds, present only when the pubDate string parsed under
    /// [`PUB_DATE_FORMAT`].
    pub published_at: Option<i64>,
}

/// Decode raw feed bytes into a [`ParsedFeed`].
///
/// An empty item list is valid. A malformed pubDate on one item degrades to
/// `published_at: None` without failing the document; only structural XML
/// problems are errors.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed, ParseError> {
    let text = String::from_utf8_lossy(bytes);
    let doc: RssDocument = quick_xml::de::from_str(&text)?;

    let entries = doc
        .channel
        .items
        .into_iter()
        .map(|item| ParsedEntry {
            title: unescape_entities(&item.title),
            description: unescape_entities(&item.description),
            link: item.link,
            published_at: parse_pub_date(&item.pub_date),
        })
        .collect();

    Ok(ParsedFeed {
        title: unescape_entities(&doc.channel.title),
        description: unescape_entities(&doc.channel.description),
        entries,
    })
}

fn parse_pub_date(raw: &str) -> Option<i64> {
    DateTime::parse_from_str(raw.trim(), PUB_DATE_FORMAT)
        .ok()
        .map(|dt| dt.timestamp())
}

/// Decode one extra level of character references in display text.
///
/// The XML deserializer already expanded entities once; feeds routinely
/// double-escape, leaving `&amp;` (or worse) in titles and descriptions.
/// Best-effort: text that won't decode (a bare `&`, an unknown entity)
/// passes through unchanged.
fn unescape_entities(text: &str) -> String {
    match quick_xml::escape::unescape(text) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => text.to_string(),
    }
}
