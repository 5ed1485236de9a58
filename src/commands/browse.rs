use anyhow::{Context, Result};
use chrono::DateTime;

use super::App;

/// Print the most recent entries from the current user's followed sources.
pub async fn browse(app: &App, limit: i64) -> Result<()> {
    let user = app.require_user().await?;

    let entries = app
        .db
        .entries_for_user(user.id, limit)
        .await
        .context("couldn't retrieve entries")?;

    println!("Found {} entries for '{}':", entries.len(), user.name);
    for entry in entries {
        println!("{} from {}", format_published(entry.published_at), entry.source_name);
        println!("--- {} ---", entry.title);
        if let Some(description) = &entry.description {
            println!("    {}", description);
        }
        println!("Link: {}", entry.link);
        println!("=====================================");
    }
    Ok(())
}

fn format_published(published_at: Option<i64>) -> String {
    published_at
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.format("%a %b %e %Y").to_string())
        .unwrap_or_else(|| "undated".to_string())
}
