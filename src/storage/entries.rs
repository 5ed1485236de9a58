use super::schema::Database;
use super::types::{Entry, FollowedEntry, NewEntry, StorageError};

impl Database {
    // ========================================================================
    // Entry Operations
    // ========================================================================

    /// Insert one entry, returning its id.
    ///
    /// The UNIQUE constraint on `link` is the deduplication mechanism: a
    /// link that already exists — offered by this source or any other —
    /// comes back as `StorageError::DuplicateKey`. The insert is a single
    /// statement, so it is safe to attempt concurrently for the same link;
    /// exactly one writer wins.
    pub async fn insert_entry(&self, entry: &NewEntry) -> Result<i64, StorageError> {
        let now = chrono::Utc::now().timestamp();
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO entries (source_id, title, description, link, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
        "#,
        )
        .bind(entry.source_id)
        .bind(&entry.title)
        .bind(&entry.description)
        .bind(&entry.link)
        .bind(entry.published_at)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?;

        Ok(row.0)
    }

    /// Recent entries from sources the user follows, most recent
    /// publication first.
    pub async fn entries_for_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<FollowedEntry>, StorageError> {
        let entries = sqlx::query_as::<_, FollowedEntry>(
            r#"
            SELECT e.id, s.name AS source_name, e.title, e.description, e.link, e.published_at
            FROM entries e
            JOIN sources s ON e.source_id = s.id
            JOIN follows f ON f.source_id = s.id
            WHERE f.user_id = ?
            ORDER BY e.published_at DESC
            LIMIT ?
        "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// All entries for one source, newest publication first.
    pub async fn entries_for_source(&self, source_id: i64) -> Result<Vec<Entry>, StorageError> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, source_id, title, description, link, published_at, created_at, updated_at
            FROM entries
            WHERE source_id = ?
            ORDER BY published_at DESC, id DESC
        "#,
        )
        .bind(source_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
