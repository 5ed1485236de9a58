use super::schema::Database;
use super::types::{Source, SourceOverview, StorageError};

impl Database {
    // ========================================================================
    // Source Operations
    // ========================================================================

    /// Register a new polling target. The URL is unique across all sources;
    /// re-registering one surfaces as `StorageError::DuplicateKey`.
    pub async fn create_source(
        &self,
        name: &str,
        url: &str,
        user_id: i64,
    ) -> Result<Source, StorageError> {
        let now = chrono::Utc::now().timestamp();
        let source = sqlx::query_as::<_, Source>(
            r#"
            INSERT INTO sources (name, url, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, url, user_id, last_polled_at, created_at, updated_at
        "#,
        )
        .bind(name)
        .bind(url)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?;

        Ok(source)
    }

    pub async fn get_source_by_url(&self, url: &str) -> Result<Option<Source>, StorageError> {
        let source = sqlx::query_as::<_, Source>(
            r#"
            SELECT id, name, url, user_id, last_polled_at, created_at, updated_at
            FROM sources
            WHERE url = ?
        "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(source)
    }

    /// All sources with their owner's name, for the `sources` listing.
    pub async fn list_sources(&self) -> Result<Vec<SourceOverview>, StorageError> {
        let rows = sqlx::query_as::<_, SourceOverview>(
            r#"
            SELECT s.name, s.url, u.name AS owner
            FROM sources s
            LEFT JOIN users u ON s.user_id = u.id
            ORDER BY s.name
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// The source with the least-recent poll timestamp, never-polled sources
    /// first. `None` when no sources are registered — the scheduler's normal
    /// idle state, not an error.
    pub async fn next_due_source(&self) -> Result<Option<Source>, StorageError> {
        let source = sqlx::query_as::<_, Source>(
            r#"
            SELECT id, name, url, user_id, last_polled_at, created_at, updated_at
            FROM sources
            ORDER BY last_polled_at ASC NULLS FIRST
            LIMIT 1
        "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(source)
    }

    /// Advance a source's poll timestamp to now. Called at the top of every
    /// ingest cycle, before the fetch, so a failing source rotates to the
    /// back of the polling order instead of being retried every tick.
    pub async fn mark_source_polled(&self, source_id: i64) -> Result<(), StorageError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query("UPDATE sources SET last_polled_at = ?, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(now)
            .bind(source_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, StorageError};

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    async fn test_user(db: &Database) -> i64 {
        db.create_user("tester").await.unwrap().id
    }

    async fn set_polled_at(db: &Database, source_id: i64, ts: Option<i64>) {
        sqlx::query("UPDATE sources SET last_polled_at = ? WHERE id = ?")
            .bind(ts)
            .bind(source_id)
            .execute(&db.pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_and_fetch_by_url() {
        let db = test_db().await;
        let user_id = test_user(&db).await;

        let created = db
            .create_source("Example", "https://example.com/rss", user_id)
            .await
            .unwrap();
        assert!(created.last_polled_at.is_none());

        let found = db
            .get_source_by_url("https://example.com/rss")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "Example");

        assert!(db
            .get_source_by_url("https://other.example.com/rss")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_url_is_duplicate_key() {
        let db = test_db().await;
        let user_id = test_user(&db).await;

        db.create_source("First", "https://example.com/rss", user_id)
            .await
            .unwrap();
        let err = db
            .create_source("Second", "https://example.com/rss", user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateKey));
    }

    #[tokio::test]
    async fn next_due_prefers_never_polled() {
        let db = test_db().await;
        let user_id = test_user(&db).await;

        let a = db
            .create_source("A", "https://a.example.com/rss", user_id)
            .await
            .unwrap();
        let b = db
            .create_source("B", "https://b.example.com/rss", user_id)
            .await
            .unwrap();
        let c = db
            .create_source("C", "https://c.example.com/rss", user_id)
            .await
            .unwrap();

        set_polled_at(&db, a.id, Some(1_000)).await;
        set_polled_at(&db, b.id, Some(2_000)).await;

        // C has never been polled, so it sorts before any timestamp.
        let due = db.next_due_source().await.unwrap().unwrap();
        assert_eq!(due.id, c.id);

        // Once every source has a timestamp, the oldest wins.
        set_polled_at(&db, c.id, Some(3_000)).await;
        let due = db.next_due_source().await.unwrap().unwrap();
        assert_eq!(due.id, a.id);
    }

    #[tokio::test]
    async fn next_due_on_empty_table_is_none() {
        let db = test_db().await;
        assert!(db.next_due_source().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mark_polled_sets_timestamp() {
        let db = test_db().await;
        let user_id = test_user(&db).await;
        let source = db
            .create_source("A", "https://a.example.com/rss", user_id)
            .await
            .unwrap();

        db.mark_source_polled(source.id).await.unwrap();

        let polled = db
            .get_source_by_url("https://a.example.com/rss")
            .await
            .unwrap()
            .unwrap();
        assert!(polled.last_polled_at.is_some());
        assert!(polled.updated_at >= source.updated_at);
    }

    #[tokio::test]
    async fn list_sources_includes_owner() {
        let db = test_db().await;
        let user_id = test_user(&db).await;
        db.create_source("Example", "https://example.com/rss", user_id)
            .await
            .unwrap();

        let listing = db.list_sources().await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name, "Example");
        assert_eq!(listing[0].owner.as_deref(), Some("tester"));
    }
}
