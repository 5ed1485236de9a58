use super::schema::Database;
use super::types::{StorageError, User};

impl Database {
    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a user. Names are unique; a taken name surfaces as
    /// `StorageError::DuplicateKey`.
    pub async fn create_user(&self, name: &str) -> Result<User, StorageError> {
        let now = chrono::Utc::now().timestamp();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, created_at, updated_at)
            VALUES (?, ?, ?)
            RETURNING id, name, created_at, updated_at
        "#,
        )
        .bind(name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?;

        Ok(user)
    }

    pub async fn get_user_by_name(&self, name: &str) -> Result<Option<User>, StorageError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Delete every user. Sources, follows, and entries cascade with them;
    /// this is the `reset` command's dev/test convenience.
    pub async fn delete_users(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(())
    }

    // ========================================================================
    // Follow Operations
    // ========================================================================

    /// Follow a source. Re-following surfaces as `DuplicateKey` via the
    /// UNIQUE(user_id, source_id) constraint.
    pub async fn create_follow(&self, user_id: i64, source_id: i64) -> Result<(), StorageError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query("INSERT INTO follows (user_id, source_id, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(source_id)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)?;
        Ok(())
    }

    /// Remove a follow. Returns false when the user was not following the
    /// source.
    pub async fn delete_follow(&self, user_id: i64, source_id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND source_id = ?")
            .bind(user_id)
            .bind(source_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Names of the sources a user follows, for the `following` listing.
    pub async fn follows_for_user(&self, user_id: i64) -> Result<Vec<String>, StorageError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT s.name
            FROM follows f
            JOIN sources s ON f.source_id = s.id
            WHERE f.user_id = ?
            ORDER BY s.name
        "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
