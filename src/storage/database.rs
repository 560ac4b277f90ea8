use super::traits::Storage;
use crate::db::{classify, DatabaseManager};
use crate::domain::*;
use crate::error::{ServiceError, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use libsql::{Row, Value};
use std::sync::Arc;
use tracing::{debug, info};

const ACCOUNT_COLUMNS: &str = "id, name, email";
const POST_COLUMNS: &str = "id, title, content, owner_id, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, content, author_id, post_id, created_at";

/// SQLite storage. Uniqueness, foreign keys and cascading deletes are enforced
/// by the schema's constraints.
pub struct DatabaseStorage {
    db: Arc<DatabaseManager>,
}

impl DatabaseStorage {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Open the database at `path` and bring its schema up to date.
    pub async fn open(path: &str) -> Result<Self, ServiceError> {
        let db = DatabaseManager::open(path).await?;
        db.run_migrations().await?;
        Ok(Self::new(Arc::new(db)))
    }

    async fn execute(&self, sql: &str, params: Vec<Value>, context: &str) -> StoreResult<u64> {
        let conn = self.db.get_connection().await?;
        conn.execute(sql, params)
            .await
            .map_err(|e| classify(e, context))
    }

    /// Run an INSERT and return the generated rowid.
    async fn insert(&self, sql: &str, params: Vec<Value>, context: &str) -> StoreResult<i64> {
        let conn = self.db.get_connection().await?;
        conn.execute(sql, params)
            .await
            .map_err(|e| classify(e, context))?;
        Ok(conn.last_insert_rowid())
    }

    async fn query<T>(
        &self,
        sql: &str,
        params: Vec<Value>,
        map: fn(&Row) -> StoreResult<T>,
        context: &str,
    ) -> StoreResult<Vec<T>> {
        let conn = self.db.get_connection().await?;
        let mut rows = conn
            .query(sql, params)
            .await
            .map_err(|e| classify(e, context))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::database(format!("Failed to read row: {e}")))?
        {
            results.push(map(&row)?);
        }
        Ok(results)
    }

    async fn query_one<T>(
        &self,
        sql: &str,
        params: Vec<Value>,
        map: fn(&Row) -> StoreResult<T>,
        context: &str,
    ) -> StoreResult<Option<T>> {
        Ok(self.query(sql, params, map, context).await?.into_iter().next())
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    // SQLite's CURRENT_TIMESTAMP layout, for rows written outside this service
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| StoreError::database(format!("Invalid timestamp '{raw}': {e}")))
}

fn int_column(row: &Row, idx: i32, name: &str) -> StoreResult<i64> {
    match row.get_value(idx) {
        Ok(Value::Integer(v)) => Ok(v),
        Ok(other) => Err(StoreError::database(format!(
            "Unexpected value for {name}: {other:?}"
        ))),
        Err(e) => Err(StoreError::database(format!("Failed to get {name}: {e}"))),
    }
}

fn optional_text_column(row: &Row, idx: i32, name: &str) -> StoreResult<Option<String>> {
    match row.get_value(idx) {
        Ok(Value::Text(v)) => Ok(Some(v)),
        Ok(Value::Null) => Ok(None),
        Ok(other) => Err(StoreError::database(format!(
            "Unexpected value for {name}: {other:?}"
        ))),
        Err(e) => Err(StoreError::database(format!("Failed to get {name}: {e}"))),
    }
}

fn text_column(row: &Row, idx: i32, name: &str) -> StoreResult<String> {
    optional_text_column(row, idx, name)?
        .ok_or_else(|| StoreError::database(format!("Unexpected NULL in {name}")))
}

fn account_from_row(row: &Row) -> StoreResult<Account> {
    Ok(Account {
        id: int_column(row, 0, "id")?,
        name: text_column(row, 1, "name")?,
        email: text_column(row, 2, "email")?,
    })
}

fn post_from_row(row: &Row) -> StoreResult<Post> {
    Ok(Post {
        id: int_column(row, 0, "id")?,
        title: text_column(row, 1, "title")?,
        content: text_column(row, 2, "content")?,
        owner_id: int_column(row, 3, "owner_id")?,
        created_at: parse_timestamp(&text_column(row, 4, "created_at")?)?,
        updated_at: optional_text_column(row, 5, "updated_at")?
            .map(|raw| parse_timestamp(&raw))
            .transpose()?,
    })
}

fn comment_from_row(row: &Row) -> StoreResult<Comment> {
    Ok(Comment {
        id: int_column(row, 0, "id")?,
        content: text_column(row, 1, "content")?,
        author_id: int_column(row, 2, "author_id")?,
        post_id: int_column(row, 3, "post_id")?,
        created_at: parse_timestamp(&text_column(row, 4, "created_at")?)?,
    })
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn insert_account(&self, account: &NewAccount) -> StoreResult<Account> {
        let id = self
            .insert(
                "INSERT INTO accounts (name, email) VALUES (?1, ?2)",
                vec![
                    Value::Text(account.name.clone()),
                    Value::Text(account.email.clone()),
                ],
                "Failed to insert account",
            )
            .await?;

        info!("Inserted account {} ({})", id, account.email);
        Ok(Account {
            id,
            name: account.name.clone(),
            email: account.email.clone(),
        })
    }

    async fn get_account(&self, id: i64) -> StoreResult<Option<Account>> {
        self.query_one(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
            vec![Value::Integer(id)],
            account_from_row,
            "Failed to query account",
        )
        .await
    }

    async fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        self.query(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"),
            vec![],
            account_from_row,
            "Failed to query accounts",
        )
        .await
    }

    async fn delete_account(&self, id: i64) -> StoreResult<bool> {
        let deleted = self
            .execute(
                "DELETE FROM accounts WHERE id = ?1",
                vec![Value::Integer(id)],
                "Failed to delete account",
            )
            .await?;
        Ok(deleted > 0)
    }

    async fn insert_post(&self, post: &NewPost, created_at: DateTime<Utc>) -> StoreResult<Post> {
        let id = self
            .insert(
                "INSERT INTO posts (title, content, owner_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                vec![
                    Value::Text(post.title.clone()),
                    Value::Text(post.content.clone()),
                    Value::Integer(post.owner_id),
                    Value::Text(format_timestamp(&created_at)),
                ],
                "Failed to insert post",
            )
            .await?;

        info!("Inserted post {} for account {}", id, post.owner_id);
        Ok(Post {
            id,
            title: post.title.clone(),
            content: post.content.clone(),
            owner_id: post.owner_id,
            created_at,
            updated_at: None,
        })
    }

    async fn get_post(&self, id: i64) -> StoreResult<Option<Post>> {
        self.query_one(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
            vec![Value::Integer(id)],
            post_from_row,
            "Failed to query post",
        )
        .await
    }

    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        self.query(
            &format!("SELECT {POST_COLUMNS} FROM posts ORDER BY id"),
            vec![],
            post_from_row,
            "Failed to query posts",
        )
        .await
    }

    async fn list_posts_by_owner(&self, owner_id: i64) -> StoreResult<Vec<Post>> {
        debug!("Loading posts owned by account {}", owner_id);
        self.query(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE owner_id = ?1 ORDER BY id"),
            vec![Value::Integer(owner_id)],
            post_from_row,
            "Failed to query posts by owner",
        )
        .await
    }

    async fn update_post(&self, post: &Post) -> StoreResult<bool> {
        let updated_at = match &post.updated_at {
            Some(ts) => Value::Text(format_timestamp(ts)),
            None => Value::Null,
        };
        let updated = self
            .execute(
                "UPDATE posts SET title = ?1, content = ?2, updated_at = ?3 WHERE id = ?4",
                vec![
                    Value::Text(post.title.clone()),
                    Value::Text(post.content.clone()),
                    updated_at,
                    Value::Integer(post.id),
                ],
                "Failed to update post",
            )
            .await?;
        Ok(updated > 0)
    }

    async fn delete_post(&self, id: i64) -> StoreResult<bool> {
        let deleted = self
            .execute(
                "DELETE FROM posts WHERE id = ?1",
                vec![Value::Integer(id)],
                "Failed to delete post",
            )
            .await?;
        Ok(deleted > 0)
    }

    async fn insert_comment(
        &self,
        comment: &NewComment,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Comment> {
        let id = self
            .insert(
                "INSERT INTO comments (content, author_id, post_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                vec![
                    Value::Text(comment.content.clone()),
                    Value::Integer(comment.author_id),
                    Value::Integer(comment.post_id),
                    Value::Text(format_timestamp(&created_at)),
                ],
                "Failed to insert comment",
            )
            .await?;

        info!("Inserted comment {} on post {}", id, comment.post_id);
        Ok(Comment {
            id,
            content: comment.content.clone(),
            author_id: comment.author_id,
            post_id: comment.post_id,
            created_at,
        })
    }

    async fn get_comment(&self, id: i64) -> StoreResult<Option<Comment>> {
        self.query_one(
            &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
            vec![Value::Integer(id)],
            comment_from_row,
            "Failed to query comment",
        )
        .await
    }

    async fn list_comments(&self) -> StoreResult<Vec<Comment>> {
        self.query(
            &format!("SELECT {COMMENT_COLUMNS} FROM comments ORDER BY id"),
            vec![],
            comment_from_row,
            "Failed to query comments",
        )
        .await
    }

    async fn list_comments_by_post(&self, post_id: i64) -> StoreResult<Vec<Comment>> {
        debug!("Loading comments on post {}", post_id);
        self.query(
            &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = ?1 ORDER BY id"),
            vec![Value::Integer(post_id)],
            comment_from_row,
            "Failed to query comments by post",
        )
        .await
    }

    async fn list_comments_by_author(&self, author_id: i64) -> StoreResult<Vec<Comment>> {
        debug!("Loading comments written by account {}", author_id);
        self.query(
            &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE author_id = ?1 ORDER BY id"),
            vec![Value::Integer(author_id)],
            comment_from_row,
            "Failed to query comments by author",
        )
        .await
    }

    async fn update_comment(&self, id: i64, content: &str) -> StoreResult<bool> {
        let updated = self
            .execute(
                "UPDATE comments SET content = ?1 WHERE id = ?2",
                vec![Value::Text(content.to_string()), Value::Integer(id)],
                "Failed to update comment",
            )
            .await?;
        Ok(updated > 0)
    }

    async fn delete_comment(&self, id: i64) -> StoreResult<bool> {
        let deleted = self
            .execute(
                "DELETE FROM comments WHERE id = ?1",
                vec![Value::Integer(id)],
                "Failed to delete comment",
            )
            .await?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_exactly() {
        let now = Utc::now();
        assert_eq!(parse_timestamp(&format_timestamp(&now)).unwrap(), now);
    }

    #[test]
    fn sqlite_default_timestamps_are_accepted() {
        let ts = parse_timestamp("2025-05-16 04:20:09").unwrap();
        assert_eq!(format_timestamp(&ts), "2025-05-16T04:20:09.000000000Z");
        // strftime('%Y-%m-%dT%H:%M:%fZ') as used by the column defaults
        assert!(parse_timestamp("2025-05-16T04:20:09.123Z").is_ok());
    }
}
