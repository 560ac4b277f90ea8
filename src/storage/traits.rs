use crate::domain::*;
use crate::error::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Row-level persistence for accounts, posts and comments.
///
/// Implementations enforce the integrity rules themselves: email uniqueness
/// (`StoreError::UniqueViolation`), existence of referenced rows
/// (`StoreError::ForeignKeyViolation`) and cascading deletes along the
/// relationship registry. Lookups of absent rows return `Ok(None)`/`Ok(false)`;
/// deciding whether that is an error is left to the caller.
#[async_trait]
pub trait Storage: Send + Sync {
    // Account operations
    async fn insert_account(&self, account: &NewAccount) -> StoreResult<Account>;
    async fn get_account(&self, id: i64) -> StoreResult<Option<Account>>;
    async fn list_accounts(&self) -> StoreResult<Vec<Account>>;
    async fn delete_account(&self, id: i64) -> StoreResult<bool>;

    // Post operations
    async fn insert_post(&self, post: &NewPost, created_at: DateTime<Utc>) -> StoreResult<Post>;
    async fn get_post(&self, id: i64) -> StoreResult<Option<Post>>;
    async fn list_posts(&self) -> StoreResult<Vec<Post>>;
    async fn list_posts_by_owner(&self, owner_id: i64) -> StoreResult<Vec<Post>>;
    /// Overwrites title, content and updated_at of an existing post.
    async fn update_post(&self, post: &Post) -> StoreResult<bool>;
    async fn delete_post(&self, id: i64) -> StoreResult<bool>;

    // Comment operations
    async fn insert_comment(
        &self,
        comment: &NewComment,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Comment>;
    async fn get_comment(&self, id: i64) -> StoreResult<Option<Comment>>;
    async fn list_comments(&self) -> StoreResult<Vec<Comment>>;
    async fn list_comments_by_post(&self, post_id: i64) -> StoreResult<Vec<Comment>>;
    async fn list_comments_by_author(&self, author_id: i64) -> StoreResult<Vec<Comment>>;
    async fn update_comment(&self, id: i64, content: &str) -> StoreResult<bool>;
    async fn delete_comment(&self, id: i64) -> StoreResult<bool>;
}
