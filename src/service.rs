//! Access layer shared by the REST handlers and the GraphQL resolvers.
//!
//! Every operation validates its payload and checks referenced rows before the
//! first write. Store failures are translated here: unique violations become
//! `Conflict`, anything unanticipated is logged in full and surfaced as an
//! opaque `AccessError::Store`.

use crate::domain::*;
use crate::error::{AccessError, Result, StoreError};
use crate::storage::Storage;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct ContentService {
    storage: Arc<dyn Storage>,
}

fn store_failure(context: &str, err: StoreError) -> AccessError {
    match err {
        StoreError::UniqueViolation { constraint } => AccessError::Conflict {
            message: match constraint.as_str() {
                "uq_accounts_email" => "Email already exists".to_string(),
                other => format!("Duplicate value violates {other}"),
            },
        },
        other => {
            error!("{}: {}", context, other);
            AccessError::Store(other)
        }
    }
}

/// `updated_at` must move forward even when the clock has not visibly advanced
/// since the previous write.
fn next_update_time(post: &Post) -> DateTime<Utc> {
    let now = Utc::now();
    let last = post.updated_at.unwrap_or(post.created_at);
    if now > last {
        now
    } else {
        last + Duration::microseconds(1)
    }
}

impl ContentService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    async fn require_account(&self, id: i64) -> Result<Account> {
        self.storage
            .get_account(id)
            .await
            .map_err(|e| store_failure("Failed to load account", e))?
            .ok_or_else(|| AccessError::not_found("Account", id))
    }

    async fn require_post(&self, id: i64) -> Result<Post> {
        self.storage
            .get_post(id)
            .await
            .map_err(|e| store_failure("Failed to load post", e))?
            .ok_or_else(|| AccessError::not_found("Post", id))
    }

    async fn require_comment(&self, id: i64) -> Result<Comment> {
        self.storage
            .get_comment(id)
            .await
            .map_err(|e| store_failure("Failed to load comment", e))?
            .ok_or_else(|| AccessError::not_found("Comment", id))
    }

    // ---- Accounts ----

    pub async fn create_account(&self, payload: AccountPayload) -> Result<Account> {
        let account = payload.validate()?;
        let created = self
            .storage
            .insert_account(&account)
            .await
            .map_err(|e| store_failure("Failed to create account", e))?;
        info!("Created account {} ({})", created.id, created.email);
        Ok(created)
    }

    pub async fn list_accounts(&self, include: AccountRelations) -> Result<Vec<AccountView>> {
        let accounts = self
            .storage
            .list_accounts()
            .await
            .map_err(|e| store_failure("Failed to list accounts", e))?;

        let mut views = Vec::with_capacity(accounts.len());
        for account in accounts {
            views.push(self.account_view(account, include).await?);
        }
        Ok(views)
    }

    pub async fn get_account(&self, id: i64, include: AccountRelations) -> Result<AccountView> {
        let account = self.require_account(id).await?;
        self.account_view(account, include).await
    }

    async fn account_view(&self, account: Account, include: AccountRelations) -> Result<AccountView> {
        let posts = if include.posts {
            Some(self.posts_by_owner(account.id).await?)
        } else {
            None
        };
        let comments = if include.comments {
            Some(self.comments_by_author(account.id).await?)
        } else {
            None
        };
        Ok(AccountView {
            account,
            posts,
            comments,
        })
    }

    /// Deletes the account; its posts and comments go with it.
    pub async fn delete_account(&self, id: i64) -> Result<Account> {
        let account = self.require_account(id).await?;
        let deleted = self
            .storage
            .delete_account(id)
            .await
            .map_err(|e| store_failure("Failed to delete account", e))?;
        if !deleted {
            return Err(AccessError::not_found("Account", id));
        }
        info!("Deleted account {}", id);
        Ok(account)
    }

    // ---- Posts ----

    pub async fn create_post(&self, payload: PostPayload) -> Result<Post> {
        let post = payload.validate()?;
        self.require_account(post.owner_id).await?;

        match self.storage.insert_post(&post, Utc::now()).await {
            Ok(created) => {
                info!("Created post {} for account {}", created.id, created.owner_id);
                Ok(created)
            }
            // The owner vanished between the check and the insert
            Err(StoreError::ForeignKeyViolation { .. }) => {
                Err(AccessError::not_found("Account", post.owner_id))
            }
            Err(e) => Err(store_failure("Failed to create post", e)),
        }
    }

    pub async fn list_posts(&self, include: PostRelations) -> Result<Vec<PostView>> {
        let posts = self
            .storage
            .list_posts()
            .await
            .map_err(|e| store_failure("Failed to list posts", e))?;

        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            views.push(self.post_view(post, include).await?);
        }
        Ok(views)
    }

    pub async fn posts_by_owner(&self, owner_id: i64) -> Result<Vec<Post>> {
        debug!("Fetching posts for account {}", owner_id);
        self.storage
            .list_posts_by_owner(owner_id)
            .await
            .map_err(|e| store_failure("Failed to list posts by owner", e))
    }

    pub async fn get_post(&self, id: i64, include: PostRelations) -> Result<PostView> {
        let post = self.require_post(id).await?;
        self.post_view(post, include).await
    }

    pub async fn post_view(&self, post: Post, include: PostRelations) -> Result<PostView> {
        let owner = if include.owner {
            Some(self.require_account(post.owner_id).await?)
        } else {
            None
        };
        let comments = if include.comments {
            Some(self.comments_by_post(post.id).await?)
        } else {
            None
        };
        Ok(PostView {
            post,
            owner,
            comments,
        })
    }

    /// Applies the fields present in `changes` and refreshes `updated_at`.
    pub async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Post> {
        let changes = changes.validate()?;
        let mut post = self.require_post(id).await?;

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        post.updated_at = Some(next_update_time(&post));

        let updated = self
            .storage
            .update_post(&post)
            .await
            .map_err(|e| store_failure("Failed to update post", e))?;
        if !updated {
            return Err(AccessError::not_found("Post", id));
        }
        info!("Updated post {}", id);
        Ok(post)
    }

    /// Deletes the post and its comments, returning the post as it was.
    pub async fn delete_post(&self, id: i64) -> Result<Post> {
        let post = self.require_post(id).await?;
        let deleted = self
            .storage
            .delete_post(id)
            .await
            .map_err(|e| store_failure("Failed to delete post", e))?;
        if !deleted {
            return Err(AccessError::not_found("Post", id));
        }
        info!("Deleted post {}", id);
        Ok(post)
    }

    // ---- Comments ----

    /// The author is checked before the post, so a payload with two dangling
    /// references always reports the missing account.
    pub async fn create_comment(&self, payload: CommentPayload) -> Result<Comment> {
        let comment = payload.validate()?;
        self.require_account(comment.author_id).await?;
        self.require_post(comment.post_id).await?;

        match self.storage.insert_comment(&comment, Utc::now()).await {
            Ok(created) => {
                info!("Created comment {} on post {}", created.id, created.post_id);
                Ok(created)
            }
            Err(StoreError::ForeignKeyViolation { detail }) => {
                // Re-run the checks to name whichever reference disappeared
                self.require_account(comment.author_id).await?;
                self.require_post(comment.post_id).await?;
                Err(store_failure(
                    "Failed to create comment",
                    StoreError::ForeignKeyViolation { detail },
                ))
            }
            Err(e) => Err(store_failure("Failed to create comment", e)),
        }
    }

    pub async fn list_comments(&self, include: CommentRelations) -> Result<Vec<CommentView>> {
        let comments = self
            .storage
            .list_comments()
            .await
            .map_err(|e| store_failure("Failed to list comments", e))?;

        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            views.push(self.comment_view(comment, include).await?);
        }
        Ok(views)
    }

    pub async fn comments_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        debug!("Fetching comments for post {}", post_id);
        self.storage
            .list_comments_by_post(post_id)
            .await
            .map_err(|e| store_failure("Failed to list comments by post", e))
    }

    pub async fn comments_by_author(&self, author_id: i64) -> Result<Vec<Comment>> {
        debug!("Fetching comments for account {}", author_id);
        self.storage
            .list_comments_by_author(author_id)
            .await
            .map_err(|e| store_failure("Failed to list comments by author", e))
    }

    pub async fn get_comment(&self, id: i64, include: CommentRelations) -> Result<CommentView> {
        let comment = self.require_comment(id).await?;
        self.comment_view(comment, include).await
    }

    pub async fn comment_view(&self, comment: Comment, include: CommentRelations) -> Result<CommentView> {
        let author = if include.author {
            Some(self.require_account(comment.author_id).await?)
        } else {
            None
        };
        let post = if include.post {
            Some(self.require_post(comment.post_id).await?)
        } else {
            None
        };
        Ok(CommentView {
            comment,
            author,
            post,
        })
    }

    pub async fn update_comment(&self, id: i64, changes: CommentChanges) -> Result<Comment> {
        let content = changes.validate()?;
        let mut comment = self.require_comment(id).await?;

        let updated = self
            .storage
            .update_comment(id, &content)
            .await
            .map_err(|e| store_failure("Failed to update comment", e))?;
        if !updated {
            return Err(AccessError::not_found("Comment", id));
        }
        comment.content = content;
        info!("Updated comment {}", id);
        Ok(comment)
    }

    pub async fn delete_comment(&self, id: i64) -> Result<Comment> {
        let comment = self.require_comment(id).await?;
        let deleted = self
            .storage
            .delete_comment(id)
            .await
            .map_err(|e| store_failure("Failed to delete comment", e))?;
        if !deleted {
            return Err(AccessError::not_found("Comment", id));
        }
        info!("Deleted comment {}", id);
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_at(created_at: DateTime<Utc>, updated_at: Option<DateTime<Utc>>) -> Post {
        Post {
            id: 1,
            title: "Hi".into(),
            content: "World".into(),
            owner_id: 1,
            created_at,
            updated_at,
        }
    }

    #[test]
    fn update_time_moves_forward_past_a_future_timestamp() {
        let future = Utc::now() + Duration::hours(1);
        let post = post_at(future, None);
        assert!(next_update_time(&post) > future);

        let post = post_at(Utc::now() - Duration::hours(2), Some(future));
        assert_eq!(next_update_time(&post), future + Duration::microseconds(1));
    }

    #[test]
    fn unique_violation_on_email_is_a_conflict() {
        let err = store_failure(
            "test",
            StoreError::UniqueViolation {
                constraint: "uq_accounts_email".into(),
            },
        );
        assert_eq!(
            err,
            AccessError::Conflict {
                message: "Email already exists".into()
            }
        );
    }

    #[test]
    fn other_store_failures_stay_opaque() {
        let err = store_failure("test", StoreError::database("connection reset"));
        assert!(matches!(err, AccessError::Store(_)));
        assert_eq!(err.to_string(), "internal storage error");
    }
}
