#![allow(dead_code)]

use async_trait::async_trait;
use blog_service::domain::*;
use blog_service::error::StoreResult;
use blog_service::service::ContentService;
use blog_service::storage::{DatabaseStorage, InMemoryStorage, Storage};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// A service over a fresh SQLite file. Keep the directory alive for the test.
pub async fn database_service() -> (ContentService, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blog.db");
    let storage = DatabaseStorage::open(path.to_str().unwrap()).await.unwrap();
    (ContentService::new(Arc::new(storage)), dir)
}

pub fn memory_service() -> ContentService {
    ContentService::new(Arc::new(InMemoryStorage::new()))
}

pub fn account(name: &str, email: &str) -> AccountPayload {
    AccountPayload {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
    }
}

pub fn post(title: &str, content: &str, owner_id: i64) -> PostPayload {
    PostPayload {
        title: Some(title.to_string()),
        content: Some(content.to_string()),
        owner_id: Some(owner_id),
    }
}

pub fn comment(content: &str, author_id: i64, post_id: i64) -> CommentPayload {
    CommentPayload {
        content: Some(content.to_string()),
        author_id: Some(author_id),
        post_id: Some(post_id),
    }
}

/// Wraps a store and counts the relation fetches issued through it.
pub struct CountingStorage {
    inner: Arc<dyn Storage>,
    pub comment_fetches: AtomicUsize,
    pub account_fetches: AtomicUsize,
}

impl CountingStorage {
    pub fn new(inner: Arc<dyn Storage>) -> Self {
        Self {
            inner,
            comment_fetches: AtomicUsize::new(0),
            account_fetches: AtomicUsize::new(0),
        }
    }

    pub fn comment_fetches(&self) -> usize {
        self.comment_fetches.load(Ordering::SeqCst)
    }

    pub fn account_fetches(&self) -> usize {
        self.account_fetches.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.comment_fetches.store(0, Ordering::SeqCst);
        self.account_fetches.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for CountingStorage {
    async fn insert_account(&self, account: &NewAccount) -> StoreResult<Account> {
        self.inner.insert_account(account).await
    }

    async fn get_account(&self, id: i64) -> StoreResult<Option<Account>> {
        self.account_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.get_account(id).await
    }

    async fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        self.inner.list_accounts().await
    }

    async fn delete_account(&self, id: i64) -> StoreResult<bool> {
        self.inner.delete_account(id).await
    }

    async fn insert_post(&self, post: &NewPost, created_at: DateTime<Utc>) -> StoreResult<Post> {
        self.inner.insert_post(post, created_at).await
    }

    async fn get_post(&self, id: i64) -> StoreResult<Option<Post>> {
        self.inner.get_post(id).await
    }

    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        self.inner.list_posts().await
    }

    async fn list_posts_by_owner(&self, owner_id: i64) -> StoreResult<Vec<Post>> {
        self.inner.list_posts_by_owner(owner_id).await
    }

    async fn update_post(&self, post: &Post) -> StoreResult<bool> {
        self.inner.update_post(post).await
    }

    async fn delete_post(&self, id: i64) -> StoreResult<bool> {
        self.inner.delete_post(id).await
    }

    async fn insert_comment(
        &self,
        comment: &NewComment,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Comment> {
        self.inner.insert_comment(comment, created_at).await
    }

    async fn get_comment(&self, id: i64) -> StoreResult<Option<Comment>> {
        self.inner.get_comment(id).await
    }

    async fn list_comments(&self) -> StoreResult<Vec<Comment>> {
        self.inner.list_comments().await
    }

    async fn list_comments_by_post(&self, post_id: i64) -> StoreResult<Vec<Comment>> {
        self.comment_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.list_comments_by_post(post_id).await
    }

    async fn list_comments_by_author(&self, author_id: i64) -> StoreResult<Vec<Comment>> {
        self.comment_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.list_comments_by_author(author_id).await
    }

    async fn update_comment(&self, id: i64, content: &str) -> StoreResult<bool> {
        self.inner.update_comment(id, content).await
    }

    async fn delete_comment(&self, id: i64) -> StoreResult<bool> {
        self.inner.delete_comment(id).await
    }
}
