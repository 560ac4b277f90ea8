use super::traits::Storage;
use crate::domain::*;
use crate::error::{StoreError, StoreResult};
use crate::relations::{self, EntityKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<i64, Account>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    // Ids are never reused, matching AUTOINCREMENT
    sequences: HashMap<EntityKind, i64>,
}

impl Tables {
    fn next_id(&mut self, kind: EntityKind) -> i64 {
        let seq = self.sequences.entry(kind).or_insert(0);
        *seq += 1;
        *seq
    }

    fn contains(&self, kind: EntityKind, id: i64) -> bool {
        match kind {
            EntityKind::Account => self.accounts.contains_key(&id),
            EntityKind::Post => self.posts.contains_key(&id),
            EntityKind::Comment => self.comments.contains_key(&id),
        }
    }

    fn ids(&self, kind: EntityKind) -> Vec<i64> {
        match kind {
            EntityKind::Account => self.accounts.keys().copied().collect(),
            EntityKind::Post => self.posts.keys().copied().collect(),
            EntityKind::Comment => self.comments.keys().copied().collect(),
        }
    }

    /// Value of the foreign key column `column` on row `id` of `kind`.
    fn reference(&self, kind: EntityKind, id: i64, column: &str) -> Option<i64> {
        match (kind, column) {
            (EntityKind::Post, "owner_id") => self.posts.get(&id).map(|p| p.owner_id),
            (EntityKind::Comment, "author_id") => self.comments.get(&id).map(|c| c.author_id),
            (EntityKind::Comment, "post_id") => self.comments.get(&id).map(|c| c.post_id),
            _ => None,
        }
    }

    fn remove(&mut self, kind: EntityKind, id: i64) -> bool {
        match kind {
            EntityKind::Account => self.accounts.remove(&id).is_some(),
            EntityKind::Post => self.posts.remove(&id).is_some(),
            EntityKind::Comment => self.comments.remove(&id).is_some(),
        }
    }

    /// Checks every foreign key the registry declares for `child` against the
    /// supplied column values, the way the store checks them on insert.
    fn check_references(&self, child: EntityKind, values: &[(&str, i64)]) -> StoreResult<()> {
        for fk in relations::foreign_keys_of(child) {
            let value = values
                .iter()
                .find(|(column, _)| *column == fk.foreign_key)
                .map(|(_, value)| *value);
            match value {
                Some(id) if self.contains(fk.target, id) => {}
                _ => {
                    return Err(StoreError::ForeignKeyViolation {
                        detail: fk.constraint.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    /// Deletes a row and, following the cascade policy table, every row that
    /// depends on it.
    fn delete_cascading(&mut self, kind: EntityKind, id: i64) -> bool {
        if !self.contains(kind, id) {
            return false;
        }
        for rel in relations::cascade_targets(kind) {
            let child = rel.child();
            let dependents: Vec<i64> = self
                .ids(child)
                .into_iter()
                .filter(|row| self.reference(child, *row, rel.foreign_key) == Some(id))
                .collect();
            for dependent in dependents {
                self.delete_cascading(child, dependent);
            }
        }
        self.remove(kind, id)
    }
}

/// In-memory storage for development and tests. It has no native cascade, so
/// deletes walk the relationship registry instead.
#[derive(Default)]
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::database("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn insert_account(&self, account: &NewAccount) -> StoreResult<Account> {
        let mut tables = self.tables()?;
        if tables.accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::UniqueViolation {
                constraint: "uq_accounts_email".to_string(),
            });
        }
        let id = tables.next_id(EntityKind::Account);
        let row = Account {
            id,
            name: account.name.clone(),
            email: account.email.clone(),
        };
        tables.accounts.insert(id, row.clone());
        debug!("Inserted account {} into memory", id);
        Ok(row)
    }

    async fn get_account(&self, id: i64) -> StoreResult<Option<Account>> {
        Ok(self.tables()?.accounts.get(&id).cloned())
    }

    async fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        Ok(self.tables()?.accounts.values().cloned().collect())
    }

    async fn delete_account(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables()?.delete_cascading(EntityKind::Account, id))
    }

    async fn insert_post(&self, post: &NewPost, created_at: DateTime<Utc>) -> StoreResult<Post> {
        let mut tables = self.tables()?;
        tables.check_references(EntityKind::Post, &[("owner_id", post.owner_id)])?;
        let id = tables.next_id(EntityKind::Post);
        let row = Post {
            id,
            title: post.title.clone(),
            content: post.content.clone(),
            owner_id: post.owner_id,
            created_at,
            updated_at: None,
        };
        tables.posts.insert(id, row.clone());
        debug!("Inserted post {} into memory", id);
        Ok(row)
    }

    async fn get_post(&self, id: i64) -> StoreResult<Option<Post>> {
        Ok(self.tables()?.posts.get(&id).cloned())
    }

    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        Ok(self.tables()?.posts.values().cloned().collect())
    }

    async fn list_posts_by_owner(&self, owner_id: i64) -> StoreResult<Vec<Post>> {
        Ok(self
            .tables()?
            .posts
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update_post(&self, post: &Post) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        match tables.posts.get_mut(&post.id) {
            Some(existing) => {
                existing.title = post.title.clone();
                existing.content = post.content.clone();
                existing.updated_at = post.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_post(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables()?.delete_cascading(EntityKind::Post, id))
    }

    async fn insert_comment(
        &self,
        comment: &NewComment,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Comment> {
        let mut tables = self.tables()?;
        tables.check_references(
            EntityKind::Comment,
            &[("author_id", comment.author_id), ("post_id", comment.post_id)],
        )?;
        let id = tables.next_id(EntityKind::Comment);
        let row = Comment {
            id,
            content: comment.content.clone(),
            author_id: comment.author_id,
            post_id: comment.post_id,
            created_at,
        };
        tables.comments.insert(id, row.clone());
        debug!("Inserted comment {} into memory", id);
        Ok(row)
    }

    async fn get_comment(&self, id: i64) -> StoreResult<Option<Comment>> {
        Ok(self.tables()?.comments.get(&id).cloned())
    }

    async fn list_comments(&self) -> StoreResult<Vec<Comment>> {
        Ok(self.tables()?.comments.values().cloned().collect())
    }

    async fn list_comments_by_post(&self, post_id: i64) -> StoreResult<Vec<Comment>> {
        Ok(self
            .tables()?
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn list_comments_by_author(&self, author_id: i64) -> StoreResult<Vec<Comment>> {
        Ok(self
            .tables()?
            .comments
            .values()
            .filter(|c| c.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn update_comment(&self, id: i64, content: &str) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        match tables.comments.get_mut(&id) {
            Some(existing) => {
                existing.content = content.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_comment(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables()?.delete_cascading(EntityKind::Comment, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str, email: &str) -> NewAccount {
        NewAccount {
            name: name.to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let store = InMemoryStorage::new();
        store.insert_account(&account("Ana", "ana@x.com")).await.unwrap();

        let err = store
            .insert_account(&account("Other", "ana@x.com"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::UniqueViolation {
                constraint: "uq_accounts_email".into()
            }
        );
        assert_eq!(store.list_accounts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insert_rejects_dangling_references() {
        let store = InMemoryStorage::new();
        let post = NewPost {
            title: "Hi".into(),
            content: "World".into(),
            owner_id: 9,
        };
        let err = store.insert_post(&post, Utc::now()).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation { .. }));
        assert!(store.list_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_an_account_cascades_through_posts_to_comments() {
        let store = InMemoryStorage::new();
        let ana = store.insert_account(&account("Ana", "ana@x.com")).await.unwrap();
        let bob = store.insert_account(&account("Bob", "bob@x.com")).await.unwrap();
        let post = store
            .insert_post(
                &NewPost {
                    title: "Hi".into(),
                    content: "World".into(),
                    owner_id: ana.id,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        // Bob's comment on Ana's post goes with the post
        let comment = store
            .insert_comment(
                &NewComment {
                    content: "Nice".into(),
                    author_id: bob.id,
                    post_id: post.id,
                },
                Utc::now(),
            )
            .await
            .unwrap();

        assert!(store.delete_account(ana.id).await.unwrap());
        assert!(store.get_post(post.id).await.unwrap().is_none());
        assert!(store.get_comment(comment.id).await.unwrap().is_none());
        assert!(store.get_account(bob.id).await.unwrap().is_some());
        assert!(!store.delete_account(ana.id).await.unwrap());
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = InMemoryStorage::new();
        let first = store.insert_account(&account("Ana", "ana@x.com")).await.unwrap();
        store.delete_account(first.id).await.unwrap();
        let second = store.insert_account(&account("Ana", "ana@x.com")).await.unwrap();
        assert_eq!(second.id, first.id + 1);
    }
}
