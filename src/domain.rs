use crate::constants::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_TITLE_LENGTH};
use crate::error::{AccessError, Result};
use crate::relations::{self, EntityKind};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("email pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

// Validated inputs handed to the store.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub owner_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub content: String,
    pub author_id: i64,
    pub post_id: i64,
}

/// Client-supplied account fields. Every field is optional so that a missing
/// field is reported as a validation error rather than a decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPayload {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(alias = "userId")]
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    pub content: Option<String>,
    #[serde(alias = "userId")]
    pub author_id: Option<i64>,
    pub post_id: Option<i64>,
}

/// Partial update of a post; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentChanges {
    pub content: Option<String>,
}

fn required_text(field: &str, value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AccessError::validation(field, format!("{field} is required"))),
    }
}

fn bounded_text(field: &str, value: Option<String>, max: usize) -> Result<String> {
    let value = required_text(field, value)?;
    if value.chars().count() > max {
        return Err(AccessError::validation(
            field,
            format!("{field} must be at most {max} characters"),
        ));
    }
    Ok(value)
}

fn required_id(field: &str, value: Option<i64>) -> Result<i64> {
    match value {
        Some(id) if id > 0 => Ok(id),
        Some(_) => Err(AccessError::validation(
            field,
            format!("{field} must be a positive integer"),
        )),
        None => Err(AccessError::validation(field, format!("{field} is required"))),
    }
}

impl AccountPayload {
    pub fn validate(self) -> Result<NewAccount> {
        let name = bounded_text("name", self.name, MAX_NAME_LENGTH)?;
        let email = bounded_text("email", self.email, MAX_EMAIL_LENGTH)?;
        if !EMAIL_PATTERN.is_match(&email) {
            return Err(AccessError::validation("email", "email is malformed"));
        }
        Ok(NewAccount { name, email })
    }
}

impl PostPayload {
    pub fn validate(self) -> Result<NewPost> {
        Ok(NewPost {
            title: bounded_text("title", self.title, MAX_TITLE_LENGTH)?,
            content: required_text("content", self.content)?,
            owner_id: required_id("ownerId", self.owner_id)?,
        })
    }
}

impl CommentPayload {
    pub fn validate(self) -> Result<NewComment> {
        Ok(NewComment {
            content: required_text("content", self.content)?,
            author_id: required_id("authorId", self.author_id)?,
            post_id: required_id("postId", self.post_id)?,
        })
    }
}

impl PostChanges {
    pub fn validate(self) -> Result<PostChanges> {
        if self.title.is_none() && self.content.is_none() {
            return Err(AccessError::validation(
                "title",
                "at least one of title or content is required",
            ));
        }
        Ok(PostChanges {
            title: self
                .title
                .map(|t| bounded_text("title", Some(t), MAX_TITLE_LENGTH))
                .transpose()?,
            content: self
                .content
                .map(|c| required_text("content", Some(c)))
                .transpose()?,
        })
    }
}

impl CommentChanges {
    pub fn validate(self) -> Result<String> {
        required_text("content", self.content)
    }
}

/// Per-call selection of relations to load alongside an entity.
pub trait Include: Sized + Copy + Default {
    const KIND: EntityKind;

    /// Every relation the registry declares for this entity.
    fn all() -> Self;

    fn enable(&mut self, relation: &str);

    /// Parses a comma separated list of relation names, rejecting names the
    /// registry does not declare for this entity.
    fn parse(list: &str) -> Result<Self> {
        let mut include = Self::default();
        for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if relations::relation(Self::KIND, name).is_none() {
                return Err(AccessError::validation(
                    "include",
                    format!("unknown relation '{name}' for {}", Self::KIND),
                ));
            }
            include.enable(name);
        }
        Ok(include)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountRelations {
    pub posts: bool,
    pub comments: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostRelations {
    pub owner: bool,
    pub comments: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentRelations {
    pub author: bool,
    pub post: bool,
}

impl Include for AccountRelations {
    const KIND: EntityKind = EntityKind::Account;

    fn all() -> Self {
        Self { posts: true, comments: true }
    }

    fn enable(&mut self, relation: &str) {
        match relation {
            "posts" => self.posts = true,
            "comments" => self.comments = true,
            _ => {}
        }
    }
}

impl Include for PostRelations {
    const KIND: EntityKind = EntityKind::Post;

    fn all() -> Self {
        Self { owner: true, comments: true }
    }

    fn enable(&mut self, relation: &str) {
        match relation {
            "owner" => self.owner = true,
            "comments" => self.comments = true,
            _ => {}
        }
    }
}

impl Include for CommentRelations {
    const KIND: EntityKind = EntityKind::Comment;

    fn all() -> Self {
        Self { author: true, post: true }
    }

    fn enable(&mut self, relation: &str) {
        match relation {
            "author" => self.author = true,
            "post" => self.post = true,
            _ => {}
        }
    }
}

// Entities together with whichever relations were requested. Relations that were
// not requested are omitted from the serialized form.

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    #[serde(flatten)]
    pub account: Account,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<Post>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Account>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Account>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Post>,
}
