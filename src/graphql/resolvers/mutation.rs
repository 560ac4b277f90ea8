use crate::domain::{AccountPayload, CommentChanges, CommentPayload, PostChanges, PostPayload};
use crate::graphql::schema::GraphQLContext;
use crate::graphql::types::{Account, Comment, Post};
use async_graphql::{Context, ErrorExtensions, FieldResult, InputObject, Object};

/// Input for creating an account. Fields are optional so that an omitted
/// field surfaces as a validation error with a field name.
#[derive(InputObject)]
pub struct CreateAccountInput {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl From<CreateAccountInput> for AccountPayload {
    fn from(input: CreateAccountInput) -> Self {
        Self {
            name: input.name,
            email: input.email,
        }
    }
}

#[derive(InputObject)]
pub struct CreatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub owner_id: Option<i64>,
}

impl From<CreatePostInput> for PostPayload {
    fn from(input: CreatePostInput) -> Self {
        Self {
            title: input.title,
            content: input.content,
            owner_id: input.owner_id,
        }
    }
}

#[derive(InputObject)]
pub struct CreateCommentInput {
    pub content: Option<String>,
    pub author_id: Option<i64>,
    pub post_id: Option<i64>,
}

impl From<CreateCommentInput> for CommentPayload {
    fn from(input: CreateCommentInput) -> Self {
        Self {
            content: input.content,
            author_id: input.author_id,
            post_id: input.post_id,
        }
    }
}

/// Partial post update; omitted fields keep their stored value
#[derive(InputObject)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl From<UpdatePostInput> for PostChanges {
    fn from(input: UpdatePostInput) -> Self {
        Self {
            title: input.title,
            content: input.content,
        }
    }
}

/// Root mutation object for GraphQL
pub struct Mutation;

#[Object]
impl Mutation {
    /// Create an account. Fails with CONFLICT when the email is taken.
    async fn create_account(
        &self,
        ctx: &Context<'_>,
        input: CreateAccountInput,
    ) -> FieldResult<Account> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.create_account(input.into()).await {
            Ok(account) => Ok(account.into()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Delete an account together with its posts and comments
    async fn delete_account(&self, ctx: &Context<'_>, id: i64) -> FieldResult<Account> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.delete_account(id).await {
            Ok(account) => Ok(account.into()),
            Err(e) => Err(e.extend()),
        }
    }

    async fn create_post(&self, ctx: &Context<'_>, input: CreatePostInput) -> FieldResult<Post> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.create_post(input.into()).await {
            Ok(post) => Ok(post.into()),
            Err(e) => Err(e.extend()),
        }
    }

    async fn update_post(
        &self,
        ctx: &Context<'_>,
        id: i64,
        input: UpdatePostInput,
    ) -> FieldResult<Post> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.update_post(id, input.into()).await {
            Ok(post) => Ok(post.into()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Delete a post and its comments, returning the post as it was
    async fn delete_post(&self, ctx: &Context<'_>, id: i64) -> FieldResult<Post> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.delete_post(id).await {
            Ok(post) => Ok(post.into()),
            Err(e) => Err(e.extend()),
        }
    }

    async fn create_comment(
        &self,
        ctx: &Context<'_>,
        input: CreateCommentInput,
    ) -> FieldResult<Comment> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.create_comment(input.into()).await {
            Ok(comment) => Ok(comment.into()),
            Err(e) => Err(e.extend()),
        }
    }

    async fn update_comment(
        &self,
        ctx: &Context<'_>,
        id: i64,
        content: Option<String>,
    ) -> FieldResult<Comment> {
        let context = ctx.data::<GraphQLContext>()?;
        let changes = CommentChanges { content };

        match context.service.update_comment(id, changes).await {
            Ok(comment) => Ok(comment.into()),
            Err(e) => Err(e.extend()),
        }
    }

    async fn delete_comment(&self, ctx: &Context<'_>, id: i64) -> FieldResult<Comment> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.delete_comment(id).await {
            Ok(comment) => Ok(comment.into()),
            Err(e) => Err(e.extend()),
        }
    }
}
