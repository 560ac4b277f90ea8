use crate::graphql::schema::GraphQLContext;
use crate::graphql::types::{Account, Comment, Post};
use async_graphql::{Context, ErrorExtensions, FieldResult, Object};

/// Root query object for GraphQL
pub struct Query;

// Nested relations are left to the object types, which fetch them lazily
// only when the document selects them.
#[Object]
impl Query {
    /// Get an account by ID
    async fn account(&self, ctx: &Context<'_>, id: i64) -> FieldResult<Account> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.get_account(id, Default::default()).await {
            Ok(view) => Ok(view.account.into()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Get all accounts
    async fn accounts(&self, ctx: &Context<'_>) -> FieldResult<Vec<Account>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.list_accounts(Default::default()).await {
            Ok(views) => Ok(views.into_iter().map(|v| v.account.into()).collect()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Get a post by ID
    async fn post(&self, ctx: &Context<'_>, id: i64) -> FieldResult<Post> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.get_post(id, Default::default()).await {
            Ok(view) => Ok(view.post.into()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Get all posts, optionally only those owned by one account
    async fn posts(&self, ctx: &Context<'_>, owner_id: Option<i64>) -> FieldResult<Vec<Post>> {
        let context = ctx.data::<GraphQLContext>()?;

        let posts = match owner_id {
            Some(owner_id) => context.service.posts_by_owner(owner_id).await,
            None => context
                .service
                .list_posts(Default::default())
                .await
                .map(|views| views.into_iter().map(|v| v.post).collect()),
        };
        match posts {
            Ok(posts) => Ok(posts.into_iter().map(|p| p.into()).collect()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Get a comment by ID
    async fn comment(&self, ctx: &Context<'_>, id: i64) -> FieldResult<Comment> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.get_comment(id, Default::default()).await {
            Ok(view) => Ok(view.comment.into()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Get all comments
    async fn comments(&self, ctx: &Context<'_>) -> FieldResult<Vec<Comment>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.list_comments(Default::default()).await {
            Ok(views) => Ok(views.into_iter().map(|v| v.comment.into()).collect()),
            Err(e) => Err(e.extend()),
        }
    }
}
