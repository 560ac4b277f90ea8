use crate::domain::Post as DomainPost;
use crate::graphql::schema::GraphQLContext;
use async_graphql::{Context, ErrorExtensions, FieldResult, Object};
use chrono::{DateTime, Utc};

/// GraphQL representation of a Post
#[derive(Clone)]
pub struct Post {
    pub inner: DomainPost,
}

impl From<DomainPost> for Post {
    fn from(post: DomainPost) -> Self {
        Self { inner: post }
    }
}

#[Object]
impl Post {
    /// The generated identifier of the post
    async fn id(&self) -> i64 {
        self.inner.id
    }

    async fn title(&self) -> &str {
        &self.inner.title
    }

    async fn content(&self) -> &str {
        &self.inner.content
    }

    /// Identifier of the owning account
    async fn owner_id(&self) -> i64 {
        self.inner.owner_id
    }

    /// When the post was created
    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// When the post was last edited, if ever
    async fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.inner.updated_at
    }

    /// The account that owns this post
    async fn owner(&self, ctx: &Context<'_>) -> FieldResult<super::account::Account> {
        let context = ctx.data::<GraphQLContext>()?;

        match context
            .service
            .get_account(self.inner.owner_id, Default::default())
            .await
        {
            Ok(view) => Ok(view.account.into()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Comments left on this post
    async fn comments(&self, ctx: &Context<'_>) -> FieldResult<Vec<super::comment::Comment>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.comments_by_post(self.inner.id).await {
            Ok(comments) => Ok(comments.into_iter().map(|c| c.into()).collect()),
            Err(e) => Err(e.extend()),
        }
    }
}
