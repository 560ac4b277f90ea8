use crate::domain::Comment as DomainComment;
use crate::graphql::schema::GraphQLContext;
use async_graphql::{Context, ErrorExtensions, FieldResult, Object};
use chrono::{DateTime, Utc};

/// GraphQL representation of a Comment
#[derive(Clone)]
pub struct Comment {
    pub inner: DomainComment,
}

impl From<DomainComment> for Comment {
    fn from(comment: DomainComment) -> Self {
        Self { inner: comment }
    }
}

#[Object]
impl Comment {
    /// The generated identifier of the comment
    async fn id(&self) -> i64 {
        self.inner.id
    }

    async fn content(&self) -> &str {
        &self.inner.content
    }

    async fn author_id(&self) -> i64 {
        self.inner.author_id
    }

    async fn post_id(&self) -> i64 {
        self.inner.post_id
    }

    /// When the comment was created
    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// The account that wrote this comment
    async fn author(&self, ctx: &Context<'_>) -> FieldResult<super::account::Account> {
        let context = ctx.data::<GraphQLContext>()?;

        match context
            .service
            .get_account(self.inner.author_id, Default::default())
            .await
        {
            Ok(view) => Ok(view.account.into()),
            Err(e) => Err(e.extend()),
        }
    }

    /// The post this comment belongs to
    async fn post(&self, ctx: &Context<'_>) -> FieldResult<super::post::Post> {
        let context = ctx.data::<GraphQLContext>()?;

        match context
            .service
            .get_post(self.inner.post_id, Default::default())
            .await
        {
            Ok(view) => Ok(view.post.into()),
            Err(e) => Err(e.extend()),
        }
    }
}
