use crate::domain::Account as DomainAccount;
use crate::graphql::schema::GraphQLContext;
use async_graphql::{Context, ErrorExtensions, FieldResult, Object};

/// GraphQL representation of an Account
#[derive(Clone)]
pub struct Account {
    pub inner: DomainAccount,
}

impl From<DomainAccount> for Account {
    fn from(account: DomainAccount) -> Self {
        Self { inner: account }
    }
}

#[Object]
impl Account {
    /// The generated identifier of the account
    async fn id(&self) -> i64 {
        self.inner.id
    }

    /// Display name
    async fn name(&self) -> &str {
        &self.inner.name
    }

    /// Unique email address
    async fn email(&self) -> &str {
        &self.inner.email
    }

    /// Posts owned by this account
    async fn posts(&self, ctx: &Context<'_>) -> FieldResult<Vec<super::post::Post>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.posts_by_owner(self.inner.id).await {
            Ok(posts) => Ok(posts.into_iter().map(|p| p.into()).collect()),
            Err(e) => Err(e.extend()),
        }
    }

    /// Comments written by this account
    async fn comments(&self, ctx: &Context<'_>) -> FieldResult<Vec<super::comment::Comment>> {
        let context = ctx.data::<GraphQLContext>()?;

        match context.service.comments_by_author(self.inner.id).await {
            Ok(comments) => Ok(comments.into_iter().map(|c| c.into()).collect()),
            Err(e) => Err(e.extend()),
        }
    }
}
