use crate::graphql::resolvers::{Mutation, Query};
use crate::service::ContentService;
use async_graphql::{EmptySubscription, Schema};

/// GraphQL context containing shared application state
pub struct GraphQLContext {
    pub service: ContentService,
}

/// The complete GraphQL schema
pub type GraphQLSchema = Schema<Query, Mutation, EmptySubscription>;

/// Create a new GraphQL schema backed by the given access layer
pub fn create_schema(service: ContentService) -> GraphQLSchema {
    Schema::build(Query, Mutation, EmptySubscription)
        .data(GraphQLContext { service })
        .finish()
}
