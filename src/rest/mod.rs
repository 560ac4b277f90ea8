//! Resource surface: one collection and one item route per entity.

pub mod error;
pub mod handlers;

pub use error::ApiError;

use crate::service::ContentService;
use axum::{routing::get, Router};

/// One REST operation, as described in the published API document.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub method: &'static str,
    /// Path in OpenAPI template form, e.g. `/posts/{id}`
    pub path: &'static str,
    pub summary: &'static str,
    /// Schema name of the request body, if any
    pub request: Option<&'static str>,
    /// Schema name of the success body; `None` for 204 responses
    pub response: Option<&'static str>,
    pub success: u16,
    /// Error statuses the operation may answer with
    pub failures: &'static [u16],
    /// Query parameters accepted
    pub query: &'static [&'static str],
}

const fn endpoint(
    method: &'static str,
    path: &'static str,
    summary: &'static str,
    request: Option<&'static str>,
    response: Option<&'static str>,
    success: u16,
    failures: &'static [u16],
    query: &'static [&'static str],
) -> Endpoint {
    Endpoint {
        method,
        path,
        summary,
        request,
        response,
        success,
        failures,
        query,
    }
}

pub static ENDPOINTS: &[Endpoint] = &[
    endpoint("get", "/accounts", "List accounts", None, Some("AccountList"), 200, &[400, 500], &["include"]),
    endpoint("post", "/accounts", "Create an account", Some("AccountPayload"), Some("Account"), 201, &[400, 409, 500], &[]),
    endpoint("get", "/accounts/{id}", "Get an account", None, Some("Account"), 200, &[400, 404, 500], &["include"]),
    endpoint("delete", "/accounts/{id}", "Delete an account with its posts and comments", None, None, 204, &[404, 500], &[]),
    endpoint("get", "/posts", "List posts", None, Some("PostList"), 200, &[400, 500], &["ownerId", "include"]),
    endpoint("post", "/posts", "Create a post", Some("PostPayload"), Some("Post"), 201, &[400, 404, 500], &[]),
    endpoint("get", "/posts/{id}", "Get a post", None, Some("Post"), 200, &[400, 404, 500], &["include"]),
    endpoint("put", "/posts/{id}", "Update a post", Some("PostChanges"), Some("Post"), 200, &[400, 404, 500], &[]),
    endpoint("delete", "/posts/{id}", "Delete a post with its comments", None, None, 204, &[404, 500], &[]),
    endpoint("get", "/comments", "List comments", None, Some("CommentList"), 200, &[400, 500], &["postId", "authorId", "include"]),
    endpoint("post", "/comments", "Create a comment", Some("CommentPayload"), Some("Comment"), 201, &[400, 404, 500], &[]),
    endpoint("get", "/comments/{id}", "Get a comment", None, Some("Comment"), 200, &[400, 404, 500], &["include"]),
    endpoint("put", "/comments/{id}", "Update a comment", Some("CommentChanges"), Some("Comment"), 200, &[400, 404, 500], &[]),
    endpoint("delete", "/comments/{id}", "Delete a comment", None, None, 204, &[404, 500], &[]),
];

pub fn routes(service: ContentService) -> Router {
    Router::new()
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route(
            "/accounts/:id",
            get(handlers::get_account).delete(handlers::delete_account),
        )
        .route(
            "/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route(
            "/posts/:id",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route(
            "/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route(
            "/comments/:id",
            get(handlers::get_comment)
                .put(handlers::update_comment)
                .delete(handlers::delete_comment),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    // Every documented operation must be routed; an empty store answers 404
    // for items but never 405.
    #[tokio::test]
    async fn every_documented_endpoint_is_routed() {
        let app = routes(ContentService::new(Arc::new(InMemoryStorage::new())));

        for endpoint in ENDPOINTS {
            let method = Method::from_bytes(endpoint.method.to_uppercase().as_bytes()).unwrap();
            let uri = endpoint.path.replace("{id}", "1");
            let request = Request::builder()
                .method(method)
                .uri(&uri)
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap();

            let response = app.clone().oneshot(request).await.unwrap();
            assert_ne!(
                response.status(),
                StatusCode::METHOD_NOT_ALLOWED,
                "{} {}",
                endpoint.method,
                uri
            );
        }
    }
}
