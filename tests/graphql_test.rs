mod common;

use async_graphql::Request;
use axum::body::Body;
use axum::http::Request as HttpRequest;
use blog_service::config::ServerConfig;
use blog_service::graphql::create_schema;
use blog_service::server::create_server;
use blog_service::service::ContentService;
use blog_service::storage::{InMemoryStorage, Storage};
use common::{account, comment, post, CountingStorage};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn run(service: &ContentService, query: &str) -> async_graphql::Response {
    create_schema(service.clone()).execute(Request::new(query)).await
}

async fn data(service: &ContentService, query: &str) -> Value {
    let response = run(service, query).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    response.data.into_json().unwrap()
}

#[tokio::test]
async fn mutations_round_trip_through_the_access_layer() {
    let service = common::memory_service();

    let created = data(
        &service,
        r#"mutation {
            createAccount(input: { name: "Ana", email: "ana@x.com" }) { id name email }
        }"#,
    )
    .await;
    assert_eq!(created["createAccount"], json!({"id": 1, "name": "Ana", "email": "ana@x.com"}));

    data(
        &service,
        r#"mutation { createPost(input: { title: "Hi", content: "World", ownerId: 1 }) { id } }"#,
    )
    .await;
    data(
        &service,
        r#"mutation { createComment(input: { content: "Nice", authorId: 1, postId: 1 }) { id } }"#,
    )
    .await;

    let updated = data(
        &service,
        r#"mutation { updatePost(id: 1, input: { title: "Hello" }) { title content updatedAt } }"#,
    )
    .await;
    assert_eq!(updated["updatePost"]["title"], "Hello");
    assert_eq!(updated["updatePost"]["content"], "World");
    assert!(updated["updatePost"]["updatedAt"].is_string());

    let edited = data(
        &service,
        r#"mutation { updateComment(id: 1, content: "Great") { content author { name } } }"#,
    )
    .await;
    assert_eq!(edited["updateComment"], json!({"content": "Great", "author": {"name": "Ana"}}));

    data(&service, "mutation { deleteComment(id: 1) { id } }").await;
    let deleted = data(&service, "mutation { deletePost(id: 1) { id title } }").await;
    assert_eq!(deleted["deletePost"], json!({"id": 1, "title": "Hello"}));

    data(&service, "mutation { deleteAccount(id: 1) { id } }").await;
    assert_eq!(data(&service, "{ accounts { id } }").await, json!({"accounts": []}));
}

#[tokio::test]
async fn access_errors_carry_codes() {
    let service = common::memory_service();
    service.create_account(account("Ana", "ana@x.com")).await.unwrap();

    let response = run(
        &service,
        r#"mutation { createAccount(input: { name: "Ana", email: "ana@x.com" }) { id } }"#,
    )
    .await;
    let error = serde_json::to_value(&response.errors[0]).unwrap();
    assert_eq!(error["message"], "Email already exists");
    assert_eq!(error["extensions"]["code"], "CONFLICT");

    let response = run(&service, "{ post(id: 5) { title } }").await;
    let error = serde_json::to_value(&response.errors[0]).unwrap();
    assert_eq!(error["message"], "Post not found");
    assert_eq!(error["extensions"]["code"], "NOT_FOUND");

    let response = run(
        &service,
        r#"mutation { createPost(input: { content: "World", ownerId: 1 }) { id } }"#,
    )
    .await;
    let error = serde_json::to_value(&response.errors[0]).unwrap();
    assert_eq!(error["extensions"]["code"], "VALIDATION_ERROR");
    assert_eq!(error["extensions"]["field"], "title");
}

// Nested relations are resolved lazily: one store fetch per parent node.
#[tokio::test]
async fn nested_comments_are_fetched_once_per_post() {
    let counting = Arc::new(CountingStorage::new(Arc::new(InMemoryStorage::new())));
    let storage: Arc<dyn Storage> = counting.clone();
    let service = ContentService::new(storage);

    let ana = service.create_account(account("Ana", "ana@x.com")).await.unwrap();
    for i in 0..3 {
        let p = service.create_post(post(&format!("Post {i}"), "body", ana.id)).await.unwrap();
        service.create_comment(comment("c", ana.id, p.id)).await.unwrap();
    }

    counting.reset();
    let result = data(&service, "{ posts { title } }").await;
    assert_eq!(result["posts"].as_array().unwrap().len(), 3);
    assert_eq!(counting.comment_fetches(), 0);
    assert_eq!(counting.account_fetches(), 0);

    counting.reset();
    let result = data(&service, "{ posts { title comments { content } owner { name } } }").await;
    assert_eq!(result["posts"].as_array().unwrap().len(), 3);
    assert_eq!(counting.comment_fetches(), 3);
    assert_eq!(counting.account_fetches(), 3);
}

#[tokio::test]
async fn graph_and_rest_agree_on_a_post() {
    let (service, _dir) = common::database_service().await;
    let ana = service.create_account(account("Ana", "ana@x.com")).await.unwrap();
    let hi = service.create_post(post("Hi", "World", ana.id)).await.unwrap();
    service.create_comment(comment("Nice", ana.id, hi.id)).await.unwrap();
    service.create_comment(comment("Indeed", ana.id, hi.id)).await.unwrap();

    let graph = data(&service, "{ post(id: 1) { title comments { content } } }").await;

    let app = create_server(service, &ServerConfig::default());
    let fetch = |uri: &'static str| {
        let app = app.clone();
        async move {
            let request = HttpRequest::builder().uri(uri).body(Body::empty()).unwrap();
            let response = app.oneshot(request).await.unwrap();
            let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
            serde_json::from_slice::<Value>(&bytes).unwrap()
        }
    };
    let rest_post = fetch("/posts/1?include=").await;
    let rest_comments = fetch("/comments?postId=1&include=").await;

    assert_eq!(graph["post"]["title"], rest_post["title"]);
    let graph_contents: Vec<&Value> = graph["post"]["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| &c["content"])
        .collect();
    let rest_contents: Vec<&Value> = rest_comments
        .as_array()
        .unwrap()
        .iter()
        .map(|c| &c["content"])
        .collect();
    assert_eq!(graph_contents, rest_contents);
}

#[tokio::test]
async fn graphql_endpoint_serves_post_requests() {
    let service = common::memory_service();
    service.create_account(account("Ana", "ana@x.com")).await.unwrap();
    let app = create_server(service, &ServerConfig::default());

    let request = HttpRequest::builder()
        .method("POST")
        .uri("/graphql")
        .header("content-type", "application/json")
        .body(Body::from(json!({"query": "{ account(id: 1) { email } }"}).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["data"]["account"]["email"], "ana@x.com");
}
