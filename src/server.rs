use crate::config::ServerConfig;
use crate::graphql::{create_schema, GraphQLSchema};
use crate::openapi;
use crate::rest;
use crate::service::ContentService;
use anyhow::Context as _;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    http::{header, HeaderValue, Method},
    response::{Html, IntoResponse, Json},
    routing::get,
    Extension, Router,
};
use hyper::Server;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "blog-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GraphQL handler (supports GET and POST)
async fn graphql_handler(
    Extension(schema): Extension<GraphQLSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

/// GraphiQL UI
async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

async fn openapi_document() -> impl IntoResponse {
    Json(openapi::document())
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match config.allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!(
                "Ignoring unparseable allowed origin '{}'; cross-origin requests will be refused",
                config.allowed_origin
            );
            cors
        }
    }
}

/// Create the HTTP router with the REST resources and the GraphQL endpoint
pub fn create_server(service: ContentService, config: &ServerConfig) -> Router {
    let schema = create_schema(service.clone());

    Router::new()
        .route("/health", get(health))
        .route("/graphql", get(graphql_handler).post(graphql_handler))
        .route("/graphiql", get(graphiql))
        .route("/api-docs/openapi.json", get(openapi_document))
        .layer(Extension(schema))
        .merge(rest::routes(service))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config)),
        )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}

/// Serve until Ctrl-C, then finish in-flight requests before returning
pub async fn start_server(service: ContentService, config: &ServerConfig) -> anyhow::Result<()> {
    let app = create_server(service, config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    info!("HTTP server running on http://{addr}");
    info!("Health check: http://{addr}/health");
    info!("GraphQL:      http://{addr}/graphql");
    info!("GraphiQL UI:  http://{addr}/graphiql");

    Server::try_bind(&addr)
        .with_context(|| format!("Failed to bind {addr}"))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}
