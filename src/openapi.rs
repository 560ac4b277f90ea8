//! OpenAPI 3 document for the REST surface, generated from the same endpoint
//! table the router is checked against.

use crate::constants::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_TITLE_LENGTH};
use crate::rest::{Endpoint, ENDPOINTS};
use serde_json::{json, Map, Value};

fn schema_ref(name: &str) -> Value {
    match name.strip_suffix("List") {
        Some(item) => json!({
            "type": "array",
            "items": { "$ref": format!("#/components/schemas/{item}") }
        }),
        None => json!({ "$ref": format!("#/components/schemas/{name}") }),
    }
}

fn status_description(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Missing or invalid field",
        404 => "Not found",
        409 => "Duplicate unique field",
        _ => "Database error",
    }
}

fn operation(endpoint: &Endpoint) -> Value {
    let mut parameters = Vec::new();
    if endpoint.path.contains("{id}") {
        parameters.push(json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        }));
    }
    for name in endpoint.query {
        let schema = if *name == "include" {
            json!({ "type": "string" })
        } else {
            json!({ "type": "integer", "format": "int64" })
        };
        parameters.push(json!({ "name": name, "in": "query", "required": false, "schema": schema }));
    }

    let mut responses = Map::new();
    let success = match endpoint.response {
        Some(name) => json!({
            "description": status_description(endpoint.success),
            "content": { "application/json": { "schema": schema_ref(name) } }
        }),
        None => json!({ "description": status_description(endpoint.success) }),
    };
    responses.insert(endpoint.success.to_string(), success);
    for status in endpoint.failures {
        responses.insert(
            status.to_string(),
            json!({
                "description": status_description(*status),
                "content": { "application/json": { "schema": schema_ref("Error") } }
            }),
        );
    }

    let mut op = json!({
        "summary": endpoint.summary,
        "tags": [endpoint.path.split('/').nth(1).unwrap_or_default()],
        "parameters": parameters,
        "responses": responses,
    });
    if let Some(request) = endpoint.request {
        op["requestBody"] = json!({
            "required": true,
            "content": { "application/json": { "schema": schema_ref(request) } }
        });
    }
    op
}

fn schemas() -> Value {
    let id = json!({ "type": "integer", "format": "int64" });
    let timestamp = json!({ "type": "string", "format": "date-time" });
    json!({
        "Account": {
            "type": "object",
            "required": ["id", "name", "email"],
            "properties": {
                "id": id,
                "name": { "type": "string", "maxLength": MAX_NAME_LENGTH },
                "email": { "type": "string", "format": "email", "maxLength": MAX_EMAIL_LENGTH }
            }
        },
        "Post": {
            "type": "object",
            "required": ["id", "title", "content", "ownerId", "createdAt"],
            "properties": {
                "id": id,
                "title": { "type": "string", "maxLength": MAX_TITLE_LENGTH },
                "content": { "type": "string" },
                "ownerId": id,
                "createdAt": timestamp,
                "updatedAt": { "type": "string", "format": "date-time", "nullable": true }
            }
        },
        "Comment": {
            "type": "object",
            "required": ["id", "content", "authorId", "postId", "createdAt"],
            "properties": {
                "id": id,
                "content": { "type": "string" },
                "authorId": id,
                "postId": id,
                "createdAt": timestamp
            }
        },
        "AccountPayload": {
            "type": "object",
            "required": ["name", "email"],
            "properties": {
                "name": { "type": "string", "maxLength": MAX_NAME_LENGTH },
                "email": { "type": "string", "maxLength": MAX_EMAIL_LENGTH }
            }
        },
        "PostPayload": {
            "type": "object",
            "required": ["title", "content", "ownerId"],
            "properties": {
                "title": { "type": "string", "maxLength": MAX_TITLE_LENGTH },
                "content": { "type": "string" },
                "ownerId": id
            }
        },
        "PostChanges": {
            "type": "object",
            "properties": {
                "title": { "type": "string", "maxLength": MAX_TITLE_LENGTH },
                "content": { "type": "string" }
            }
        },
        "CommentPayload": {
            "type": "object",
            "required": ["content", "authorId", "postId"],
            "properties": {
                "content": { "type": "string" },
                "authorId": id,
                "postId": id
            }
        },
        "CommentChanges": {
            "type": "object",
            "required": ["content"],
            "properties": { "content": { "type": "string" } }
        },
        "Error": {
            "type": "object",
            "required": ["error"],
            "properties": { "error": { "type": "string" } }
        }
    })
}

/// Build the complete OpenAPI document.
pub fn document() -> Value {
    let mut paths = Map::new();
    for endpoint in ENDPOINTS {
        let item = paths
            .entry(endpoint.path.to_string())
            .or_insert_with(|| json!({}));
        item[endpoint.method] = operation(endpoint);
    }

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Blog API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Accounts, posts and comments"
        },
        "paths": paths,
        "components": { "schemas": schemas() }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_endpoint_is_documented() {
        let doc = document();
        for endpoint in ENDPOINTS {
            assert!(
                doc["paths"][endpoint.path][endpoint.method].is_object(),
                "{} {} missing",
                endpoint.method,
                endpoint.path
            );
        }
    }

    #[test]
    fn referenced_schemas_exist() {
        let doc = document();
        let text = doc.to_string();
        for name in ["Account", "Post", "Comment", "PostPayload", "Error"] {
            assert!(doc["components"]["schemas"][name].is_object());
            assert!(text.contains(&format!("#/components/schemas/{name}")));
        }
        assert_eq!(doc["paths"]["/accounts"]["post"]["responses"]["409"]["description"], "Duplicate unique field");
    }
}
