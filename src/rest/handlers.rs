use super::error::ApiError;
use crate::domain::*;
use crate::service::ContentService;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

type ApiResult<T> = Result<T, ApiError>;

/// `?include=a,b`. Absent means every relation, empty means none.
#[derive(Debug, Default, Deserialize)]
pub struct IncludeQuery {
    pub include: Option<String>,
}

impl IncludeQuery {
    fn relations<I: Include>(&self) -> ApiResult<I> {
        match &self.include {
            None => Ok(I::all()),
            Some(list) => Ok(I::parse(list)?),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    pub owner_id: Option<i64>,
    pub include: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentFilter {
    pub post_id: Option<i64>,
    pub author_id: Option<i64>,
    pub include: Option<String>,
}

fn id_of(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    Ok(path?.0)
}

fn query_of<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    Ok(query?.0)
}

fn body_of<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    Ok(body?.0)
}

// ---- Accounts ----

pub async fn list_accounts(
    State(service): State<ContentService>,
    query: Result<Query<IncludeQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<AccountView>>> {
    let include = query_of(query)?.relations()?;
    Ok(Json(service.list_accounts(include).await?))
}

pub async fn get_account(
    State(service): State<ContentService>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<IncludeQuery>, QueryRejection>,
) -> ApiResult<Json<AccountView>> {
    let id = id_of(path)?;
    let include = query_of(query)?.relations()?;
    Ok(Json(service.get_account(id, include).await?))
}

pub async fn create_account(
    State(service): State<ContentService>,
    body: Result<Json<AccountPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let account = service.create_account(body_of(body)?).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn delete_account(
    State(service): State<ContentService>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    service.delete_account(id_of(path)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Posts ----

pub async fn list_posts(
    State(service): State<ContentService>,
    query: Result<Query<PostFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<PostView>>> {
    let filter = query_of(query)?;
    let include: PostRelations = IncludeQuery {
        include: filter.include,
    }
    .relations()?;

    let views = match filter.owner_id {
        Some(owner_id) => {
            let mut views = Vec::new();
            for post in service.posts_by_owner(owner_id).await? {
                views.push(service.post_view(post, include).await?);
            }
            views
        }
        None => service.list_posts(include).await?,
    };
    Ok(Json(views))
}

pub async fn get_post(
    State(service): State<ContentService>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<IncludeQuery>, QueryRejection>,
) -> ApiResult<Json<PostView>> {
    let id = id_of(path)?;
    let include = query_of(query)?.relations()?;
    Ok(Json(service.get_post(id, include).await?))
}

pub async fn create_post(
    State(service): State<ContentService>,
    body: Result<Json<PostPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let post = service.create_post(body_of(body)?).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(service): State<ContentService>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<PostChanges>, JsonRejection>,
) -> ApiResult<Json<Post>> {
    let id = id_of(path)?;
    Ok(Json(service.update_post(id, body_of(body)?).await?))
}

pub async fn delete_post(
    State(service): State<ContentService>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    service.delete_post(id_of(path)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Comments ----

pub async fn list_comments(
    State(service): State<ContentService>,
    query: Result<Query<CommentFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<CommentView>>> {
    let filter = query_of(query)?;
    let include: CommentRelations = IncludeQuery {
        include: filter.include,
    }
    .relations()?;

    let comments = match (filter.post_id, filter.author_id) {
        (None, None) => return Ok(Json(service.list_comments(include).await?)),
        (Some(post_id), author_id) => service
            .comments_by_post(post_id)
            .await?
            .into_iter()
            .filter(|c| author_id.map_or(true, |a| c.author_id == a))
            .collect::<Vec<_>>(),
        (None, Some(author_id)) => service.comments_by_author(author_id).await?,
    };

    let mut views = Vec::with_capacity(comments.len());
    for comment in comments {
        views.push(service.comment_view(comment, include).await?);
    }
    Ok(Json(views))
}

pub async fn get_comment(
    State(service): State<ContentService>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<IncludeQuery>, QueryRejection>,
) -> ApiResult<Json<CommentView>> {
    let id = id_of(path)?;
    let include = query_of(query)?.relations()?;
    Ok(Json(service.get_comment(id, include).await?))
}

pub async fn create_comment(
    State(service): State<ContentService>,
    body: Result<Json<CommentPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = service.create_comment(body_of(body)?).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(service): State<ContentService>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<CommentChanges>, JsonRejection>,
) -> ApiResult<Json<Comment>> {
    let id = id_of(path)?;
    Ok(Json(service.update_comment(id, body_of(body)?).await?))
}

pub async fn delete_comment(
    State(service): State<ContentService>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    service.delete_comment(id_of(path)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
