use axum::{
    extract::{Path, Query, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::{AppError, Context};
use crate::app::App;
use crate::db::PostQuery;
use crate::feed::{build_feed, FEED_SIZE};
use crate::models::{PageMetadata, Post, PostPage};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    page: Option<i64>,
    limit: Option<i64>,
    tag: Option<String>,
}

pub async fn list_posts(
    State(app): State<App>,
    Query(params): Query<ListParams>,
) -> Result<Json<PostPage>, AppError> {
    let page = params.page.unwrap_or(DEFAULT_PAGE);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if page < 1 {
        return Err(AppError::BadRequest("page must be a positive number".to_string()));
    }
    if limit < 1 {
        return Err(AppError::BadRequest("limit must be a positive number".to_string()));
    }
    let limit = limit.min(MAX_LIMIT);
    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| AppError::BadRequest("page is out of range".to_string()))?;

    let query = PostQuery {
        tag: params.tag.filter(|t| !t.is_empty()),
        offset,
        limit,
    };
    let (posts, total) = app
        .db()
        .list_posts(&query)
        .await
        .or_internal("Failed to load posts")?;

    Ok(Json(PostPage {
        posts: posts.into_iter().map(Post::with_local_media_urls).collect(),
        metadata: PageMetadata::new(total, page, limit),
    }))
}

pub async fn get_post(
    State(app): State<App>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, AppError> {
    if slug.is_empty() {
        return Err(AppError::BadRequest("Post slug is missing".to_string()));
    }
    app.db()
        .view_post(&slug)
        .await
        .or_internal("Failed to load post")?
        .map(Json)
        .ok_or(AppError::NotFound("Post not found"))
}

pub async fn list_tags(State(app): State<App>) -> Result<Json<Value>, AppError> {
    let tags = app
        .db()
        .all_tags()
        .await
        .or_internal("Failed to load tags")?;
    Ok(Json(json!({ "tags": tags })))
}

pub async fn rss_feed(State(app): State<App>) -> Result<impl IntoResponse, AppError> {
    let query = PostQuery {
        tag: None,
        offset: 0,
        limit: FEED_SIZE,
    };
    let (posts, _) = app
        .db()
        .list_posts(&query)
        .await
        .or_internal("Failed to load posts")?;
    let channel = build_feed(
        &app.settings().http.public_base_url,
        app.settings().telegram.channel_name(),
        &posts,
    )
    .or_internal("Failed to build feed")?;

    Ok(([(CONTENT_TYPE, "application/rss+xml; charset=utf-8")], channel.to_string()))
}
