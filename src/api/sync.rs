use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::AppError;
use crate::app::App;

const DEFAULT_SYNC_LIMIT: i32 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncParams {
    api_key: Option<String>,
    limit: Option<i32>,
}

/// On-demand channel sync guarded by the static api key.
pub async fn sync_telegram(
    State(app): State<App>,
    Query(params): Query<SyncParams>,
) -> Result<Json<Value>, AppError> {
    let expected = &app.settings().sync.api_key;
    match params.api_key {
        Some(key) if !expected.is_empty() && key == *expected => {}
        _ => return Err(AppError::Unauthorized),
    }
    let limit = params.limit.unwrap_or(DEFAULT_SYNC_LIMIT);
    if limit < 1 {
        return Err(AppError::BadRequest("limit must be a positive number".to_string()));
    }

    let report = app.sync(limit).await.map_err(|err| {
        AppError::Internal("Telegram synchronization failed", err.into())
    })?;

    Ok(Json(json!({
        "success": true,
        "message": "Synchronization finished",
        "result": report,
    })))
}
