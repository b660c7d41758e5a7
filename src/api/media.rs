use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Redirect, Response},
};

use super::error::{AppError, Context};
use crate::app::App;

fn inline(mime_type: &str, file_name: &str, data: Vec<u8>) -> Response {
    (
        [
            (CONTENT_TYPE, mime_type.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", file_name.replace('"', "")),
            ),
        ],
        data,
    )
        .into_response()
}

/// Serves stored attachment bytes, or redirects to the player of an external one.
pub async fn get_media(
    State(app): State<App>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let db = app.db();
    let wants_thumbnail = params.contains_key("thumbnail");

    if let Some(file) = db.media_file(&id).await.or_internal("Failed to load media")? {
        if wants_thumbnail {
            if let Some(thumbnail) = file.thumbnail {
                let name = format!("thumbnail_{}", file.file_name);
                return Ok(inline(&file.mime_type, &name, thumbnail));
            }
        }
        return match db
            .blob_data(file.blob_id)
            .await
            .or_internal("Failed to load media")?
        {
            Some(data) => Ok(inline(&file.mime_type, &file.file_name, data)),
            None => {
                log::error!("blob {} of media {} is missing", file.blob_id, file.file_id);
                Err(AppError::NotFound("Media file not found in storage"))
            }
        };
    }

    match db
        .find_post_media(&id)
        .await
        .or_internal("Failed to load media")?
    {
        Some(media) if media.is_external && !media.url.is_empty() => {
            Ok(Redirect::temporary(&media.url).into_response())
        }
        _ => Err(AppError::NotFound("Media not found")),
    }
}
