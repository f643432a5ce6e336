//! Frame listing and frame file handlers.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use dogwatch_models::{display_time, parse_frame_time};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// One frame listing entry.
#[derive(Serialize)]
pub struct FrameEntry {
    pub name: String,
    pub time: String,
}

/// List retained frames, newest first.
///
/// Without an explicit limit the page covers the whole retention bound.
pub async fn list_frames(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<FrameEntry>>> {
    let limit = query
        .limit
        .unwrap_or_else(|| state.frames.capacity())
        .min(state.config.max_frame_page);

    let records = state.frames.list(limit).await?;

    Ok(Json(
        records
            .into_iter()
            .map(|record| FrameEntry {
                time: display_time(record.captured_at),
                name: record.name,
            })
            .collect(),
    ))
}

/// Serve one frame's JPEG bytes.
///
/// The name must follow the frame naming convention, which doubles as the
/// traversal guard: anything else is rejected before touching the
/// filesystem.
pub async fn get_frame(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if parse_frame_time(&name).is_none() {
        return Err(ApiError::bad_request("not a frame file name"));
    }

    let path = state.frames.dir().join(&name);
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::not_found(name.clone())
        } else {
            ApiError::internal(e.to_string())
        }
    })?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}
