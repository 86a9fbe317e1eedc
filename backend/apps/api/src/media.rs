//! Stored object download (`/api/media/{*key}`)

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppResult;
use platform::storage::{ObjectStorage, ObjectStore};
use std::sync::Arc;

/// Keys are random, so an object never changes once written
const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

pub async fn serve_media(
    State(storage): State<Arc<ObjectStorage>>,
    Path(key): Path<String>,
) -> AppResult<Response> {
    let object = storage.get(&key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, object.content_type),
            (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        object.bytes,
    )
        .into_response())
}
