use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::get,
    Router,
};
use tower_http::services::ServeDir;
use tracing::instrument;

use crate::{config::StorageConfig, error::AppResult, state::AppState};

/// Static route for stored images. Local uploads are served straight from
/// disk; S3 objects are reached through a short-lived presigned redirect.
pub fn uploads_routes(cfg: &StorageConfig) -> Router<AppState> {
    match cfg {
        StorageConfig::Local { upload_dir } => {
            Router::new().nest_service("/uploads", ServeDir::new(upload_dir))
        }
        StorageConfig::S3 { .. } => Router::new().route("/uploads/*key", get(redirect_to_object)),
    }
}

#[instrument(skip(state))]
pub async fn redirect_to_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Redirect> {
    let url = state.storage.public_url(&key).await?;
    Ok(Redirect::temporary(&url))
}
