use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::{
    dto::{Profile, UpdateProfileRequest},
    services,
};
use crate::{auth::AuthUser, error::AppResult, state::AppState};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/users/profile", get(get_profile).put(update_profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Profile>> {
    Ok(Json(services::get_profile(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<Profile>> {
    Ok(Json(services::update_profile(&state, user_id, payload).await?))
}
