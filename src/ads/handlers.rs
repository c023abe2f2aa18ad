use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header::LOCATION, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{AdPage, AdView, MessageResponse},
    multipart::read_ad_form,
    query::ListAdsQuery,
    services,
};
use crate::{
    auth::{AuthUser, MaybeAuthUser},
    error::{AppError, AppResult},
    state::AppState,
};

/// Five full-size photos plus the text fields.
const MAX_FORM_BYTES: usize = 25 * 1024 * 1024;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/ads", get(list_ads))
        .route("/ads/:id", get(get_ad))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/ads", post(create_ad))
        .route("/ads/:id", axum::routing::put(update_ad).delete(delete_ad))
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
}

/// Ids that do not parse cannot name an existing ad.
fn ad_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Ad not found".into()))
}

#[instrument(skip(state))]
pub async fn list_ads(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Query(query): Query<ListAdsQuery>,
) -> AppResult<Json<AdPage>> {
    let (filter, page) = query.into_parts()?;
    let result = services::list_ads(&state, caller, &filter, page).await?;
    Ok(Json(result.into()))
}

#[instrument(skip(state))]
pub async fn get_ad(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<AdView>> {
    let ad = services::get_ad(&state, ad_id(&id)?).await?;
    Ok(Json(AdView::new(ad, caller)))
}

#[instrument(skip(state, mp))]
pub async fn create_ad(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Multipart,
) -> AppResult<(StatusCode, [(axum::http::HeaderName, String); 1], Json<AdView>)> {
    let form = read_ad_form(mp).await?;
    let ad = services::create_ad(&state, user_id, form).await?;
    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/ads/{}", ad.id))],
        Json(AdView::new(ad, Some(user_id))),
    ))
}

#[instrument(skip(state, mp))]
pub async fn update_ad(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    mp: Multipart,
) -> AppResult<Json<AdView>> {
    let id = ad_id(&id)?;
    let form = read_ad_form(mp).await?;
    let ad = services::update_ad(&state, id, user_id, form).await?;
    Ok(Json(AdView::new(ad, Some(user_id))))
}

#[instrument(skip(state))]
pub async fn delete_ad(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    services::delete_ad(&state, ad_id(&id)?, user_id).await?;
    Ok(Json(MessageResponse {
        message: "Ad deleted",
    }))
}
