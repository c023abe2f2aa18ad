use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{query::PageResult, repo_types::Ad, services::is_owner};
use crate::images::UploadItem;

/// Ad as returned to clients, annotated with the caller's ownership.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub city: String,
    pub images: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_owner: bool,
}

impl AdView {
    pub fn new(ad: Ad, caller: Option<Uuid>) -> Self {
        Self {
            is_owner: caller.is_some_and(|c| is_owner(ad.user_id, c)),
            id: ad.id,
            user_id: ad.user_id,
            title: ad.title,
            description: ad.description,
            category: ad.category,
            price: ad.price,
            city: ad.city,
            images: ad.images,
            created_at: ad.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdPage {
    pub ads: Vec<AdView>,
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
}

impl From<PageResult<AdView>> for AdPage {
    fn from(p: PageResult<AdView>) -> Self {
        Self {
            ads: p.items,
            page: p.page,
            total_pages: p.total_pages,
            total: p.total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Multipart body of `POST /ads` and `PUT /ads/:id`, before validation.
/// Text fields stay raw; `existing_images` is `None` when the field was not sent.
#[derive(Debug, Default)]
pub struct AdForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub city: Option<String>,
    pub existing_images: Option<Vec<String>>,
    pub images: Vec<UploadItem>,
}
