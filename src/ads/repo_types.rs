use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Ad record in the database. `user_id` and `created_at` never change after insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ad {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub city: String,
    pub images: Vec<String>, // storage paths, display order
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAd {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub city: String,
    pub images: Vec<String>,
}
