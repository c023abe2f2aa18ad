//! In-memory listing store for tests. Mirrors the ordering and filter
//! semantics of the Postgres queries.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    query::{AdFilter, PageRequest},
    repo::AdRepo,
    repo_types::{Ad, NewAd},
};
use crate::error::AppResult;

#[derive(Default)]
pub struct MemoryAdRepo {
    ads: RwLock<HashMap<Uuid, Ad>>,
}

#[async_trait]
impl AdRepo for MemoryAdRepo {
    async fn insert(&self, ad: NewAd) -> AppResult<Ad> {
        let created = Ad {
            id: Uuid::new_v4(),
            user_id: ad.user_id,
            title: ad.title,
            description: ad.description,
            category: ad.category,
            price: ad.price,
            city: ad.city,
            images: ad.images,
            created_at: OffsetDateTime::now_utc(),
        };
        self.ads.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Ad>> {
        Ok(self.ads.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &AdFilter, page: PageRequest) -> AppResult<(Vec<Ad>, i64)> {
        let ads = self.ads.read().await;
        let mut hits: Vec<&Ad> = ads.values().filter(|ad| filter.matches(ad)).collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = hits.len() as i64;
        let items = hits
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn update(&self, ad: &Ad) -> AppResult<Option<Ad>> {
        let mut ads = self.ads.write().await;
        let Some(stored) = ads.get_mut(&ad.id) else {
            return Ok(None);
        };
        stored.title = ad.title.clone();
        stored.description = ad.description.clone();
        stored.city = ad.city.clone();
        stored.price = ad.price;
        stored.images = ad.images.clone();
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.ads.write().await.remove(&id).is_some())
    }
}
