use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    query::{AdFilter, PageRequest},
    repo_types::{Ad, NewAd},
};
use crate::error::AppResult;

const AD_COLUMNS: &str = "id, user_id, title, description, category, price, city, images, created_at";

/// Listing store.
#[async_trait]
pub trait AdRepo: Send + Sync {
    async fn insert(&self, ad: NewAd) -> AppResult<Ad>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Ad>>;
    /// One page, newest first, plus the number of ads matching `filter`.
    async fn list(&self, filter: &AdFilter, page: PageRequest) -> AppResult<(Vec<Ad>, i64)>;
    /// Writes the mutable columns of `ad`. `None` if the row is gone.
    async fn update(&self, ad: &Ad) -> AppResult<Option<Ad>>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

pub struct PgAdRepo {
    db: PgPool,
}

impl PgAdRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &AdFilter) {
    qb.push(" WHERE TRUE");
    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(city) = &filter.city {
        qb.push(" AND city = ").push_bind(city.clone());
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    if let Some(pattern) = filter.search_pattern() {
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl AdRepo for PgAdRepo {
    async fn insert(&self, ad: NewAd) -> AppResult<Ad> {
        let row = sqlx::query_as::<_, Ad>(&format!(
            r#"
            INSERT INTO ads (id, user_id, title, description, category, price, city, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {AD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(ad.user_id)
        .bind(&ad.title)
        .bind(&ad.description)
        .bind(&ad.category)
        .bind(ad.price)
        .bind(&ad.city)
        .bind(&ad.images)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Ad>> {
        let row = sqlx::query_as::<_, Ad>(&format!("SELECT {AD_COLUMNS} FROM ads WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn list(&self, filter: &AdFilter, page: PageRequest) -> AppResult<(Vec<Ad>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ads");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {AD_COLUMNS} FROM ads"));
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as::<Ad>().fetch_all(&self.db).await?;

        Ok((rows, total))
    }

    async fn update(&self, ad: &Ad) -> AppResult<Option<Ad>> {
        let row = sqlx::query_as::<_, Ad>(&format!(
            r#"
            UPDATE ads
               SET title = $2, description = $3, city = $4, price = $5, images = $6
             WHERE id = $1
            RETURNING {AD_COLUMNS}
            "#
        ))
        .bind(ad.id)
        .bind(&ad.title)
        .bind(&ad.description)
        .bind(&ad.city)
        .bind(ad.price)
        .bind(&ad.images)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM ads WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
