use std::sync::Arc;

use crate::{
    ads::repo::{AdRepo, PgAdRepo},
    auth::jwt::JwtKeys,
    config::AppConfig,
    db,
    storage::{self, StorageClient},
    users::repo::{PgUserRepo, UserRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub ads: Arc<dyn AdRepo>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let pool = db::connect(&config).await?;
        db::migrate(&pool).await?;

        let storage = storage::from_config(&config.storage).await?;

        Ok(Self {
            jwt: JwtKeys::from_config(&config.jwt),
            users: Arc::new(PgUserRepo::new(pool.clone())),
            ads: Arc::new(PgAdRepo::new(pool)),
            storage,
            config,
        })
    }

    /// In-memory stores and storage, for tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with_storage(Arc::new(crate::storage::memory::MemoryStorage::default()))
    }

    #[cfg(test)]
    pub fn fake_with_storage(storage: Arc<dyn StorageClient>) -> Self {
        use crate::{ads::memory::MemoryAdRepo, users::memory::MemoryUserRepo};

        let config = Arc::new(
            AppConfig::from_lookup(|key| match key {
                "JWT_SECRET" => Some("test-secret".into()),
                "JWT_ISSUER" => Some("test-issuer".into()),
                "JWT_AUDIENCE" => Some("test-aud".into()),
                _ => None,
            })
            .expect("test config"),
        );

        Self {
            jwt: JwtKeys::from_config(&config.jwt),
            users: Arc::new(MemoryUserRepo::default()),
            ads: Arc::new(MemoryAdRepo::default()),
            storage,
            config,
        }
    }
}
