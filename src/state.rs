use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    auth::{
        jwt::JwtKeys,
        password::PasswordHasher,
        repo::{PgUserRepo, UserRepo},
    },
    config::AppConfig,
    storage::{LocalStorage, StorageClient},
    tasks::repo::{PgTaskRepo, TaskRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: Arc<JwtKeys>,
    pub hasher: PasswordHasher,
    pub users: Arc<dyn UserRepo>,
    pub tasks: Arc<dyn TaskRepo>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub fn new(config: AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let storage = Arc::new(LocalStorage::new(&config.storage.upload_dir)) as Arc<dyn StorageClient>;
        Self::from_parts(
            config,
            Arc::new(PgUserRepo::new(db.clone())),
            Arc::new(PgTaskRepo::new(db)),
            storage,
        )
    }

    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserRepo>,
        tasks: Arc<dyn TaskRepo>,
        storage: Arc<dyn StorageClient>,
    ) -> anyhow::Result<Self> {
        let jwt = JwtKeys::new(&config.jwt);
        anyhow::ensure!(jwt.is_configured(), "token signing secret is not configured");
        let hasher = PasswordHasher::new(&config.hashing)?;

        Ok(Self {
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            hasher,
            users,
            tasks,
            storage,
        })
    }
}
