use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::PgStore;
use crate::storage::{Storage, StorageClient};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init(config: AppConfig, store: PgStore) -> anyhow::Result<Self> {
        let storage = Storage::from_config(&config).await?;
        Ok(Self::from_parts(
            Arc::new(store),
            Arc::new(config),
            Arc::new(storage),
        ))
    }

    pub fn from_parts(
        store: Arc<dyn Store>,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        Self {
            store,
            config,
            storage,
        }
    }
}
