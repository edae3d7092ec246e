use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{SeaOrmTrackerService, TrackerService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub tracker_service: Arc<dyn TrackerService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    /// Wires services around an already connected store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let tracker_service = Arc::new(SeaOrmTrackerService::new(store.clone()))
            as Arc<dyn TrackerService>;

        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            tracker_service,
        }
    }
}
