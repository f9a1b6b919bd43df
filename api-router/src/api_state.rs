use std::sync::Arc;

use agent::CoachAgent;
use common::{
    storage::{db::SurrealDbClient, store::StorageManager},
    utils::config::AppConfig,
};

#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub config: AppConfig,
    pub storage: StorageManager,
    pub agent: Arc<CoachAgent>,
}

impl ApiState {
    pub async fn new(
        config: &AppConfig,
        storage: StorageManager,
        agent: Arc<CoachAgent>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(
            SurrealDbClient::new(
                &config.surrealdb_address,
                &config.surrealdb_username,
                &config.surrealdb_password,
                &config.surrealdb_namespace,
                &config.surrealdb_database,
            )
            .await?,
        );

        db.ensure_initialized().await?;

        Ok(Self {
            db,
            config: config.clone(),
            storage,
            agent,
        })
    }
}
