use std::sync::Arc;

use mongodb::{Client, Database};

use crate::{
    config::{Config, StoreBackend},
    services::{
        mongo_store::MongoQuizStore,
        store::{MemoryQuizStore, QuizStore},
    },
};

pub async fn init_db(uri: &str, database: &str) -> Result<Database, mongodb::error::Error> {
    let client = Client::with_uri_str(uri).await?;
    Ok(client.database(database))
}

/// Builds the store selected by `STORE_BACKEND`.
pub async fn init_store(config: &Config) -> anyhow::Result<Arc<dyn QuizStore>> {
    match (config.store_backend, config.mongodb_uri.as_deref()) {
        (StoreBackend::Mongo, Some(uri)) => {
            let db = init_db(uri, &config.mongodb_database).await?;
            tracing::info!(database = %config.mongodb_database, "using MongoDB store");
            Ok(Arc::new(MongoQuizStore::new(Arc::new(db))))
        }
        (StoreBackend::Mongo, None) => anyhow::bail!("MONGODB_URI must be set"),
        (StoreBackend::Memory, _) => {
            tracing::warn!("using in-memory store, nothing survives a restart");
            Ok(Arc::new(MemoryQuizStore::new()))
        }
    }
}
