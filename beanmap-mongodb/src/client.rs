//! MongoDB client wrapper.

use std::sync::Arc;

use bson::Document;
use mongodb::{Client, Collection, Database};
use tracing::info;

use crate::config::MongoConfig;
use crate::error::{MongoError, MongoResult};

/// One driver client bound to its target database.
///
/// The driver pools connections internally; cloning is cheap.
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    database: Database,
    config: Arc<MongoConfig>,
}

impl MongoClient {
    /// Create a client from configuration.
    ///
    /// No connection is opened until the first operation.
    pub async fn new(config: MongoConfig) -> MongoResult<Self> {
        let options = config.to_client_options().await?;

        let client = Client::with_options(options)
            .map_err(|e| MongoError::connection(format!("failed to create client: {}", e)))?;

        let database = client.database(&config.database);

        info!(
            connection = %config.name,
            database = %config.database,
            "MongoDB client created"
        );

        Ok(Self {
            client,
            database,
            config: Arc::new(config),
        })
    }

    /// Get a raw document collection.
    pub fn collection_doc(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    /// Get the target database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Get the underlying driver client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the configuration.
    pub fn config(&self) -> &MongoConfig {
        &self.config
    }
}

impl std::fmt::Debug for MongoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoClient")
            .field("connection", &self.config.name)
            .field("database", &self.config.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanmap_schema::ConnectionDescriptor;

    #[tokio::test]
    async fn test_client_is_lazy() {
        let descriptor = ConnectionDescriptor::new("main", "mongodb://localhost:27017", "shop", true);
        let config = MongoConfig::from_descriptor(&descriptor).unwrap();

        let client = MongoClient::new(config).await.unwrap();
        assert_eq!(client.database().name(), "shop");
        assert_eq!(client.collection_doc("orders").name(), "orders");
        assert_eq!(client.config().name, "main");
    }
}
