//! Connection factory.
//!
//! [`MongoFactory`] turns connection descriptors and a discovered codec set
//! into one [`MongoDb`] handle per connection. All handles share the same
//! codec registry and collection-name cache.
//!
//! ```rust,ignore
//! let config = BeanmapConfig::from_file("beanmap.toml")?;
//! let factory = MongoFactory::from_config(&config).await?;
//! let orders = factory.db().collection::<Order>()?;
//! ```

use std::sync::Arc;

use beanmap_schema::{BeanmapConfig, ConnectionDescriptor, validate_connections};
use bson::Document;
use mongodb::{Collection, Database};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::client::MongoClient;
use crate::codec::{BeanCodec, CodecMode};
use crate::collection::BeanCollection;
use crate::collections::CollectionNames;
use crate::config::MongoConfig;
use crate::discovery::DiscoveryScanner;
use crate::error::{MongoError, MongoResult};
use crate::registry::{CodecRegistry, CodecSet};
use crate::schema::Bean;

static GLOBAL: OnceCell<MongoFactory> = OnceCell::const_new();

/// A database handle that maps beans through the shared codec registry.
#[derive(Debug, Clone)]
pub struct MongoDb {
    name: String,
    is_default: bool,
    client: MongoClient,
    registry: Arc<CodecRegistry>,
    names: Arc<CollectionNames>,
    mode: CodecMode,
}

impl MongoDb {
    /// Logical connection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the default database.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// The underlying client.
    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    /// The driver database.
    pub fn database(&self) -> &Database {
        self.client.database()
    }

    /// The shared codec registry.
    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    /// The shared collection-name cache.
    pub fn names(&self) -> &CollectionNames {
        &self.names
    }

    /// How field failures are reported.
    pub fn mode(&self) -> CodecMode {
        self.mode
    }

    /// The collection declared by `T`.
    ///
    /// Fails if no codec is registered for `T` or `T` declares no
    /// collection name.
    pub fn collection<T: Bean>(&self) -> MongoResult<BeanCollection<T>> {
        let codec = self.codec::<T>()?;
        let name = self.names.name_for::<T>()?;
        Ok(BeanCollection::new(self.client.collection_doc(name), codec))
    }

    /// A collection of `T` under an explicit name.
    pub fn collection_named<T: Bean>(&self, name: &str) -> MongoResult<BeanCollection<T>> {
        let codec = self.codec::<T>()?;
        Ok(BeanCollection::new(self.client.collection_doc(name), codec))
    }

    /// A raw document collection.
    pub fn collection_doc(&self, name: &str) -> Collection<Document> {
        self.client.collection_doc(name)
    }

    /// The registered codec for `T`, or a codec in this database's mode
    /// when the registry holds a foreign codec for `T`.
    fn codec<T: Bean>(&self) -> MongoResult<BeanCodec<T>> {
        match self.registry.codec::<T>() {
            Some(codec) => Ok(*codec),
            None if self.registry.contains::<T>() => Ok(BeanCodec::with_mode(self.mode)),
            None => Err(MongoError::codec_not_found(T::schema().type_path())),
        }
    }
}

/// Builds and owns the database handles.
#[derive(Debug)]
pub struct MongoFactory {
    databases: Vec<MongoDb>,
    default_index: usize,
    registry: Arc<CodecRegistry>,
}

impl MongoFactory {
    /// Create one database handle per connection.
    ///
    /// Every codec in `codecs` is switched to `mode`. The connection marked
    /// default becomes [`MongoFactory::db`]; without one, the first
    /// connection is the default.
    pub async fn connect(
        connections: &[ConnectionDescriptor],
        codecs: CodecSet,
        mode: CodecMode,
    ) -> MongoResult<Self> {
        let mut moded = CodecSet::new();
        moded.extend(codecs.into_iter().map(|codec| codec.in_mode(mode)));
        Self::connect_with_registry(connections, CodecRegistry::from_set(moded), mode).await
    }

    /// Like [`MongoFactory::connect`] with a prepared registry whose codecs
    /// are used as registered.
    pub async fn connect_with_registry(
        connections: &[ConnectionDescriptor],
        registry: CodecRegistry,
        mode: CodecMode,
    ) -> MongoResult<Self> {
        if connections.is_empty() {
            return Err(MongoError::config("no connections configured"));
        }
        validate_connections(connections)?;

        let registry = Arc::new(registry);
        let names = Arc::new(CollectionNames::new());
        let marked_default = connections.iter().position(|c| c.is_default);
        let default_index = marked_default.unwrap_or(0);
        if marked_default.is_none() {
            debug!(
                connection = %connections[0].name,
                "No default connection marked, using the first"
            );
        }

        let mut databases = Vec::with_capacity(connections.len());
        for (index, descriptor) in connections.iter().enumerate() {
            let client = MongoClient::new(MongoConfig::from_descriptor(descriptor)?).await?;
            databases.push(MongoDb {
                name: descriptor.name.clone(),
                is_default: index == default_index,
                client,
                registry: Arc::clone(&registry),
                names: Arc::clone(&names),
                mode,
            });
        }

        info!(
            connections = databases.len(),
            codecs = registry.len(),
            default = %databases[default_index].name,
            "MongoDB factory initialized"
        );

        Ok(Self {
            databases,
            default_index,
            registry,
        })
    }

    /// Discover codecs under `[scan]` and connect every `[[connections]]`
    /// entry.
    pub async fn from_config(config: &BeanmapConfig) -> MongoResult<Self> {
        Self::from_config_with(config, &DiscoveryScanner::linked()).await
    }

    /// Like [`MongoFactory::from_config`] with a custom scanner.
    pub async fn from_config_with(
        config: &BeanmapConfig,
        scanner: &DiscoveryScanner,
    ) -> MongoResult<Self> {
        config.validate()?;
        let codecs = scanner.scan(&config.scan.packages, config.scan.recursive);
        Self::connect(
            &config.connections,
            codecs,
            CodecMode::from_strict(config.codec.strict),
        )
        .await
    }

    /// Build the process-wide factory once.
    ///
    /// Concurrent callers wait for the same initialization; later calls
    /// return the existing factory and ignore `config`. A failed
    /// initialization can be retried.
    pub async fn init_global(config: BeanmapConfig) -> MongoResult<&'static MongoFactory> {
        GLOBAL
            .get_or_try_init(|| async move { Self::from_config(&config).await })
            .await
    }

    /// The process-wide factory, if initialized.
    pub fn global() -> Option<&'static MongoFactory> {
        GLOBAL.get()
    }

    /// The default database.
    pub fn db(&self) -> &MongoDb {
        &self.databases[self.default_index]
    }

    /// A database by logical connection name.
    pub fn db_named(&self, name: &str) -> MongoResult<&MongoDb> {
        self.databases
            .iter()
            .find(|db| db.name == name)
            .ok_or_else(|| MongoError::UnknownDatabase(name.to_string()))
    }

    /// Every database, in configuration order.
    pub fn databases(&self) -> &[MongoDb] {
        &self.databases
    }

    /// The shared codec registry.
    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }
}
