//! Driver settings for one connection.

use std::time::Duration;

use beanmap_schema::{ConnectionDescriptor, parse_duration};
use mongodb::options::ClientOptions;

use crate::error::{MongoError, MongoResult};

const DEFAULT_URI: &str = "mongodb://localhost:27017";
const DEFAULT_APP_NAME: &str = "beanmap";

/// Driver settings for one connection.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Logical connection name.
    pub name: String,
    /// MongoDB connection URI.
    pub uri: String,
    /// Database name.
    pub database: String,
    /// Application name (shown in server logs).
    pub app_name: Option<String>,
    /// Minimum connection pool size.
    pub min_pool_size: Option<u32>,
    /// Maximum connection pool size.
    pub max_pool_size: Option<u32>,
    /// Maximum idle time for pooled connections.
    pub max_idle_time: Option<Duration>,
    /// Connection timeout.
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout.
    pub server_selection_timeout: Option<Duration>,
    /// Retry writes.
    pub retry_writes: Option<bool>,
    /// Retry reads.
    pub retry_reads: Option<bool>,
    /// Direct connection (bypass replica set discovery).
    pub direct_connection: Option<bool>,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            uri: DEFAULT_URI.to_string(),
            database: String::new(),
            app_name: Some(DEFAULT_APP_NAME.to_string()),
            min_pool_size: None,
            max_pool_size: Some(10),
            max_idle_time: Some(Duration::from_secs(300)),
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            retry_writes: Some(true),
            retry_reads: Some(true),
            direct_connection: None,
        }
    }
}

impl MongoConfig {
    /// Create a configuration from a URI and database name.
    pub fn from_uri(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    /// Create a configuration from a `[[connections]]` entry.
    ///
    /// Options the entry leaves unset keep their defaults.
    pub fn from_descriptor(descriptor: &ConnectionDescriptor) -> MongoResult<Self> {
        let defaults = Self::from_uri(&descriptor.uri, &descriptor.database);
        let duration = |value: &Option<String>, default: Option<Duration>| {
            value.as_deref().map(parse_duration).transpose().map(|parsed| parsed.or(default))
        };

        Ok(Self {
            name: descriptor.name.clone(),
            app_name: descriptor.app_name.clone().or(defaults.app_name.clone()),
            min_pool_size: descriptor.min_pool_size.or(defaults.min_pool_size),
            max_pool_size: descriptor.max_pool_size.or(defaults.max_pool_size),
            max_idle_time: duration(&descriptor.max_idle_time, defaults.max_idle_time)?,
            connect_timeout: duration(&descriptor.connect_timeout, defaults.connect_timeout)?,
            server_selection_timeout: duration(
                &descriptor.server_selection_timeout,
                defaults.server_selection_timeout,
            )?,
            retry_writes: descriptor.retry_writes.or(defaults.retry_writes),
            retry_reads: descriptor.retry_reads.or(defaults.retry_reads),
            direct_connection: descriptor.direct_connection.or(defaults.direct_connection),
            ..defaults
        })
    }

    /// Convert to driver client options.
    ///
    /// Parsing a `mongodb+srv` URI resolves DNS records; plain URIs are
    /// parsed offline.
    pub async fn to_client_options(&self) -> MongoResult<ClientOptions> {
        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| MongoError::config(format!("failed to parse URI: {}", e)))?;

        if let Some(ref app_name) = self.app_name {
            options.app_name = Some(app_name.clone());
        }
        if let Some(min_pool) = self.min_pool_size {
            options.min_pool_size = Some(min_pool);
        }
        if let Some(max_pool) = self.max_pool_size {
            options.max_pool_size = Some(max_pool);
        }
        if let Some(max_idle) = self.max_idle_time {
            options.max_idle_time = Some(max_idle);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            options.connect_timeout = Some(connect_timeout);
        }
        if let Some(selection_timeout) = self.server_selection_timeout {
            options.server_selection_timeout = Some(selection_timeout);
        }
        if let Some(retry_writes) = self.retry_writes {
            options.retry_writes = Some(retry_writes);
        }
        if let Some(retry_reads) = self.retry_reads {
            options.retry_reads = Some(retry_reads);
        }
        if let Some(direct) = self.direct_connection {
            options.direct_connection = Some(direct);
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_uri() {
        let config = MongoConfig::from_uri("mongodb://localhost:27017", "shop");
        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.database, "shop");
        assert_eq!(config.app_name.as_deref(), Some("beanmap"));
    }

    #[test]
    fn test_config_from_descriptor() {
        let descriptor =
            ConnectionDescriptor::new("archive", "mongodb://archive:27017", "shop_archive", false);
        let config = MongoConfig::from_descriptor(&descriptor).unwrap();
        assert_eq!(config.name, "archive");
        assert_eq!(config.uri, "mongodb://archive:27017");
        assert_eq!(config.database, "shop_archive");
        assert_eq!(config.app_name.as_deref(), Some("beanmap"));
        assert_eq!(config.max_pool_size, Some(10));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_descriptor_options_override_defaults() {
        let mut descriptor =
            ConnectionDescriptor::new("main", "mongodb://localhost:27017", "shop", true);
        descriptor.app_name = Some("shop-api".to_string());
        descriptor.min_pool_size = Some(2);
        descriptor.max_pool_size = Some(25);
        descriptor.connect_timeout = Some("3s".to_string());
        descriptor.server_selection_timeout = Some("500ms".to_string());
        descriptor.retry_writes = Some(false);
        descriptor.direct_connection = Some(true);

        let config = MongoConfig::from_descriptor(&descriptor).unwrap();
        assert_eq!(config.app_name.as_deref(), Some("shop-api"));
        assert_eq!(config.min_pool_size, Some(2));
        assert_eq!(config.max_pool_size, Some(25));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(3)));
        assert_eq!(config.server_selection_timeout, Some(Duration::from_millis(500)));
        assert_eq!(config.max_idle_time, Some(Duration::from_secs(300)));
        assert_eq!(config.retry_writes, Some(false));
        assert_eq!(config.retry_reads, Some(true));
        assert_eq!(config.direct_connection, Some(true));
    }

    #[test]
    fn test_descriptor_with_bad_duration() {
        let mut descriptor =
            ConnectionDescriptor::new("main", "mongodb://localhost:27017", "shop", true);
        descriptor.max_idle_time = Some("forever".to_string());
        let err = MongoConfig::from_descriptor(&descriptor).unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_to_client_options() {
        let mut descriptor =
            ConnectionDescriptor::new("main", "mongodb://localhost:27017", "shop", true);
        descriptor.max_pool_size = Some(4);
        descriptor.direct_connection = Some(true);
        let config = MongoConfig::from_descriptor(&descriptor).unwrap();

        let options = config.to_client_options().await.unwrap();
        assert_eq!(options.app_name.as_deref(), Some("beanmap"));
        assert_eq!(options.max_pool_size, Some(4));
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(10)));
        assert_eq!(options.direct_connection, Some(true));
    }

    #[tokio::test]
    async fn test_invalid_uri_is_config_error() {
        let config = MongoConfig::from_uri("not-a-uri", "shop");
        let err = config.to_client_options().await.unwrap_err();
        assert!(err.is_config_error());
    }
}
