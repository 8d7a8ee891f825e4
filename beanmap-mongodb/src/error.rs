//! Error types for MongoDB operations.

use beanmap_schema::SchemaError;
use thiserror::Error;

use crate::codec::CodecError;

/// Result type for MongoDB operations.
pub type MongoResult<T> = Result<T, MongoError>;

/// Errors that can occur during MongoDB operations.
#[derive(Error, Debug)]
pub enum MongoError {
    /// MongoDB driver error.
    #[error("mongodb error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// BSON serialization error.
    #[error("bson error: {0}")]
    Bson(#[from] bson::ser::Error),

    /// BSON deserialization error.
    #[error("bson deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),

    /// Schema or configuration file error.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Bean encoding or decoding error.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// No codec is registered for a bean type.
    #[error("no codec registered for `{0}`")]
    CodecNotFound(String),

    /// Database not found by logical name.
    #[error("unknown database: {0}")]
    UnknownDatabase(String),

    /// Invalid ObjectId.
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),
}

impl MongoError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a codec not found error.
    pub fn codec_not_found(bean: impl Into<String>) -> Self {
        Self::CodecNotFound(bean.into())
    }

    /// Create an invalid object id error.
    pub fn invalid_object_id(message: impl Into<String>) -> Self {
        Self::InvalidObjectId(message.into())
    }

    /// Check if this is a configuration error.
    ///
    /// Configuration errors are fatal: they abort initialization.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Schema(_))
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is a codec error.
    pub fn is_codec_error(&self) -> bool {
        matches!(self, Self::Codec(_) | Self::CodecNotFound(_))
    }
}

impl From<bson::oid::Error> for MongoError {
    fn from(err: bson::oid::Error) -> Self {
        MongoError::InvalidObjectId(err.to_string())
    }
}
