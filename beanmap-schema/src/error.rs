//! Error types for bean schemas and configuration.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema and configuration operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while building bean schemas or loading configuration.
///
/// All of these are configuration errors: they are fatal and abort
/// initialization.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(beanmap::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(beanmap::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(
        code(beanmap::schema::config_error),
        help("check the [scan] and [[connections]] sections of beanmap.toml")
    )]
    ConfigError { message: String },

    /// Two mapped fields resolve to the same storage name.
    #[error("duplicate storage name `{storage_name}` in `{bean}` (fields `{first}` and `{second}`)")]
    #[diagnostic(
        code(beanmap::schema::duplicate_storage_name),
        help("use #[bean(column = \"...\")] to give one of the fields a distinct name")
    )]
    DuplicateStorageName {
        bean: String,
        storage_name: String,
        first: String,
        second: String,
    },

    /// More than one field maps to the reserved identifier.
    #[error("`{bean}` declares more than one identifier field")]
    #[diagnostic(code(beanmap::schema::duplicate_identifier))]
    DuplicateIdentifier { bean: String },

    /// A bean is missing its collection name.
    #[error("`{bean}` does not declare a collection name")]
    #[diagnostic(
        code(beanmap::schema::missing_collection),
        help("add #[bean(collection = \"...\")] to the struct")
    )]
    MissingCollection { bean: String },
}

impl SchemaError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a duplicate storage name error.
    pub fn duplicate_storage_name(
        bean: impl Into<String>,
        storage_name: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::DuplicateStorageName {
            bean: bean.into(),
            storage_name: storage_name.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create a missing collection error.
    pub fn missing_collection(bean: impl Into<String>) -> Self {
        Self::MissingCollection { bean: bean.into() }
    }

    /// Check if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigError { .. } | Self::TomlError { .. } | Self::IoError { .. }
        )
    }
}

#[cfg(test)]
#[allow(unused_assignments)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = SchemaError::config("no connections");
        assert!(err.is_config_error());
        assert_eq!(err.to_string(), "configuration error: no connections");
    }

    #[test]
    fn test_duplicate_storage_name_display() {
        let err = SchemaError::duplicate_storage_name("Order", "user_name", "userName", "user_name");
        let display = err.to_string();
        assert!(display.contains("user_name"));
        assert!(display.contains("Order"));
        assert!(display.contains("userName"));
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_missing_collection_display() {
        let err = SchemaError::missing_collection("LineItem");
        assert_eq!(
            err.to_string(),
            "`LineItem` does not declare a collection name"
        );
    }

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = SchemaError::IoError {
            path: "beanmap.toml".to_string(),
            source: io_err,
        };

        assert!(err.to_string().contains("beanmap.toml"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_diagnostic_code() {
        let err = SchemaError::DuplicateIdentifier {
            bean: "Order".to_string(),
        };
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("beanmap::schema::duplicate_identifier"));
    }
}
