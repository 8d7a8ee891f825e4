//! # beanmap-schema
//!
//! Storage-independent building blocks for beanmap.
//!
//! This crate provides:
//! - The naming resolver that maps field names to storage names
//! - The field classifier that decides how each field is mapped
//! - Configuration parsing for `beanmap.toml` files
//!
//! ## Example
//!
//! ```rust
//! use beanmap_schema::{FieldKind, classify, naming};
//!
//! assert_eq!(naming::storage_name("customerName"), "customer_name");
//! assert_eq!(classify("Vec", Some("LineItem")), FieldKind::NestedList);
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod naming;

pub use classify::{
    Classification, FieldFacts, FieldKind, KindHint, TypeShape, classify, classify_field,
    is_custom_type,
};
pub use config::{
    BeanmapConfig, CONFIG_FILE_NAME, CodecConfig, ConnectionDescriptor, ScanConfig, parse_duration,
    validate_connections,
};
pub use error::{SchemaError, SchemaResult};
pub use naming::ID_FIELD;
