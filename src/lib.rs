//! # beanmap
//!
//! Annotation-driven mapping between Rust structs and MongoDB documents.
//!
//! beanmap provides:
//! - `#[derive(Bean)]`, which builds a per-type field table at compile time
//! - A codec that encodes beans into BSON documents and decodes them back,
//!   recursing into nested beans and lists of nested beans
//! - Codec discovery over every derived bean linked into the binary
//! - A connection factory configured from `beanmap.toml`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use beanmap::prelude::*;
//!
//! #[derive(Debug, Default, Bean)]
//! #[bean(collection = "orders")]
//! pub struct Order {
//!     #[bean(id)]
//!     pub id: String,
//!     pub customer_name: String,
//!     pub items: Vec<LineItem>,
//! }
//!
//! #[derive(Debug, Default, Bean)]
//! #[bean(embedded)]
//! pub struct LineItem {
//!     pub sku: String,
//!     pub qty: i32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), MongoError> {
//!     let config = BeanmapConfig::from_file("beanmap.toml")?;
//!     let factory = MongoFactory::init_global(config).await?;
//!
//!     let orders = factory.db().collection::<Order>()?;
//!     let id = orders.insert_one(&Order::default()).await?;
//!     let found = orders.find_by_id(&id).await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

extern crate self as beanmap;

/// Naming, classification and configuration.
pub mod schema {
    pub use beanmap_schema::*;
}

/// Codecs, discovery and the connection factory.
pub mod mongodb {
    pub use beanmap_mongodb::*;
}

// Re-export the derive macro and the trait it implements
pub use beanmap_mongodb::Bean;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::mongodb::prelude::*;
    pub use crate::mongodb::{BeanCollection, CodecRegistry, DiscoveryScanner};
    pub use crate::schema::BeanmapConfig;
    pub use beanmap_mongodb::Bean;
}

// Re-export key types at the crate root
pub use mongodb::{CodecMode, Decoded, Encoded, MongoError, MongoFactory};
pub use schema::{BeanmapConfig, SchemaError};
