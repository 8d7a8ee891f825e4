//! # beanmap-mongodb
//!
//! Bean ↔ BSON mapping for MongoDB.
//!
//! This crate provides:
//! - The bean codec: schema-driven encoding of structs into documents and
//!   back, with nested beans, lists of nested beans and `_id` handling
//! - Codec discovery over beans registered by `#[derive(Bean)]`
//! - An immutable codec registry and a cached collection-name resolver
//! - A connection factory producing one database handle per connection
//!
//! ## Example
//!
//! ```rust,ignore
//! use beanmap_mongodb::{Bean, codec};
//!
//! #[derive(Debug, Default, Bean)]
//! #[bean(collection = "orders")]
//! struct Order {
//!     #[bean(id)]
//!     id: String,
//!     customer_name: String,
//!     items: Vec<LineItem>,
//! }
//!
//! #[derive(Debug, Default, Bean)]
//! #[bean(embedded)]
//! struct LineItem {
//!     sku: String,
//!     qty: i32,
//! }
//!
//! let encoded = codec::encode(&order);
//! // { customer_name: "...", items: [{ sku: "...", qty: 2 }] }
//! let decoded = codec::decode::<Order>(encoded.document);
//! ```
//!
//! ## Field failures
//!
//! A field that cannot be mapped does not fail the whole bean. It is logged
//! with `tracing`, reported in the result's `warnings`, and left absent
//! (encode) or at its default (decode). Use [`CodecMode::Strict`] to turn
//! any warning into an error.

extern crate self as beanmap_mongodb;

pub mod client;
pub mod codec;
pub mod collection;
pub mod collections;
pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod factory;
pub mod registry;
pub mod schema;

pub use beanmap_codegen::Bean;
pub use beanmap_schema::{FieldKind, ID_FIELD};
pub use bson;
pub use bson::oid::ObjectId;
pub use bson::{Bson, Document, doc};
pub use client::MongoClient;
pub use codec::{
    BeanCodec, Codec, CodecError, CodecMode, CodecResult, Decoded, Encoded, FieldError,
    FieldWarning, MappingContext,
};
pub use collection::BeanCollection;
pub use collections::CollectionNames;
pub use config::MongoConfig;
pub use discovery::{
    CandidateSource, CodecCandidate, DiscoveryError, DiscoveryScanner, ExplicitCandidates,
    LinkedCandidates,
};
pub use error::{MongoError, MongoResult};
pub use factory::{MongoDb, MongoFactory};
pub use inventory;
pub use registry::{CodecRegistry, CodecRegistryBuilder, CodecSet};
pub use schema::{Bean, FieldDescriptor, ReadFn, SchemaDescriptor, WriteFn};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::codec::{CodecMode, Decoded, Encoded};
    pub use crate::document::DocumentExt;
    pub use crate::error::{MongoError, MongoResult};
    pub use crate::factory::{MongoDb, MongoFactory};
    pub use crate::schema::Bean;
    pub use bson::oid::ObjectId;
    pub use bson::{Bson, Document, doc};
}
