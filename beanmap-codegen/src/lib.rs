//! Procedural macros for beanmap.
//!
//! # Macros
//!
//! - [`Bean`] - Derive the field table and codec registration for a struct
//!
//! # Example
//!
//! ```rust,ignore
//! #[derive(Debug, Default, beanmap::Bean)]
//! #[bean(collection = "orders")]
//! struct Order {
//!     #[bean(id)]
//!     id: String,
//!     customer_name: String,
//!     items: Vec<LineItem>,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod crate_paths;
mod generators;

/// Derive macro for mapping a struct to and from BSON documents.
///
/// The struct must implement `Default`: decoding starts from the default
/// value and overwrites the fields present in the document. Scalar fields
/// need `serde::Serialize` and `serde::de::DeserializeOwned`; nested fields
/// need `Bean` themselves. A nested field may be boxed, which is how a bean
/// refers to its own type (`parent: Option<Box<Category>>`).
///
/// Field names are stored in snake case (`customerName` becomes
/// `customer_name`) unless overridden.
///
/// # Attributes
///
/// ## Struct-level
/// - `#[bean(collection = "name")]` - Collection the bean is stored in
/// - `#[bean(embedded)]` - Only ever nested inside other beans; no codec is
///   registered for discovery
///
/// ## Field-level
/// - `#[bean(id)]` - The identifier, stored as `_id`
/// - `#[bean(column = "name")]` - Store under a different key
/// - `#[bean(transient)]` - Never encoded or decoded
/// - `#[bean(nested)]` - Treat as a nested bean (or a `Vec` of them)
/// - `#[bean(scalar)]` - Pass through serde even if the type looks custom
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Default, beanmap::Bean)]
/// #[bean(collection = "customers")]
/// struct Customer {
///     #[bean(id)]
///     id: String,
///
///     #[bean(column = "name")]
///     display_name: String,
///
///     address: Option<Address>,
///
///     #[bean(transient)]
///     session_cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Bean, attributes(bean))]
pub fn derive_bean(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let generated = crate_paths::runtime_crate()
        .and_then(|krate| generators::derive_bean_impl(&input, &krate));

    match generated {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
