//! Collection name resolution.

use std::any::TypeId;
use std::collections::HashMap;

use beanmap_schema::SchemaError;
use parking_lot::RwLock;
use tracing::debug;

use crate::codec::Codec;
use crate::error::MongoResult;
use crate::schema::Bean;

/// Memoized bean type → collection name lookup.
///
/// Safe to share between tasks. Two tasks resolving the same type at once
/// compute the same name; the first insert wins.
#[derive(Debug, Default)]
pub struct CollectionNames {
    names: RwLock<HashMap<TypeId, &'static str>>,
}

impl CollectionNames {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The collection name declared by `T`.
    ///
    /// Fails if `T` declares no name, or an empty one.
    pub fn name_for<T: Bean>(&self) -> MongoResult<&'static str> {
        let schema = T::schema();
        self.resolve(TypeId::of::<T>(), schema.type_name(), schema.collection())
    }

    /// The collection name declared by a codec's bean type.
    pub fn name_for_codec(&self, codec: &dyn Codec) -> MongoResult<&'static str> {
        self.resolve(codec.bean_type(), codec.type_name(), codec.collection())
    }

    /// Number of cached names.
    pub fn len(&self) -> usize {
        self.names.read().len()
    }

    /// Whether nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.names.read().is_empty()
    }

    /// Whether the name for `T` has been resolved.
    pub fn contains<T: Bean>(&self) -> bool {
        self.names.read().contains_key(&TypeId::of::<T>())
    }

    fn resolve(
        &self,
        bean_type: TypeId,
        type_name: &'static str,
        declared: Option<&'static str>,
    ) -> MongoResult<&'static str> {
        if let Some(name) = self.names.read().get(&bean_type) {
            return Ok(*name);
        }

        let name = declared
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| SchemaError::missing_collection(type_name))?;

        debug!(bean = type_name, collection = name, "Resolved collection name");
        Ok(*self.names.write().entry(bean_type).or_insert(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MongoError;
    use std::sync::Arc;

    #[derive(Debug, Default, crate::Bean)]
    #[bean(collection = "shipments")]
    struct Shipment {
        carrier: String,
    }

    #[derive(Debug, Default, crate::Bean)]
    #[bean(embedded)]
    struct Parcel {
        weight: f64,
    }

    #[derive(Debug, Default, crate::Bean)]
    #[bean(collection = "  ")]
    struct Blank {
        value: i32,
    }

    #[test]
    fn test_name_for_is_cached() {
        let names = CollectionNames::new();
        assert!(names.is_empty());

        assert_eq!(names.name_for::<Shipment>().unwrap(), "shipments");
        assert!(names.contains::<Shipment>());
        assert_eq!(names.name_for::<Shipment>().unwrap(), "shipments");
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_missing_name_fails() {
        let names = CollectionNames::new();

        let err = names.name_for::<Parcel>().unwrap_err();
        assert!(matches!(
            err,
            MongoError::Schema(SchemaError::MissingCollection { .. })
        ));
        assert!(err.is_config_error());

        assert!(names.name_for::<Blank>().is_err());
        assert!(names.is_empty());
    }

    #[test]
    fn test_name_for_codec() {
        let names = CollectionNames::new();
        let codec = crate::BeanCodec::<Shipment>::new();
        assert_eq!(names.name_for_codec(&codec).unwrap(), "shipments");
        assert!(names.contains::<Shipment>());
    }

    #[test]
    fn test_concurrent_resolution() {
        let names = Arc::new(CollectionNames::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let names = Arc::clone(&names);
                std::thread::spawn(move || names.name_for::<Shipment>().unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "shipments");
        }
        assert_eq!(names.len(), 1);
    }
}
