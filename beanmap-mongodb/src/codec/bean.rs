//! Per-type codecs.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use beanmap_schema::SchemaResult;
use bson::{Bson, Document};

use super::{CodecError, CodecMode, CodecResult, Decoded, Encoded, MappingContext};
use crate::discovery::{DiscoveryError, DiscoveryResult};
use crate::schema::Bean;

/// A type-erased bean codec, as held by the registry.
pub trait Codec: Send + Sync + 'static {
    /// The bean type this codec maps.
    fn bean_type(&self) -> TypeId;

    /// Short name of the bean type.
    fn type_name(&self) -> &'static str;

    /// Declared collection name, if any.
    fn collection(&self) -> Option<&'static str>;

    /// Check the bean's field table.
    fn validate(&self) -> SchemaResult<()>;

    /// Encode a bean passed as `&dyn Any`.
    fn encode_any(&self, value: &dyn Any) -> CodecResult<Encoded>;

    /// Decode a document into a boxed bean.
    fn decode_any(&self, document: Document) -> CodecResult<Decoded<Box<dyn Any + Send>>>;

    /// The same codec with another failure mode.
    fn in_mode(&self, mode: CodecMode) -> Arc<dyn Codec>;

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("type_name", &self.type_name())
            .field("collection", &self.collection())
            .finish()
    }
}

/// The codec for one bean type, driven by its schema.
pub struct BeanCodec<T> {
    mode: CodecMode,
    _bean: PhantomData<fn() -> T>,
}

impl<T> Clone for BeanCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BeanCodec<T> {}

impl<T> fmt::Debug for BeanCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanCodec")
            .field("bean", &std::any::type_name::<T>())
            .field("mode", &self.mode)
            .finish()
    }
}

impl<T: Bean> Default for BeanCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Bean> BeanCodec<T> {
    /// Create a lenient codec.
    pub fn new() -> Self {
        Self::with_mode(CodecMode::Lenient)
    }

    /// Create a strict codec.
    pub fn strict() -> Self {
        Self::with_mode(CodecMode::Strict)
    }

    /// Create a codec with the given failure mode.
    pub fn with_mode(mode: CodecMode) -> Self {
        Self {
            mode,
            _bean: PhantomData,
        }
    }

    /// The failure mode.
    pub fn mode(&self) -> CodecMode {
        self.mode
    }

    /// Encode a bean, applying the failure mode.
    pub fn encode(&self, value: &T) -> CodecResult<Encoded> {
        let encoded = super::encode(value);
        match self.mode {
            CodecMode::Lenient => Ok(encoded),
            CodecMode::Strict => encoded.require_clean(),
        }
    }

    /// Decode a document, applying the failure mode.
    pub fn decode(&self, document: Document) -> CodecResult<Decoded<T>> {
        let decoded = super::decode(document);
        match self.mode {
            CodecMode::Lenient => Ok(decoded),
            CodecMode::Strict => decoded.require_clean(),
        }
    }

    /// The bean's identifier in string form, if it has one and it is set.
    pub fn identifier_of(&self, value: &T) -> Option<String> {
        let read = T::schema().identifier()?.reader()?;
        match read(value, &mut MappingContext::new()) {
            Ok(Bson::String(id)) if !id.is_empty() => Some(id),
            _ => None,
        }
    }

    /// Discovery entry point: validate the schema and build a lenient codec.
    pub fn factory() -> DiscoveryResult<Arc<dyn Codec>> {
        let schema = T::schema();
        schema
            .validate()
            .map_err(|source| DiscoveryError::InvalidSchema {
                type_path: schema.type_path(),
                source,
            })?;
        Ok(Arc::new(Self::new()))
    }
}

impl<T: Bean> Codec for BeanCodec<T> {
    fn bean_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        T::schema().type_name()
    }

    fn collection(&self) -> Option<&'static str> {
        T::schema().collection()
    }

    fn validate(&self) -> SchemaResult<()> {
        T::schema().validate()
    }

    fn encode_any(&self, value: &dyn Any) -> CodecResult<Encoded> {
        let value = value
            .downcast_ref::<T>()
            .ok_or(CodecError::WrongBeanType {
                expected: self.type_name(),
            })?;
        self.encode(value)
    }

    fn decode_any(&self, document: Document) -> CodecResult<Decoded<Box<dyn Any + Send>>> {
        self.decode(document)
            .map(|decoded| decoded.map(|value| Box::new(value) as Box<dyn Any + Send>))
    }

    fn in_mode(&self, mode: CodecMode) -> Arc<dyn Codec> {
        Arc::new(Self::with_mode(mode))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
