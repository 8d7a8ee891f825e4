//! Codec sets and the immutable codec registry.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use beanmap_schema::SchemaResult;

use crate::codec::{BeanCodec, Codec};
use crate::schema::Bean;

/// An ordered set of codecs, unique by bean type.
#[derive(Clone, Default)]
pub struct CodecSet {
    codecs: Vec<Arc<dyn Codec>>,
    types: HashSet<TypeId>,
}

impl CodecSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a codec. Returns `false` if a codec for the same bean type is
    /// already present; the existing one is kept.
    pub fn insert(&mut self, codec: Arc<dyn Codec>) -> bool {
        if !self.types.insert(codec.bean_type()) {
            return false;
        }
        self.codecs.push(codec);
        true
    }

    /// Whether a codec for `T` is present.
    pub fn contains<T: Bean>(&self) -> bool {
        self.types.contains(&TypeId::of::<T>())
    }

    /// Number of codecs.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Iterate over the codecs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Codec>> {
        self.codecs.iter()
    }

    /// Bean type names, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.codecs.iter().map(|c| c.type_name()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for CodecSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.type_names()).finish()
    }
}

impl Extend<Arc<dyn Codec>> for CodecSet {
    fn extend<I: IntoIterator<Item = Arc<dyn Codec>>>(&mut self, iter: I) {
        for codec in iter {
            self.insert(codec);
        }
    }
}

impl IntoIterator for CodecSet {
    type Item = Arc<dyn Codec>;
    type IntoIter = std::vec::IntoIter<Arc<dyn Codec>>;

    fn into_iter(self) -> Self::IntoIter {
        self.codecs.into_iter()
    }
}

/// Bean type → codec, immutable once built.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    codecs: HashMap<TypeId, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// Build a registry from a discovered codec set.
    pub fn from_set(set: CodecSet) -> Self {
        let codecs = set
            .into_iter()
            .map(|codec| (codec.bean_type(), codec))
            .collect();
        Self { codecs }
    }

    /// Create a builder for explicit registration.
    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::default()
    }

    /// The typed codec for `T`.
    pub fn codec<T: Bean>(&self) -> Option<&BeanCodec<T>> {
        self.codecs
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<BeanCodec<T>>()
    }

    /// The codec for a bean type.
    pub fn get(&self, bean_type: TypeId) -> Option<&Arc<dyn Codec>> {
        self.codecs.get(&bean_type)
    }

    /// Whether a codec for `T` is registered.
    pub fn contains<T: Bean>(&self) -> bool {
        self.codecs.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered codecs.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Iterate over the registered codecs.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Codec>> {
        self.codecs.values()
    }

    /// Registered bean type names, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.codecs.values().map(|c| c.type_name()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.type_names())
            .finish()
    }
}

/// Builder for explicit registration.
#[derive(Debug, Default)]
pub struct CodecRegistryBuilder {
    set: CodecSet,
}

impl CodecRegistryBuilder {
    /// Register the codec for `T`.
    pub fn register<T: Bean>(mut self) -> Self {
        self.set.insert(Arc::new(BeanCodec::<T>::new()));
        self
    }

    /// Register a prepared codec.
    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.set.insert(codec);
        self
    }

    /// Add every codec of a discovered set.
    pub fn extend(mut self, set: CodecSet) -> Self {
        self.set.extend(set);
        self
    }

    /// Validate every registered schema and build the registry.
    pub fn build(self) -> SchemaResult<CodecRegistry> {
        for codec in self.set.iter() {
            codec.validate()?;
        }
        Ok(CodecRegistry::from_set(self.set))
    }
}
