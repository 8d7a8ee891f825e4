//! Typed collections that map documents through a bean codec.

use bson::Document;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::options::ReplaceOptions;
use tracing::debug;

use crate::codec::{BeanCodec, Decoded};
use crate::document::{id_filter, identifier_string};
use crate::error::{MongoError, MongoResult};
use crate::schema::Bean;

/// A collection of beans of type `T`.
///
/// Documents are encoded and decoded with the registered codec for `T`, so
/// field naming, nested beans and `_id` handling follow the bean's schema.
/// In lenient mode every read returns the decoded value together with the
/// warnings for fields that failed.
pub struct BeanCollection<T> {
    inner: Collection<Document>,
    codec: BeanCodec<T>,
}

impl<T> Clone for BeanCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            codec: self.codec,
        }
    }
}

impl<T: Bean> BeanCollection<T> {
    /// Wrap a raw collection.
    pub fn new(inner: Collection<Document>, codec: BeanCodec<T>) -> Self {
        Self { inner, codec }
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// The codec used for this collection.
    pub fn codec(&self) -> &BeanCodec<T> {
        &self.codec
    }

    /// The raw document collection.
    pub fn inner(&self) -> &Collection<Document> {
        &self.inner
    }

    /// Insert a bean, returning the server-assigned identifier.
    pub async fn insert_one(&self, value: &T) -> MongoResult<String> {
        let document = self.codec.encode(value)?.into_document();
        debug!(collection = %self.name(), "Inserting bean");

        let result = self.inner.insert_one(document, None).await?;
        identifier_string(&result.inserted_id).ok_or_else(|| {
            MongoError::invalid_object_id(format!(
                "inserted id has type {:?}",
                result.inserted_id.element_type()
            ))
        })
    }

    /// Insert several beans, returning their identifiers in order.
    pub async fn insert_many(&self, values: &[T]) -> MongoResult<Vec<String>> {
        let documents = values
            .iter()
            .map(|value| self.codec.encode(value).map(|e| e.into_document()))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(collection = %self.name(), count = documents.len(), "Inserting beans");

        let result = self.inner.insert_many(documents, None).await?;
        Ok((0..values.len())
            .filter_map(|i| result.inserted_ids.get(&i).and_then(identifier_string))
            .collect())
    }

    /// Find the first bean matching a filter.
    pub async fn find_one(&self, filter: Document) -> MongoResult<Option<Decoded<T>>> {
        debug!(collection = %self.name(), filter = %filter, "Finding bean");
        match self.inner.find_one(filter, None).await? {
            Some(document) => Ok(Some(self.codec.decode(document)?)),
            None => Ok(None),
        }
    }

    /// Find every bean matching a filter.
    pub async fn find(&self, filter: Document) -> MongoResult<Vec<Decoded<T>>> {
        debug!(collection = %self.name(), filter = %filter, "Finding beans");
        let mut cursor = self.inner.find(filter, None).await?;

        let mut beans = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            beans.push(self.codec.decode(document)?);
        }
        Ok(beans)
    }

    /// Find a bean by its string identifier.
    pub async fn find_by_id(&self, id: &str) -> MongoResult<Option<Decoded<T>>> {
        self.find_one(id_filter(id)).await
    }

    /// Replace the stored bean with the same identifier, or insert it when
    /// the identifier is unset. Returns the identifier.
    pub async fn save(&self, value: &T) -> MongoResult<String> {
        let Some(id) = self.codec.identifier_of(value) else {
            return self.insert_one(value).await;
        };

        let document = self.codec.encode(value)?.into_document();
        debug!(collection = %self.name(), id = %id, "Saving bean");

        let options = ReplaceOptions::builder().upsert(true).build();
        self.inner
            .replace_one(id_filter(&id), document, options)
            .await?;
        Ok(id)
    }

    /// Delete a bean by identifier. Returns whether a document was removed.
    pub async fn delete_by_id(&self, id: &str) -> MongoResult<bool> {
        debug!(collection = %self.name(), id = %id, "Deleting bean");
        let result = self.inner.delete_one(id_filter(id), None).await?;
        Ok(result.deleted_count > 0)
    }

    /// Count beans matching an optional filter.
    pub async fn count_documents(&self, filter: Option<Document>) -> MongoResult<u64> {
        Ok(self.inner.count_documents(filter, None).await?)
    }
}

impl<T> std::fmt::Debug for BeanCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanCollection")
            .field("name", &self.inner.name())
            .field("codec", &self.codec)
            .finish()
    }
}
