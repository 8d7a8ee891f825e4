//! Document accessors and identifier helpers.

use beanmap_schema::ID_FIELD;
use bson::{Bson, Document, doc, oid::ObjectId};

use crate::error::{MongoError, MongoResult};

/// Extension trait for BSON documents.
pub trait DocumentExt {
    /// Get an optional string value.
    fn get_str_opt(&self, key: &str) -> Option<&str>;

    /// Get an optional i64 value, widening i32.
    fn get_i64_opt(&self, key: &str) -> Option<i64>;

    /// Get an optional nested document.
    fn get_document_opt(&self, key: &str) -> Option<&Document>;

    /// Get an optional array value.
    fn get_array_opt(&self, key: &str) -> Option<&Vec<Bson>>;

    /// Whether the key is present with an explicit null.
    fn is_explicit_null(&self, key: &str) -> bool;

    /// The `_id` field in string form.
    fn id_string(&self) -> Option<String>;
}

impl DocumentExt for Document {
    fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.get_str(key).ok()
    }

    fn get_i64_opt(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Bson::Int32(v) => Some(i64::from(*v)),
            Bson::Int64(v) => Some(*v),
            _ => None,
        }
    }

    fn get_document_opt(&self, key: &str) -> Option<&Document> {
        self.get_document(key).ok()
    }

    fn get_array_opt(&self, key: &str) -> Option<&Vec<Bson>> {
        self.get_array(key).ok()
    }

    fn is_explicit_null(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Bson::Null))
    }

    fn id_string(&self) -> Option<String> {
        self.get(ID_FIELD).and_then(identifier_string)
    }
}

/// The string form of a stored identifier.
///
/// ObjectIds become their hex form; strings and integers are accepted as
/// well. Other types have no string form.
pub fn identifier_string(value: &Bson) -> Option<String> {
    match value {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(s) => Some(s.clone()),
        Bson::Int32(v) => Some(v.to_string()),
        Bson::Int64(v) => Some(v.to_string()),
        _ => None,
    }
}

/// Filter matching a document by its string identifier.
///
/// A 24-character hex id is matched as an ObjectId, anything else as a
/// plain string.
pub fn id_filter(id: &str) -> Document {
    match ObjectId::parse_str(id) {
        Ok(oid) => doc! { "_id": oid },
        Err(_) => doc! { "_id": id },
    }
}

/// Parse an ObjectId from a string.
pub fn parse_object_id(s: &str) -> MongoResult<ObjectId> {
    ObjectId::parse_str(s).map_err(MongoError::from)
}

/// Create a new ObjectId.
pub fn new_object_id() -> ObjectId {
    ObjectId::new()
}
