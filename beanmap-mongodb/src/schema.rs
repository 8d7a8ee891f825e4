//! Runtime bean schemas.
//!
//! A [`SchemaDescriptor`] is the per-type field table the codec walks. It is
//! normally produced by `#[derive(Bean)]` and built once per type.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use beanmap_schema::{FieldKind, SchemaError, SchemaResult};
use bson::Bson;

use crate::codec::{FieldError, MappingContext};

/// Reads a field out of a bean as a BSON value.
pub type ReadFn<T> = fn(&T, &mut MappingContext) -> Result<Bson, FieldError>;

/// Writes a BSON value into a field of a bean.
pub type WriteFn<T> = fn(&mut T, Bson, &mut MappingContext) -> Result<(), FieldError>;

/// A type that can be mapped to and from a BSON document.
///
/// Beans are default-constructible: decoding starts from `T::default()` and
/// overwrites the fields found in the document.
pub trait Bean: Default + Send + Sync + 'static {
    /// The field table for this bean type.
    fn schema() -> &'static SchemaDescriptor<Self>;
}

/// Mapping metadata for one field of a bean.
pub struct FieldDescriptor<T> {
    field_name: &'static str,
    storage_name: Cow<'static, str>,
    kind: FieldKind,
    nested_type: Option<&'static str>,
    excluded: bool,
    read: Option<ReadFn<T>>,
    write: Option<WriteFn<T>>,
}

impl<T> FieldDescriptor<T> {
    /// Create a mapped field.
    pub fn new(
        field_name: &'static str,
        storage_name: impl Into<Cow<'static, str>>,
        kind: FieldKind,
        read: ReadFn<T>,
        write: WriteFn<T>,
    ) -> Self {
        Self {
            field_name,
            storage_name: storage_name.into(),
            kind,
            nested_type: None,
            excluded: false,
            read: Some(read),
            write: Some(write),
        }
    }

    /// Create an excluded field. It is kept in the table for introspection
    /// but never encoded or decoded.
    pub fn excluded(field_name: &'static str) -> Self {
        Self {
            field_name,
            storage_name: Cow::Borrowed(field_name),
            kind: FieldKind::Scalar,
            nested_type: None,
            excluded: true,
            read: None,
            write: None,
        }
    }

    /// Record the nested bean type for nested kinds.
    pub fn with_nested_type(mut self, nested_type: &'static str) -> Self {
        self.nested_type = Some(nested_type);
        self
    }

    /// Name of the field in the struct.
    pub fn field_name(&self) -> &'static str {
        self.field_name
    }

    /// Key used in the document.
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    /// How the codec maps this field.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Nested bean type, for nested kinds.
    pub fn nested_type(&self) -> Option<&'static str> {
        self.nested_type
    }

    /// Whether this field is excluded from mapping.
    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    /// Whether this is the `_id` field.
    pub fn is_identifier(&self) -> bool {
        !self.excluded && self.kind == FieldKind::Identifier
    }

    pub(crate) fn reader(&self) -> Option<ReadFn<T>> {
        self.read
    }

    pub(crate) fn writer(&self) -> Option<WriteFn<T>> {
        self.write
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("field_name", &self.field_name)
            .field("storage_name", &self.storage_name)
            .field("kind", &self.kind)
            .field("nested_type", &self.nested_type)
            .field("excluded", &self.excluded)
            .finish()
    }
}

/// The field table of a bean type.
pub struct SchemaDescriptor<T> {
    type_name: &'static str,
    module_path: &'static str,
    collection: Option<&'static str>,
    fields: Vec<FieldDescriptor<T>>,
}

impl<T> SchemaDescriptor<T> {
    /// Create a schema from its fields, in declaration order.
    pub fn new(
        type_name: &'static str,
        module_path: &'static str,
        collection: Option<&'static str>,
        fields: Vec<FieldDescriptor<T>>,
    ) -> Self {
        Self {
            type_name,
            module_path,
            collection,
            fields,
        }
    }

    /// Short type name (`Order`).
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Module the type is declared in (`shop::models`).
    pub fn module_path(&self) -> &'static str {
        self.module_path
    }

    /// Fully qualified type path (`shop::models::Order`).
    pub fn type_path(&self) -> String {
        format!("{}::{}", self.module_path, self.type_name)
    }

    /// Declared collection name, if any.
    pub fn collection(&self) -> Option<&'static str> {
        self.collection
    }

    /// All fields, excluded ones included.
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    /// Fields that take part in encoding and decoding.
    pub fn mapped_fields(&self) -> impl Iterator<Item = &FieldDescriptor<T>> {
        self.fields.iter().filter(|f| !f.excluded)
    }

    /// Look up a field by its struct name.
    pub fn field(&self, field_name: &str) -> Option<&FieldDescriptor<T>> {
        self.fields.iter().find(|f| f.field_name == field_name)
    }

    /// The identifier field, if the bean has one.
    pub fn identifier(&self) -> Option<&FieldDescriptor<T>> {
        self.fields.iter().find(|f| f.is_identifier())
    }

    /// Check that no two mapped fields share a storage name and that there
    /// is at most one identifier.
    pub fn validate(&self) -> SchemaResult<()> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        let mut identifiers = 0;

        for field in self.mapped_fields() {
            if field.kind == FieldKind::Identifier {
                identifiers += 1;
                if identifiers > 1 {
                    return Err(SchemaError::DuplicateIdentifier {
                        bean: self.type_name.to_string(),
                    });
                }
            }
            if let Some(first) = seen.insert(field.storage_name(), field.field_name) {
                return Err(SchemaError::duplicate_storage_name(
                    self.type_name,
                    field.storage_name(),
                    first,
                    field.field_name,
                ));
            }
        }

        Ok(())
    }
}

impl<T> fmt::Debug for SchemaDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDescriptor")
            .field("type_name", &self.type_name)
            .field("module_path", &self.module_path)
            .field("collection", &self.collection)
            .field("fields", &self.fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::value;

    #[derive(Default)]
    struct Probe {
        name: String,
        alias: String,
    }

    fn read_name(p: &Probe, _: &mut MappingContext) -> Result<Bson, FieldError> {
        value::encode_scalar(&p.name)
    }

    fn write_name(p: &mut Probe, v: Bson, _: &mut MappingContext) -> Result<(), FieldError> {
        p.name = value::decode_scalar(v)?;
        Ok(())
    }

    fn read_alias(p: &Probe, _: &mut MappingContext) -> Result<Bson, FieldError> {
        value::encode_scalar(&p.alias)
    }

    fn write_alias(p: &mut Probe, v: Bson, _: &mut MappingContext) -> Result<(), FieldError> {
        p.alias = value::decode_scalar(v)?;
        Ok(())
    }

    #[test]
    fn test_field_lookup() {
        let schema = SchemaDescriptor::new(
            "Probe",
            "tests",
            Some("probes"),
            vec![
                FieldDescriptor::new("name", "name", FieldKind::Scalar, read_name, write_name),
                FieldDescriptor::excluded("cache"),
            ],
        );

        assert_eq!(schema.type_path(), "tests::Probe");
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.mapped_fields().count(), 1);
        assert!(schema.field("cache").unwrap().is_excluded());
        assert!(schema.identifier().is_none());
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_validate_duplicate_storage_name() {
        let schema = SchemaDescriptor::new(
            "Probe",
            "tests",
            None,
            vec![
                FieldDescriptor::new("name", "label", FieldKind::Scalar, read_name, write_name),
                FieldDescriptor::new("alias", "label", FieldKind::Scalar, read_alias, write_alias),
            ],
        );

        let err = schema.validate().unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateStorageName { .. }));
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn test_validate_duplicate_identifier() {
        let schema = SchemaDescriptor::new(
            "Probe",
            "tests",
            None,
            vec![
                FieldDescriptor::new("name", "_id", FieldKind::Identifier, read_name, write_name),
                FieldDescriptor::new("alias", "_id", FieldKind::Identifier, read_alias, write_alias),
            ],
        );

        assert!(matches!(
            schema.validate(),
            Err(SchemaError::DuplicateIdentifier { .. })
        ));
    }

    #[test]
    fn test_excluded_fields_do_not_collide() {
        let schema = SchemaDescriptor::new(
            "Probe",
            "tests",
            None,
            vec![
                FieldDescriptor::new("name", "alias", FieldKind::Scalar, read_name, write_name),
                FieldDescriptor::excluded("alias"),
            ],
        );

        assert!(schema.validate().is_ok());
    }
}
