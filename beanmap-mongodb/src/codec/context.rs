//! Field paths and per-field warnings collected while mapping a bean.

use std::fmt;

use bson::spec::ElementType;
use thiserror::Error;
use tracing::warn;

/// Why a single field failed to map.
#[derive(Error, Debug)]
pub enum FieldError {
    /// The value could not be converted to BSON.
    #[error("serialization failed: {0}")]
    Serialize(#[from] bson::ser::Error),

    /// The stored value could not be converted to the field type.
    #[error("deserialization failed: {0}")]
    Deserialize(#[from] bson::de::Error),

    /// The stored value has the wrong BSON type for a nested field.
    #[error("expected {expected}, found {found:?}")]
    TypeMismatch {
        expected: &'static str,
        found: ElementType,
    },

    /// The stored `_id` has a type with no string form.
    #[error("identifier of type {0:?} has no string form")]
    UnsupportedIdentifier(ElementType),
}

impl FieldError {
    /// Create a type mismatch error.
    pub fn type_mismatch(expected: &'static str, found: ElementType) -> Self {
        Self::TypeMismatch { expected, found }
    }
}

/// A field that was dropped (encode) or left at its default (decode).
#[derive(Debug)]
pub struct FieldWarning {
    /// Bean type that owns the field.
    pub bean: &'static str,
    /// Path from the top-level bean, e.g. `items[1].qty`.
    pub path: String,
    /// What went wrong.
    pub error: FieldError,
}

impl fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Field(String),
    Index(usize),
}

/// Tracks where the codec is inside a bean and collects warnings.
#[derive(Debug, Default)]
pub struct MappingContext {
    path: Vec<Segment>,
    warnings: Vec<FieldWarning>,
}

impl MappingContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a field.
    pub fn push_field(&mut self, storage_name: &str) {
        self.path.push(Segment::Field(storage_name.to_string()));
    }

    /// Enter a list element.
    pub fn push_index(&mut self, index: usize) {
        self.path.push(Segment::Index(index));
    }

    /// Leave the innermost field or element.
    pub fn pop(&mut self) {
        self.path.pop();
    }

    /// Render the current path.
    pub fn path(&self) -> String {
        let mut rendered = String::new();
        for segment in &self.path {
            match segment {
                Segment::Field(name) => {
                    if !rendered.is_empty() {
                        rendered.push('.');
                    }
                    rendered.push_str(name);
                }
                Segment::Index(index) => {
                    rendered.push('[');
                    rendered.push_str(&index.to_string());
                    rendered.push(']');
                }
            }
        }
        rendered
    }

    /// Record a failed field at the current path.
    pub fn record(&mut self, bean: &'static str, error: FieldError) {
        let path = self.path();
        warn!(bean = bean, field = %path, error = %error, "Field skipped during mapping");
        self.warnings.push(FieldWarning { bean, path, error });
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> &[FieldWarning] {
        &self.warnings
    }

    /// Consume the context, returning its warnings.
    pub fn into_warnings(self) -> Vec<FieldWarning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_rendering() {
        let mut ctx = MappingContext::new();
        assert_eq!(ctx.path(), "");

        ctx.push_field("items");
        ctx.push_index(1);
        ctx.push_field("qty");
        assert_eq!(ctx.path(), "items[1].qty");

        ctx.pop();
        ctx.pop();
        assert_eq!(ctx.path(), "items");
    }

    #[test]
    fn test_record_warning() {
        let mut ctx = MappingContext::new();
        ctx.push_field("address");
        ctx.record(
            "Customer",
            FieldError::type_mismatch("document", ElementType::String),
        );
        ctx.pop();

        assert_eq!(ctx.warnings().len(), 1);
        let warnings = ctx.into_warnings();
        assert_eq!(warnings[0].path, "address");
        assert_eq!(warnings[0].bean, "Customer");
        assert_eq!(
            warnings[0].to_string(),
            "address: expected document, found String"
        );
    }
}
