//! Bean ↔ document codec.
//!
//! [`encode`] and [`decode`] walk a bean's [`SchemaDescriptor`] field by
//! field. A field that fails to map never aborts the whole bean: it is
//! logged, reported as a [`FieldWarning`] and left absent (encode) or at its
//! default (decode). Callers that cannot tolerate silent loss use
//! [`CodecMode::Strict`] or [`Decoded::into_strict`].
//!
//! Encoding rules:
//! - the identifier (`_id`) is never written;
//! - a `None` value is written as an explicit null;
//! - nested beans and lists of nested beans recurse.
//!
//! Decoding starts from `T::default()`. An absent or null key keeps the
//! default. `_id` is read back in its string form.
//!
//! [`SchemaDescriptor`]: crate::schema::SchemaDescriptor

mod bean;
mod context;
pub mod value;

use std::fmt;

use bson::spec::ElementType;
use bson::{Bson, Document};
use thiserror::Error;

use crate::document::identifier_string;
use crate::schema::Bean;

pub use bean::{BeanCodec, Codec};
pub use context::{FieldError, FieldWarning, MappingContext};

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors surfaced by the codec for a whole bean.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The value to decode is not a document.
    #[error("cannot decode `{bean}` from {found:?}: not a document")]
    NotADocument {
        bean: &'static str,
        found: ElementType,
    },

    /// One or more fields failed to map in strict mode.
    #[error("`{bean}` failed to map {} field(s): {}", .warnings.len(), summarize(.warnings))]
    Field {
        bean: &'static str,
        warnings: Vec<FieldWarning>,
    },

    /// A type-erased codec was handed a value of another type.
    #[error("codec for `{expected}` received a value of another type")]
    WrongBeanType { expected: &'static str },
}

fn summarize(warnings: &[FieldWarning]) -> String {
    warnings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// How field failures are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecMode {
    /// Return the partial result together with its warnings.
    #[default]
    Lenient,
    /// Fail the whole operation if any field failed.
    Strict,
}

impl CodecMode {
    /// Pick the mode from the `[codec] strict` setting.
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::Lenient }
    }
}

/// The result of encoding a bean.
#[derive(Debug)]
pub struct Encoded {
    /// The encoded document, without failed fields.
    pub document: Document,
    /// Fields that were dropped.
    pub warnings: Vec<FieldWarning>,
    bean: &'static str,
}

impl Encoded {
    /// Whether every field was encoded.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Fail if any field was dropped.
    pub fn require_clean(self) -> CodecResult<Self> {
        if self.is_clean() {
            Ok(self)
        } else {
            Err(CodecError::Field {
                bean: self.bean,
                warnings: self.warnings,
            })
        }
    }

    /// Return the document, failing if any field was dropped.
    pub fn into_strict(self) -> CodecResult<Document> {
        self.require_clean().map(|encoded| encoded.document)
    }

    /// Return the document, discarding warnings.
    pub fn into_document(self) -> Document {
        self.document
    }
}

/// The result of decoding a bean.
pub struct Decoded<T> {
    /// The decoded value; failed fields hold their defaults.
    pub value: T,
    /// Fields that were left at their defaults because they failed.
    pub warnings: Vec<FieldWarning>,
    bean: &'static str,
}

impl<T> Decoded<T> {
    /// Whether every present field was decoded.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Fail if any field failed.
    pub fn require_clean(self) -> CodecResult<Self> {
        if self.is_clean() {
            Ok(self)
        } else {
            Err(CodecError::Field {
                bean: self.bean,
                warnings: self.warnings,
            })
        }
    }

    /// Return the value, failing if any field failed.
    pub fn into_strict(self) -> CodecResult<T> {
        self.require_clean().map(|decoded| decoded.value)
    }

    /// Return the value, discarding warnings.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Transform the value, keeping the warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        Decoded {
            value: f(self.value),
            warnings: self.warnings,
            bean: self.bean,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Decoded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoded")
            .field("value", &self.value)
            .field("warnings", &self.warnings)
            .finish()
    }
}

/// Encode a bean into a document.
pub fn encode<T: Bean>(value: &T) -> Encoded {
    let mut ctx = MappingContext::new();
    let document = encode_fields(value, &mut ctx);
    Encoded {
        document,
        warnings: ctx.into_warnings(),
        bean: T::schema().type_name(),
    }
}

/// Decode a document into a fresh bean.
pub fn decode<T: Bean>(document: Document) -> Decoded<T> {
    let mut ctx = MappingContext::new();
    let value = decode_fields(document, &mut ctx);
    Decoded {
        value,
        warnings: ctx.into_warnings(),
        bean: T::schema().type_name(),
    }
}

/// Decode any BSON value into a bean, failing if it is not a document.
pub fn decode_bson<T: Bean>(value: Bson) -> CodecResult<Decoded<T>> {
    match value {
        Bson::Document(document) => Ok(decode(document)),
        other => Err(CodecError::NotADocument {
            bean: T::schema().type_name(),
            found: other.element_type(),
        }),
    }
}

pub(crate) fn encode_fields<T: Bean>(value: &T, ctx: &mut MappingContext) -> Document {
    let schema = T::schema();
    let mut document = Document::new();

    for field in schema.mapped_fields() {
        if field.is_identifier() {
            continue;
        }
        let Some(read) = field.reader() else {
            continue;
        };

        ctx.push_field(field.storage_name());
        match read(value, ctx) {
            Ok(bson) => {
                document.insert(field.storage_name(), bson);
            }
            Err(error) => ctx.record(schema.type_name(), error),
        }
        ctx.pop();
    }

    document
}

pub(crate) fn decode_fields<T: Bean>(mut document: Document, ctx: &mut MappingContext) -> T {
    let schema = T::schema();
    let mut value = T::default();

    for field in schema.mapped_fields() {
        let Some(write) = field.writer() else {
            continue;
        };
        let stored = match document.remove(field.storage_name()) {
            None | Some(Bson::Null) => continue,
            Some(stored) => stored,
        };

        ctx.push_field(field.storage_name());
        let stored = if field.is_identifier() {
            identifier_string(&stored)
                .map(Bson::String)
                .ok_or_else(|| FieldError::UnsupportedIdentifier(stored.element_type()))
        } else {
            Ok(stored)
        };
        if let Err(error) = stored.and_then(|stored| write(&mut value, stored, ctx)) {
            ctx.record(schema.type_name(), error);
        }
        ctx.pop();
    }

    value
}
