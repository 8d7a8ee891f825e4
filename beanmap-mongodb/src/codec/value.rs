//! Per-kind value conversions used by generated field accessors.
//!
//! Scalars go through serde; nested beans recurse into the codec so that
//! their own field tables, naming rules and warnings apply. Nested helpers
//! take the bean type `N` explicitly and accept the field either as `N` or
//! as `Box<N>`, which is how recursive beans are declared.

use std::borrow::Borrow;

use bson::{Bson, Document};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::context::{FieldError, MappingContext};
use super::{decode_fields, encode_fields};
use crate::schema::Bean;

/// Convert a scalar to BSON. `None` becomes an explicit null.
pub fn encode_scalar<V: Serialize + ?Sized>(value: &V) -> Result<Bson, FieldError> {
    Ok(bson::to_bson(value)?)
}

/// Convert a stored BSON value to a scalar.
pub fn decode_scalar<V: DeserializeOwned>(value: Bson) -> Result<V, FieldError> {
    Ok(bson::from_bson(value)?)
}

/// Encode a nested bean as a sub-document.
///
/// `B` is the field's declared type: the bean itself or a `Box` of it.
pub fn encode_object<N: Bean, B: Borrow<N>>(
    value: &B,
    ctx: &mut MappingContext,
) -> Result<Bson, FieldError> {
    Ok(Bson::Document(encode_fields(value.borrow(), ctx)))
}

/// Encode an optional nested bean; `None` becomes an explicit null.
pub fn encode_optional_object<N: Bean, B: Borrow<N>>(
    value: &Option<B>,
    ctx: &mut MappingContext,
) -> Result<Bson, FieldError> {
    match value {
        Some(inner) => encode_object::<N, B>(inner, ctx),
        None => Ok(Bson::Null),
    }
}

/// Encode a list of nested beans as an array of sub-documents, in order.
pub fn encode_list<N: Bean, B: Borrow<N>>(
    values: &[B],
    ctx: &mut MappingContext,
) -> Result<Bson, FieldError> {
    let mut array = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        ctx.push_index(index);
        array.push(Bson::Document(encode_fields(value.borrow(), ctx)));
        ctx.pop();
    }
    Ok(Bson::Array(array))
}

/// Encode an optional list of nested beans; `None` becomes an explicit null.
pub fn encode_optional_list<N: Bean, B: Borrow<N>>(
    values: &Option<Vec<B>>,
    ctx: &mut MappingContext,
) -> Result<Bson, FieldError> {
    match values {
        Some(inner) => encode_list::<N, B>(inner, ctx),
        None => Ok(Bson::Null),
    }
}

/// Decode a sub-document into a fresh nested bean.
pub fn decode_object<N: Bean, B: From<N>>(
    value: Bson,
    ctx: &mut MappingContext,
) -> Result<B, FieldError> {
    let document = expect_document(value)?;
    Ok(B::from(decode_fields::<N>(document, ctx)))
}

/// Decode an optional sub-document.
pub fn decode_optional_object<N: Bean, B: From<N>>(
    value: Bson,
    ctx: &mut MappingContext,
) -> Result<Option<B>, FieldError> {
    match value {
        Bson::Null => Ok(None),
        other => decode_object::<N, B>(other, ctx).map(Some),
    }
}

/// Decode an array of sub-documents, preserving order.
///
/// A non-document element fails the whole field.
pub fn decode_list<N: Bean, B: From<N>>(
    value: Bson,
    ctx: &mut MappingContext,
) -> Result<Vec<B>, FieldError> {
    let items = match value {
        Bson::Array(items) => items,
        other => return Err(FieldError::type_mismatch("array", other.element_type())),
    };

    let mut decoded = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        ctx.push_index(index);
        let element = expect_document(item).map(|doc| B::from(decode_fields::<N>(doc, ctx)));
        ctx.pop();
        decoded.push(element?);
    }
    Ok(decoded)
}

/// Decode an optional array of sub-documents.
pub fn decode_optional_list<N: Bean, B: From<N>>(
    value: Bson,
    ctx: &mut MappingContext,
) -> Result<Option<Vec<B>>, FieldError> {
    match value {
        Bson::Null => Ok(None),
        other => decode_list::<N, B>(other, ctx).map(Some),
    }
}

fn expect_document(value: Bson) -> Result<Document, FieldError> {
    match value {
        Bson::Document(doc) => Ok(doc),
        other => Err(FieldError::type_mismatch("document", other.element_type())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::spec::ElementType;

    #[test]
    fn test_scalar_round_trip() {
        assert_eq!(encode_scalar("sku-1").unwrap(), Bson::String("sku-1".into()));
        assert_eq!(encode_scalar(&Option::<i32>::None).unwrap(), Bson::Null);

        let qty: i32 = decode_scalar(Bson::Int64(2)).unwrap();
        assert_eq!(qty, 2);

        let tags: Vec<String> =
            decode_scalar(Bson::Array(vec![Bson::String("a".into())])).unwrap();
        assert_eq!(tags, vec!["a".to_string()]);
    }

    #[test]
    fn test_scalar_type_mismatch() {
        let result: Result<i32, _> = decode_scalar(Bson::String("two".into()));
        assert!(matches!(result, Err(FieldError::Deserialize(_))));
    }

    #[test]
    fn test_expect_document() {
        let err = expect_document(Bson::Int32(1)).unwrap_err();
        assert!(matches!(
            err,
            FieldError::TypeMismatch {
                expected: "document",
                found: ElementType::Int32
            }
        ));
    }
}
