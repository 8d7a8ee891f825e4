//! Field classification.
//!
//! Decides how the codec treats a field from the shape of its declared type:
//! passed through as a scalar, recursed into as a nested bean, recursed into
//! element by element as a list of nested beans, or handled as the reserved
//! identifier.
//!
//! The rules, in order:
//!
//! 1. excluded fields are never mapped;
//! 2. a field stored under `_id` is the identifier;
//! 3. a `Vec` whose element is a custom type is a nested list;
//! 4. a custom type is a nested object;
//! 5. everything else is a scalar.
//!
//! `Option<T>` is transparent: the field is classified by `T` and marked
//! nullable. `Box<T>` is transparent too, for the field itself and for list
//! elements, so recursive beans (`parent: Option<Box<Category>>`) nest like
//! any other bean. Standard containers are never beans: a `Vec` of options,
//! of vectors or of scalars, and any other collection, is a scalar. Explicit
//! hints (`#[bean(nested)]`, `#[bean(scalar)]`) bypass the custom-type
//! heuristic.

use std::fmt;

use crate::naming::is_identifier;

/// How the codec maps a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Passed through unchanged.
    Scalar,
    /// A single nested bean, encoded as a sub-document.
    NestedObject,
    /// A list of nested beans, encoded as an array of sub-documents.
    NestedList,
    /// The reserved `_id` field: never encoded, stringified on decode.
    Identifier,
}

impl FieldKind {
    /// Get the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::NestedObject => "nested_object",
            Self::NestedList => "nested_list",
            Self::Identifier => "identifier",
        }
    }

    /// Whether the codec recurses into values of this kind.
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::NestedObject | Self::NestedList)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An explicit classification declared on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindHint {
    /// Force scalar passthrough.
    Scalar,
    /// Force recursion into a nested bean (or a `Vec` of them).
    Nested,
}

/// Types that are always passed through as scalars.
const SCALAR_TYPES: &[&str] = &[
    // primitives
    "bool", "char", "str", "String", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16",
    "u32", "u64", "u128", "usize", "f32", "f64",
    // maps and sets
    "HashMap", "BTreeMap", "IndexMap", "HashSet", "BTreeSet", "IndexSet",
    // raw documents
    "Document", "Bson", "RawDocumentBuf", "RawBson", "RawArrayBuf",
    // driver and std value types
    "ObjectId", "DateTime", "Uuid", "Decimal128", "Decimal", "Binary", "Timestamp", "Regex",
    "NaiveDate", "NaiveDateTime", "NaiveTime", "Value", "Duration", "SystemTime",
    // std containers
    "Option", "Vec", "VecDeque", "LinkedList", "BinaryHeap",
    // smart pointers
    "Box", "Arc", "Rc", "Cow",
];

/// A simplified view of a declared type: the last path segment and its
/// generic arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeShape {
    /// Last path segment (`HashMap` for `std::collections::HashMap<K, V>`).
    pub name: String,
    /// Generic type arguments, in order.
    pub args: Vec<TypeShape>,
}

impl TypeShape {
    /// Create a shape with no generic arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Add a generic argument.
    pub fn with_arg(mut self, arg: TypeShape) -> Self {
        self.args.push(arg);
        self
    }

    /// Parse a type as written in source (`Option<Vec<LineItem>>`).
    ///
    /// Whitespace is ignored, so the output of `quote!(#ty).to_string()` is
    /// accepted. References, tuples, arrays and slices keep their full text
    /// as the name and are always scalars.
    pub fn parse(source: &str) -> Self {
        let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();
        Self::parse_compact(&compact)
    }

    fn parse_compact(text: &str) -> Self {
        if text.starts_with(['&', '(', '[', '*']) {
            return Self::new(text);
        }

        let (path, generics) = match text.find('<') {
            Some(open) if text.ends_with('>') => (&text[..open], Some(&text[open + 1..text.len() - 1])),
            _ => (text, None),
        };

        let name = path.rsplit("::").next().unwrap_or(path);
        let args = generics
            .map(|inner| split_top_level(inner).into_iter().map(Self::parse_compact).collect())
            .unwrap_or_default();

        Self {
            name: name.to_string(),
            args,
        }
    }

    /// Whether this is `Option<T>`.
    pub fn is_option(&self) -> bool {
        self.name == "Option" && self.args.len() == 1
    }

    /// Whether this is `Vec<T>`.
    pub fn is_list(&self) -> bool {
        self.name == "Vec" && self.args.len() == 1
    }

    /// Whether this is `Box<T>`.
    pub fn is_box(&self) -> bool {
        self.name == "Box" && self.args.len() == 1
    }

    /// Strip one level of `Box`.
    pub fn peel_box(&self) -> &TypeShape {
        if self.is_box() { &self.args[0] } else { self }
    }

    /// Strip one level of `Option`, returning the inner shape and whether
    /// it was optional.
    pub fn peel_option(&self) -> (&TypeShape, bool) {
        if self.is_option() {
            (&self.args[0], true)
        } else {
            (self, false)
        }
    }

    /// The first generic argument, if any.
    pub fn generic_argument(&self) -> Option<&TypeShape> {
        self.args.first()
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

/// Split generic arguments on commas that are not nested in `<>`, `()` or `[]`.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if start < text.len() {
        parts.push(&text[start..]);
    }

    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Whether a type name denotes a user-defined bean rather than a scalar.
///
/// Anything that is not a primitive, number, string, bool, std container,
/// map, set, raw document, known value type or a non-path type counts as
/// custom.
pub fn is_custom_type(type_name: &str) -> bool {
    let starts_like_path = type_name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    starts_like_path && !SCALAR_TYPES.contains(&type_name)
}

/// Classify a field type from its name and optional generic argument.
///
/// This is the bare type rule set (rules 3 to 5); the identifier and
/// exclusion rules need the field's storage name and attributes, see
/// [`classify_field`].
pub fn classify(type_name: &str, generic_argument: Option<&str>) -> FieldKind {
    if type_name == "Vec" {
        return match generic_argument {
            Some(element) if is_custom_type(element) => FieldKind::NestedList,
            _ => FieldKind::Scalar,
        };
    }

    if is_custom_type(type_name) {
        FieldKind::NestedObject
    } else {
        FieldKind::Scalar
    }
}

/// Everything known about a field before classification.
#[derive(Debug, Clone)]
pub struct FieldFacts<'a> {
    /// Resolved storage name.
    pub storage_name: &'a str,
    /// Declared type.
    pub shape: &'a TypeShape,
    /// Whether the field is marked transient.
    pub excluded: bool,
    /// Explicit classification, if declared.
    pub hint: Option<KindHint>,
}

/// The outcome of classifying a mapped field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// How the codec maps the field.
    pub kind: FieldKind,
    /// The bean type recursed into for nested kinds.
    pub nested_type: Option<String>,
    /// Whether the declared type is `Option<_>`.
    pub nullable: bool,
}

/// Classify a field, applying all rules in order.
///
/// Returns `None` for excluded fields, which are never encoded or decoded.
pub fn classify_field(facts: &FieldFacts<'_>) -> Option<Classification> {
    if facts.excluded {
        return None;
    }

    let (shape, nullable) = facts.shape.peel_option();

    if is_identifier(facts.storage_name) {
        return Some(Classification {
            kind: FieldKind::Identifier,
            nested_type: None,
            nullable,
        });
    }

    // The bean a nested field would recurse into, seen through `Box`
    let target = match shape.generic_argument() {
        Some(element) if shape.is_list() => element.peel_box(),
        _ => shape.peel_box(),
    };

    let kind = match facts.hint {
        Some(KindHint::Scalar) => FieldKind::Scalar,
        Some(KindHint::Nested) if shape.is_list() => FieldKind::NestedList,
        Some(KindHint::Nested) => FieldKind::NestedObject,
        None if shape.is_list() => classify(&shape.name, Some(&target.name)),
        None => classify(&target.name, None),
    };

    let nested_type = match kind {
        FieldKind::NestedList | FieldKind::NestedObject => Some(target.to_string()),
        FieldKind::Scalar | FieldKind::Identifier => None,
    };

    Some(Classification {
        kind,
        nested_type,
        nullable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn facts<'a>(storage_name: &'a str, shape: &'a TypeShape) -> FieldFacts<'a> {
        FieldFacts {
            storage_name,
            shape,
            excluded: false,
            hint: None,
        }
    }

    #[test]
    fn test_parse_simple() {
        assert_eq!(TypeShape::parse("String"), TypeShape::new("String"));
        assert_eq!(
            TypeShape::parse("std::collections::HashMap<String, i32>"),
            TypeShape::new("HashMap")
                .with_arg(TypeShape::new("String"))
                .with_arg(TypeShape::new("i32"))
        );
    }

    #[test]
    fn test_parse_token_stream_spacing() {
        let shape = TypeShape::parse("Option < Vec < LineItem > >");
        assert!(shape.is_option());
        let (inner, nullable) = shape.peel_option();
        assert!(nullable);
        assert!(inner.is_list());
        assert_eq!(inner.args[0].name, "LineItem");
        assert_eq!(shape.to_string(), "Option<Vec<LineItem>>");
    }

    #[test]
    fn test_parse_nested_generic_commas() {
        let shape = TypeShape::parse("HashMap<String, Vec<(u8, u8)>>");
        assert_eq!(shape.args.len(), 2);
        assert_eq!(shape.args[1].name, "Vec");
        assert_eq!(shape.args[1].args[0].name, "(u8,u8)");
    }

    #[test]
    fn test_non_path_types_are_scalar() {
        assert_eq!(classify("[u8;16]", None), FieldKind::Scalar);
        assert_eq!(classify("(i32,i32)", None), FieldKind::Scalar);
        assert_eq!(classify("&'staticstr", None), FieldKind::Scalar);
    }

    #[test]
    fn test_classify_scalars() {
        for name in ["i32", "f64", "String", "bool", "HashMap", "Document", "Bson", "ObjectId"] {
            assert_eq!(classify(name, None), FieldKind::Scalar, "{}", name);
        }
    }

    #[test]
    fn test_classify_custom() {
        assert_eq!(classify("Address", None), FieldKind::NestedObject);
        assert_eq!(classify("Vec", Some("LineItem")), FieldKind::NestedList);
        assert_eq!(classify("Vec", Some("String")), FieldKind::Scalar);
        assert_eq!(classify("Vec", None), FieldKind::Scalar);
    }

    #[test]
    fn test_classify_field_identifier_first() {
        let shape = TypeShape::parse("Option<String>");
        let class = classify_field(&facts("_id", &shape)).unwrap();
        assert_eq!(class.kind, FieldKind::Identifier);
        assert!(class.nullable);

        // identifier wins even over a custom-looking type
        let shape = TypeShape::parse("OrderId");
        let class = classify_field(&facts("_id", &shape)).unwrap();
        assert_eq!(class.kind, FieldKind::Identifier);
    }

    #[test]
    fn test_classify_field_excluded() {
        let shape = TypeShape::parse("Address");
        let mut f = facts("address", &shape);
        f.excluded = true;
        assert_eq!(classify_field(&f), None);
    }

    #[test]
    fn test_classify_field_nested() {
        let shape = TypeShape::parse("Vec<LineItem>");
        let class = classify_field(&facts("items", &shape)).unwrap();
        assert_eq!(
            class,
            Classification {
                kind: FieldKind::NestedList,
                nested_type: Some("LineItem".to_string()),
                nullable: false,
            }
        );

        let shape = TypeShape::parse("Option<Address>");
        let class = classify_field(&facts("address", &shape)).unwrap();
        assert_eq!(class.kind, FieldKind::NestedObject);
        assert_eq!(class.nested_type.as_deref(), Some("Address"));
        assert!(class.nullable);
    }

    #[test]
    fn test_hints_override_heuristic() {
        let shape = TypeShape::parse("Money");
        let mut f = facts("price", &shape);
        f.hint = Some(KindHint::Scalar);
        assert_eq!(classify_field(&f).unwrap().kind, FieldKind::Scalar);

        let shape = TypeShape::parse("Vec<Tag>");
        let mut f = facts("tags", &shape);
        f.hint = Some(KindHint::Nested);
        let class = classify_field(&f).unwrap();
        assert_eq!(class.kind, FieldKind::NestedList);
        assert_eq!(class.nested_type.as_deref(), Some("Tag"));
    }

    #[test]
    fn test_containers_of_scalars_are_scalar() {
        for source in [
            "Vec<Option<String>>",
            "Vec<Vec<i32>>",
            "VecDeque<String>",
            "LinkedList<LineItem>",
            "Option<Vec<Option<i64>>>",
            "BTreeMap<String, Address>",
        ] {
            let shape = TypeShape::parse(source);
            let class = classify_field(&facts("values", &shape)).unwrap();
            assert_eq!(class.kind, FieldKind::Scalar, "{}", source);
            assert_eq!(class.nested_type, None, "{}", source);
        }

        assert_eq!(classify("Vec", Some("Option")), FieldKind::Scalar);
        assert_eq!(classify("VecDeque", Some("String")), FieldKind::Scalar);
        assert!(!is_custom_type("Option"));
    }

    #[test]
    fn test_boxed_beans_are_nested() {
        let shape = TypeShape::parse("Option<Box<Category>>");
        let class = classify_field(&facts("parent", &shape)).unwrap();
        assert_eq!(
            class,
            Classification {
                kind: FieldKind::NestedObject,
                nested_type: Some("Category".to_string()),
                nullable: true,
            }
        );

        let shape = TypeShape::parse("Vec<Box<Category>>");
        let class = classify_field(&facts("children", &shape)).unwrap();
        assert_eq!(class.kind, FieldKind::NestedList);
        assert_eq!(class.nested_type.as_deref(), Some("Category"));

        let shape = TypeShape::parse("Box<Point>");
        let mut f = facts("location", &shape);
        f.hint = Some(KindHint::Nested);
        let class = classify_field(&f).unwrap();
        assert_eq!(class.kind, FieldKind::NestedObject);
        assert_eq!(class.nested_type.as_deref(), Some("Point"));

        // a box of a scalar stays a scalar
        let shape = TypeShape::parse("Box<String>");
        assert_eq!(
            classify_field(&facts("name", &shape)).unwrap().kind,
            FieldKind::Scalar
        );
    }

    #[test]
    fn test_field_kind_display() {
        assert_eq!(FieldKind::NestedList.to_string(), "nested_list");
        assert!(FieldKind::NestedObject.is_nested());
        assert!(!FieldKind::Identifier.is_nested());
    }
}
