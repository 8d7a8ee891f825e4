//! Implementation of the `#[derive(Bean)]` macro.

use std::collections::HashMap;

use beanmap_schema::{FieldFacts, FieldKind, KindHint, TypeShape, classify_field, naming};
use convert_case::{Case, Casing};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Type};

/// Parse and generate code for the `#[derive(Bean)]` macro.
///
/// `krate` is the path generated code uses to reach the runtime crate.
pub fn derive_bean_impl(input: &DeriveInput, krate: &TokenStream) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Bean derive does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Bean derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Bean derive only supports structs",
            ));
        }
    };

    let struct_attrs = parse_struct_attrs(input)?;
    let field_infos: Vec<FieldInfo> = fields.iter().map(parse_field).collect::<Result<_, _>>()?;
    check_storage_names(&field_infos)?;

    let type_name = name.to_string();
    let collection = match &struct_attrs.collection {
        Some(collection) => quote! { ::core::option::Option::Some(#collection) },
        None => quote! { ::core::option::Option::None },
    };

    let accessors: Vec<_> = field_infos
        .iter()
        .enumerate()
        .filter(|(_, f)| f.mapping.is_some())
        .map(|(index, f)| generate_accessors(name, index, f, krate))
        .collect();

    let descriptors: Vec<_> = field_infos
        .iter()
        .enumerate()
        .map(|(index, f)| generate_descriptor(name, index, f, krate))
        .collect();

    let candidate = if struct_attrs.embedded {
        quote! {
            #krate::discovery::CodecCandidate::embedded(
                ::core::concat!(::core::module_path!(), "::", #type_name),
                ::core::module_path!(),
            )
        }
    } else {
        quote! {
            #krate::discovery::CodecCandidate::codec(
                ::core::concat!(::core::module_path!(), "::", #type_name),
                ::core::module_path!(),
                #krate::BeanCodec::<#name>::factory,
            )
        }
    };

    Ok(quote! {
        impl #krate::Bean for #name {
            fn schema() -> &'static #krate::SchemaDescriptor<Self> {
                static SCHEMA: ::std::sync::OnceLock<#krate::SchemaDescriptor<#name>> =
                    ::std::sync::OnceLock::new();

                #(#accessors)*

                SCHEMA.get_or_init(|| {
                    #krate::SchemaDescriptor::new(
                        #type_name,
                        ::core::module_path!(),
                        #collection,
                        ::std::vec![#(#descriptors),*],
                    )
                })
            }
        }

        const _: () = {
            #krate::inventory::submit! {
                #candidate
            }
        };
    })
}

/// Struct-level attributes parsed from `#[bean(...)]`.
#[derive(Debug, Default)]
struct StructAttrs {
    collection: Option<String>,
    embedded: bool,
}

/// Parse struct-level `#[bean(...)]` attributes.
fn parse_struct_attrs(input: &DeriveInput) -> Result<StructAttrs, syn::Error> {
    let mut attrs = StructAttrs::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("bean") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(syn::Error::new_spanned(value, "collection name must not be empty"));
                }
                attrs.collection = Some(value.value());
            } else if meta.path.is_ident("embedded") {
                attrs.embedded = true;
            } else {
                return Err(meta.error("unknown bean attribute, expected `collection` or `embedded`"));
            }
            Ok(())
        })?;
    }

    if attrs.embedded && attrs.collection.is_some() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "an embedded bean cannot declare a collection",
        ));
    }

    Ok(attrs)
}

/// How a mapped field is read and written.
#[derive(Debug)]
struct Mapping {
    kind: FieldKind,
    nested_type: Option<String>,
    /// The nested bean type, with `Option`, `Vec` and `Box` removed.
    bean_type: Option<Type>,
    nullable: bool,
}

/// Information about a field.
#[derive(Debug)]
struct FieldInfo {
    ident: Ident,
    field_name: String,
    storage_name: String,
    /// `None` for transient fields.
    mapping: Option<Mapping>,
}

/// Parse a field and its `#[bean(...)]` attributes.
fn parse_field(field: &syn::Field) -> Result<FieldInfo, syn::Error> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "Fields must be named"))?;

    let mut column: Option<LitStr> = None;
    let mut is_id = false;
    let mut transient = false;
    let mut hint: Option<KindHint> = None;

    for attr in &field.attrs {
        if !attr.path().is_ident("bean") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                column = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("id") {
                is_id = true;
            } else if meta.path.is_ident("transient") {
                transient = true;
            } else if meta.path.is_ident("nested") || meta.path.is_ident("scalar") {
                let requested = if meta.path.is_ident("nested") {
                    KindHint::Nested
                } else {
                    KindHint::Scalar
                };
                if hint.is_some_and(|h| h != requested) {
                    return Err(meta.error("`nested` and `scalar` are mutually exclusive"));
                }
                hint = Some(requested);
            } else {
                return Err(meta.error(
                    "unknown bean attribute, expected `column`, `id`, `transient`, `nested` or `scalar`",
                ));
            }
            Ok(())
        })?;
    }

    if is_id && column.is_some() {
        return Err(syn::Error::new_spanned(
            &ident,
            "`id` already maps the field to `_id`; remove `column`",
        ));
    }

    let field_name = ident.unraw().to_string();
    let column_override = if is_id {
        Some(beanmap_schema::ID_FIELD.to_string())
    } else {
        column.as_ref().map(LitStr::value)
    };
    let storage_name = naming::resolve(&field_name, column_override.as_deref());

    let shape = TypeShape::parse(&type_source(&field.ty));
    let mapping = classify_field(&FieldFacts {
        storage_name: &storage_name,
        shape: &shape,
        excluded: transient,
        hint,
    })
    .map(|classification| Mapping {
        bean_type: nested_bean_type(&field.ty, classification.kind, classification.nullable),
        kind: classification.kind,
        nested_type: classification.nested_type,
        nullable: classification.nullable,
    });

    Ok(FieldInfo {
        ident,
        field_name,
        storage_name,
        mapping,
    })
}

fn type_source(ty: &Type) -> String {
    quote!(#ty).to_string()
}

/// The single type argument of `ty` if it is `wrapper<T>`.
fn unwrap_generic<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(syn::GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

/// The bean a nested field recurses into.
fn nested_bean_type(ty: &Type, kind: FieldKind, nullable: bool) -> Option<Type> {
    if matches!(kind, FieldKind::Scalar | FieldKind::Identifier) {
        return None;
    }
    let mut ty = ty;
    if nullable {
        ty = unwrap_generic(ty, "Option").unwrap_or(ty);
    }
    if kind == FieldKind::NestedList {
        ty = unwrap_generic(ty, "Vec").unwrap_or(ty);
    }
    ty = unwrap_generic(ty, "Box").unwrap_or(ty);
    Some(ty.clone())
}

fn is_self_type(ty: &Type) -> bool {
    matches!(ty, Type::Path(path) if path.qself.is_none() && path.path.is_ident("Self"))
}

/// Reject storage name collisions and multiple identifiers.
fn check_storage_names(fields: &[FieldInfo]) -> Result<(), syn::Error> {
    let mut seen: HashMap<&str, &Ident> = HashMap::new();
    let mut identifier: Option<&Ident> = None;

    for field in fields.iter().filter(|f| f.mapping.is_some()) {
        if field.storage_name == beanmap_schema::ID_FIELD {
            if let Some(first) = identifier {
                return Err(syn::Error::new_spanned(
                    &field.ident,
                    format!("`{}` is already the identifier field", first),
                ));
            }
            identifier = Some(&field.ident);
            continue;
        }
        if let Some(first) = seen.insert(&field.storage_name, &field.ident) {
            return Err(syn::Error::new_spanned(
                &field.ident,
                format!(
                    "storage name `{}` is already used by field `{}`",
                    field.storage_name, first
                ),
            ));
        }
    }

    Ok(())
}

fn accessor_idents(index: usize, field: &FieldInfo) -> (Ident, Ident) {
    let stem = field.field_name.to_case(Case::Snake);
    (
        format_ident!("__read_{}_{}", index, stem),
        format_ident!("__write_{}_{}", index, stem),
    )
}

/// Generate the read and write functions for a mapped field.
fn generate_accessors(
    name: &Ident,
    index: usize,
    field: &FieldInfo,
    krate: &TokenStream,
) -> TokenStream {
    let Some(mapping) = &field.mapping else {
        return TokenStream::new();
    };
    let ident = &field.ident;
    let (read_fn, write_fn) = accessor_idents(index, field);
    let value = quote!(#krate::codec::value);
    // accessors are free fns, where `Self` is not in scope
    let bean_ty = match &mapping.bean_type {
        Some(ty) if is_self_type(ty) => quote!(#name),
        Some(ty) => quote!(#ty),
        None => TokenStream::new(),
    };

    let (encode, decode) = match (mapping.kind, mapping.nullable) {
        (FieldKind::NestedObject, false) => (
            quote!(#value::encode_object::<#bean_ty, _>(&bean.#ident, ctx)),
            quote!(#value::decode_object::<#bean_ty, _>(value, ctx)),
        ),
        (FieldKind::NestedObject, true) => (
            quote!(#value::encode_optional_object::<#bean_ty, _>(&bean.#ident, ctx)),
            quote!(#value::decode_optional_object::<#bean_ty, _>(value, ctx)),
        ),
        (FieldKind::NestedList, false) => (
            quote!(#value::encode_list::<#bean_ty, _>(&bean.#ident, ctx)),
            quote!(#value::decode_list::<#bean_ty, _>(value, ctx)),
        ),
        (FieldKind::NestedList, true) => (
            quote!(#value::encode_optional_list::<#bean_ty, _>(&bean.#ident, ctx)),
            quote!(#value::decode_optional_list::<#bean_ty, _>(value, ctx)),
        ),
        (FieldKind::Scalar | FieldKind::Identifier, _) => (
            quote!({
                let _ = ctx;
                #value::encode_scalar(&bean.#ident)
            }),
            quote!({
                let _ = ctx;
                #value::decode_scalar(value)
            }),
        ),
    };

    quote! {
        fn #read_fn(
            bean: &#name,
            ctx: &mut #krate::MappingContext,
        ) -> ::core::result::Result<#krate::Bson, #krate::FieldError> {
            #encode
        }

        fn #write_fn(
            bean: &mut #name,
            value: #krate::Bson,
            ctx: &mut #krate::MappingContext,
        ) -> ::core::result::Result<(), #krate::FieldError> {
            bean.#ident = #decode?;
            ::core::result::Result::Ok(())
        }
    }
}

/// Generate the `FieldDescriptor` expression for a field.
fn generate_descriptor(
    name: &Ident,
    index: usize,
    field: &FieldInfo,
    krate: &TokenStream,
) -> TokenStream {
    let field_name = &field.field_name;

    let Some(mapping) = &field.mapping else {
        return quote! { #krate::FieldDescriptor::excluded(#field_name) };
    };

    let storage_name = &field.storage_name;
    let (read_fn, write_fn) = accessor_idents(index, field);
    let kind = match mapping.kind {
        FieldKind::Scalar => quote!(#krate::FieldKind::Scalar),
        FieldKind::NestedObject => quote!(#krate::FieldKind::NestedObject),
        FieldKind::NestedList => quote!(#krate::FieldKind::NestedList),
        FieldKind::Identifier => quote!(#krate::FieldKind::Identifier),
    };
    let nested = mapping.nested_type.as_ref().map(|nested| {
        let nested = if nested == "Self" { name.to_string() } else { nested.clone() };
        quote! { .with_nested_type(#nested) }
    });

    quote! {
        #krate::FieldDescriptor::new(#field_name, #storage_name, #kind, #read_fn, #write_fn) #nested
    }
}
