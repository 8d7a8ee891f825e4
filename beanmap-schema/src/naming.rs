//! Field name to storage name resolution.
//!
//! A field's storage name is its explicit override when one is declared,
//! otherwise the field name with every lower-to-upper transition turned into
//! an underscore:
//!
//! ```rust
//! use beanmap_schema::naming::{resolve, storage_name};
//!
//! assert_eq!(storage_name("userName"), "user_name");
//! assert_eq!(storage_name("id"), "id");
//! assert_eq!(resolve("userName", Some("login")), "login");
//! ```
//!
//! Only an uppercase letter whose predecessor is not uppercase gets a
//! separator, so the rest of an uppercase run is copied as is: `URLPath`
//! stays `URLPath` and `userID` becomes `user_iD`. Stored documents depend on
//! this, so it must not change.

/// The reserved storage name of the identifier field.
pub const ID_FIELD: &str = "_id";

/// Resolve the storage name for a field.
///
/// An explicit override always wins, even when it is empty or equal to the
/// computed name.
pub fn resolve(field_name: &str, column_override: Option<&str>) -> String {
    match column_override {
        Some(column) => column.to_string(),
        None => storage_name(field_name),
    }
}

/// Compute the storage name of a field with no override.
pub fn storage_name(field_name: &str) -> String {
    let name = field_name.strip_prefix("r#").unwrap_or(field_name);
    let mut column = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;

    for c in name.chars() {
        match previous {
            Some(before) if c.is_ascii_uppercase() && !before.is_ascii_uppercase() => {
                column.push('_');
                column.push(c.to_ascii_lowercase());
            }
            _ => column.push(c),
        }
        previous = Some(c);
    }

    column
}

/// Check whether a storage name is the reserved identifier.
pub fn is_identifier(storage_name: &str) -> bool {
    storage_name == ID_FIELD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case() {
        assert_eq!(storage_name("userName"), "user_name");
        assert_eq!(storage_name("customerName"), "customer_name");
        assert_eq!(storage_name("createdAtMillis"), "created_at_millis");
    }

    #[test]
    fn test_no_leading_transform() {
        assert_eq!(storage_name("id"), "id");
        assert_eq!(storage_name("Name"), "Name");
    }

    #[test]
    fn test_snake_case_passes_through() {
        assert_eq!(storage_name("customer_name"), "customer_name");
        assert_eq!(storage_name("_id"), "_id");
    }

    #[test]
    fn test_uppercase_runs_are_kept() {
        assert_eq!(storage_name("URLPath"), "URLPath");
        assert_eq!(storage_name("userID"), "user_iD");
        assert_eq!(storage_name("htmlURL"), "html_uRL");
    }

    #[test]
    fn test_digits_are_not_separators() {
        assert_eq!(storage_name("address2Line"), "address2_line");
    }

    #[test]
    fn test_raw_identifier() {
        assert_eq!(storage_name("r#type"), "type");
        assert_eq!(storage_name("r#innerType"), "inner_type");
    }

    #[test]
    fn test_override_wins() {
        assert_eq!(resolve("userName", Some("login")), "login");
        assert_eq!(resolve("userName", Some("user_name")), "user_name");
        assert_eq!(resolve("id", Some("_id")), "_id");
        assert_eq!(resolve("userName", None), "user_name");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("_id"));
        assert!(!is_identifier("id"));
    }
}
