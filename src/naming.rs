//! Naming conventions shared by endpoints, paths, and Swagger definitions.
//!
//! Everything here is a pure string transform. Pluralization is suffix based
//! only; there is no irregular-plural dictionary.

use heck::{ToSnakeCase, ToUpperCamelCase};

use crate::error::ConventionError;
use crate::namespace::Namespace;
use crate::operations::Operation;

/// Suffix stripped from schema identifiers when deriving type names.
pub const SCHEMA_SUFFIX: &str = "_schema";

/// Pluralize a snake_case name.
///
/// | Ending | Rule | Example |
/// |--------|------|---------|
/// | `s`, `x`, `z`, `ch`, `sh` | append `es` | `address` → `addresses` |
/// | consonant + `y` | replace `y` with `ies` | `company` → `companies` |
/// | anything else | append `s` | `bar` → `bars` |
pub fn pluralize(name: &str) -> String {
    if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| name.ends_with(suffix))
    {
        return format!("{}es", name);
    }

    if let Some(stem) = name.strip_suffix('y') {
        let preceded_by_vowel = stem
            .chars()
            .last()
            .map(|c| "aeiou".contains(c))
            .unwrap_or(true);
        if !preceded_by_vowel {
            return format!("{}ies", stem);
        }
    }

    format!("{}s", name)
}

/// Convert a CamelCase identifier to snake_case.
///
/// Acronyms stay together: `HTTPServer` becomes `http_server`.
pub fn to_snake_case(name: &str) -> String {
    name.to_snake_case()
}

/// Resource name for a Rust type: the snake_cased last path segment of its name.
///
/// `my_app::model::NewPerson` becomes `new_person`.
pub fn name_for<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    let last = without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics);
    to_snake_case(last)
}

/// Swagger operation name for an operation on a namespace.
///
/// Subject-only operations are named by their verb (`retrieve`). Relation
/// operations append the pluralized object (`search_for_bars`).
///
/// # Errors
///
/// Returns `ConventionError::InvalidNamespace` for a relation operation on a
/// namespace without an object.
pub fn operation_name(operation: Operation, ns: &Namespace) -> Result<String, ConventionError> {
    if !operation.implies_relation() {
        return Ok(operation.verb().to_string());
    }

    let object = ns.require_object(operation)?;
    Ok(format!("{}_{}", operation.verb(), pluralize(object)))
}

/// Swagger type name for a schema identifier.
///
/// Strips a trailing `_schema`, then UpperCamelCases the rest:
/// `foo_bar_schema` becomes `FooBar`. Names that are already UpperCamelCase
/// (`PersonPubsubMessage`) come back unchanged.
pub fn type_name(identifier: &str) -> String {
    identifier
        .strip_suffix(SCHEMA_SUFFIX)
        .unwrap_or(identifier)
        .to_upper_camel_case()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralize_rules() {
        assert_eq!(pluralize("bar"), "bars");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("wish"), "wishes");
        assert_eq!(pluralize("company"), "companies");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("eye_color"), "eye_colors");
    }

    #[test]
    fn snake_case_conversion() {
        assert_eq!(to_snake_case("Person"), "person");
        assert_eq!(to_snake_case("NewPersonSchema"), "new_person_schema");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("Address2Line"), "address2_line");
    }

    struct NewPerson;

    #[test]
    fn name_for_type() {
        assert_eq!(name_for::<NewPerson>(), "new_person");
        assert_eq!(name_for::<Vec<u8>>(), "vec");
    }

    #[test]
    fn operation_name_retrieve() {
        let ns = Namespace::new("foo");
        assert_eq!(operation_name(Operation::Retrieve, &ns).unwrap(), "retrieve");
    }

    #[test]
    fn operation_name_search_for() {
        let ns = Namespace::new("foo").with_object("bar");
        assert_eq!(
            operation_name(Operation::SearchFor, &ns).unwrap(),
            "search_for_bars"
        );
    }

    #[test]
    fn operation_name_relation_without_object() {
        let ns = Namespace::new("foo");
        assert!(matches!(
            operation_name(Operation::SearchFor, &ns),
            Err(ConventionError::InvalidNamespace { .. })
        ));
    }

    #[test]
    fn type_name_is_camel_case() {
        assert_eq!(type_name("foo_bar"), "FooBar");
    }

    #[test]
    fn type_name_for_schema() {
        assert_eq!(type_name("foo_bar_schema"), "FooBar");
        assert_eq!(type_name("person"), "Person");
    }

    #[test]
    fn type_name_keeps_camel_case_names() {
        assert_eq!(type_name("PersonPubsubMessage"), "PersonPubsubMessage");
        assert_eq!(type_name("Person"), "Person");
        assert_eq!(type_name("person_csv_schema"), "PersonCsv");
    }
}
