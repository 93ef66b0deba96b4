//! Payload validation against derived Swagger definitions.

use serde_json::{json, Map, Value};

use crate::error::{ConventionError, SchemaError, ValidateError};
use crate::naming::type_name;
use crate::schema::SchemaRegistry;
use crate::swagger::{build_definitions, definition_ref};

const DRAFT: &str = "http://json-schema.org/draft-07/schema#";

/// Validate a payload against the definition named `name`.
///
/// `name` may be a type name (`Person`) or a schema identifier
/// (`person_schema`). Properties are matched by wire name.
///
/// # Errors
///
/// Returns `ValidateError::Convention` if `name` is not among the
/// definitions, `InvalidDefinitions` if they do not compile, or
/// `ValidateError::Invalid` if the payload doesn't match.
pub fn validate(
    definitions: &Map<String, Value>,
    name: &str,
    payload: &Value,
) -> Result<(), ValidateError> {
    let type_name = type_name(name);
    if !definitions.contains_key(&type_name) {
        return Err(ConventionError::UnknownSchema {
            name: name.to_string(),
        }
        .into());
    }

    let document = json!({
        "$schema": DRAFT,
        "$ref": definition_ref(&type_name),
        "definitions": definitions,
    });
    let validator =
        jsonschema::validator_for(&document).map_err(|e| ValidateError::InvalidDefinitions {
            message: e.to_string(),
        })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(payload)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

/// Validate against a registered schema, deriving only the definitions it reaches.
pub fn validate_with_registry(
    registry: &SchemaRegistry,
    name: &str,
    payload: &Value,
) -> Result<(), ValidateError> {
    let definitions = build_definitions(registry, [name])?;
    validate(&definitions, name, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType, Schema};

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                Schema::builder("recursive_schema")
                    .field(Field::string("name").required(true))
                    .field(Field::list("children", FieldType::nested("recursive_schema")))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                Schema::builder("new_person_schema")
                    .field(Field::string("first_name").data_key("firstName").required(true))
                    .field(Field::integer("age"))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn validate_valid_payload() {
        let payload = json!({ "firstName": "Alice", "age": 30 });
        assert!(validate_with_registry(&registry(), "NewPerson", &payload).is_ok());
    }

    #[test]
    fn validate_missing_required_wire_name() {
        let payload = json!({ "first_name": "Alice" });
        let result = validate_with_registry(&registry(), "new_person_schema", &payload);
        assert!(matches!(result, Err(ValidateError::Invalid { .. })));
    }

    #[test]
    fn validate_wrong_type() {
        let payload = json!({ "firstName": "Alice", "age": "thirty" });
        match validate_with_registry(&registry(), "NewPerson", &payload) {
            Err(ValidateError::Invalid { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].path, "/age");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_recursive_payload() {
        let payload = json!({
            "name": "root",
            "children": [{ "name": "leaf", "children": [] }, { "children": [] }]
        });
        match validate_with_registry(&registry(), "Recursive", &payload) {
            Err(ValidateError::Invalid { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].path, "/children/1");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_unknown_definition() {
        let result = validate(&Map::new(), "Missing", &json!({}));
        assert!(matches!(
            result,
            Err(ValidateError::Convention(ConventionError::UnknownSchema { .. }))
        ));
    }
}
