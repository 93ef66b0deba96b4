//! Swagger 2.0 derivation from schemas and registered routes.
//!
//! Definitions are keyed by type name and reference each other through
//! `#/definitions/{TypeName}`. Walking follows references by name with a
//! visited set, so recursive schemas terminate.
//!
//! | Field type | Swagger |
//! |------------|---------|
//! | `boolean` | `boolean` |
//! | `integer` | `integer` / `int32` |
//! | `float` | `number` / `float` |
//! | `decimal`, `number` | `number` |
//! | `string`, `time` | `string` |
//! | `email` / `uuid` / `url` / `date` / `date_time` | `string` with format |
//! | `dict`, `method` | `object` |
//! | `enum` | `string` with `enum` |
//! | `nested` | `$ref` |
//! | `list` | `array` with `items` |

use std::collections::{HashSet, VecDeque};

use http::{Method, StatusCode};
use serde_json::{json, Map, Value};

use crate::config::ConventionConfig;
use crate::error::ConventionError;
use crate::naming::{operation_name, type_name};
use crate::routing::{Route, RouteTable};
use crate::schema::{Field, FieldType, Schema, SchemaRegistry};

pub const SWAGGER_VERSION: &str = "2.0";

/// JSON Pointer to a definition.
pub fn definition_ref(name: &str) -> String {
    format!("#/definitions/{}", type_name(name))
}

/// Swagger property for a field type.
pub fn type_property(field_type: &FieldType) -> Value {
    let (kind, format) = match field_type {
        FieldType::Boolean => ("boolean", None),
        FieldType::Integer => ("integer", Some("int32")),
        FieldType::Float => ("number", Some("float")),
        FieldType::Decimal | FieldType::Number => ("number", None),
        FieldType::String | FieldType::Time => ("string", None),
        FieldType::Email => ("string", Some("email")),
        FieldType::Uuid => ("string", Some("uuid")),
        FieldType::Url => ("string", Some("url")),
        FieldType::Date => ("string", Some("date")),
        FieldType::DateTime => ("string", Some("date-time")),
        FieldType::Dict | FieldType::Method => ("object", None),
        FieldType::Enum(spec) => {
            return json!({ "type": "string", "enum": spec.values });
        }
        FieldType::Nested { schema } => {
            return json!({ "$ref": definition_ref(schema) });
        }
        FieldType::List { items } => {
            return json!({ "type": "array", "items": type_property(items) });
        }
    };

    let mut property = Map::new();
    property.insert("type".to_string(), Value::String(kind.to_string()));
    if let Some(format) = format {
        property.insert("format".to_string(), Value::String(format.to_string()));
    }
    Value::Object(property)
}

/// Swagger property for a field, including its metadata.
pub fn field_property(field: &Field) -> Value {
    let mut property = type_property(&field.field_type);
    // $ref siblings are ignored by Swagger 2.0 consumers
    if let Value::Object(map) = &mut property {
        if !map.contains_key("$ref") {
            if let Some(description) = &field.description {
                map.insert("description".to_string(), Value::String(description.clone()));
            }
            if field.dump_only {
                map.insert("readOnly".to_string(), Value::Bool(true));
            }
        }
    }
    property
}

/// Definition for a single schema, properties keyed by wire name.
pub fn build_definition(schema: &Schema) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in schema.fields() {
        properties.insert(field.wire_name.clone(), field_property(field));
        if field.required {
            required.push(Value::String(field.wire_name.clone()));
        }
    }

    let mut definition = Map::new();
    definition.insert("type".to_string(), Value::String("object".to_string()));
    definition.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        definition.insert("required".to_string(), Value::Array(required));
    }
    Value::Object(definition)
}

/// Definitions for `roots` and every schema they reach, in discovery order.
///
/// Associated schemas of each reached schema are included after it.
///
/// # Errors
///
/// Returns `ConventionError::UnknownSchema` for a reference that is not registered.
pub fn build_definitions<'a>(
    registry: &SchemaRegistry,
    roots: impl IntoIterator<Item = &'a str>,
) -> Result<Map<String, Value>, ConventionError> {
    let mut definitions = Map::new();
    let mut visited = HashSet::new();
    let mut queue: VecDeque<String> = roots.into_iter().map(String::from).collect();

    while let Some(name) = queue.pop_front() {
        let schema = registry.resolve(&name)?;
        if !visited.insert(schema.type_name()) {
            continue;
        }

        definitions.insert(schema.type_name(), build_definition(schema));
        for field in schema.fields() {
            queue.extend(field.field_type.references().into_iter().map(String::from));
        }
        for associated in schema.associated() {
            queue.push_back(associated.type_name());
        }
    }

    Ok(definitions)
}

/// Definitions for every registered schema.
pub fn all_definitions(registry: &SchemaRegistry) -> Result<Map<String, Value>, ConventionError> {
    let names: Vec<String> = registry.iter().map(|s| s.type_name()).collect();
    build_definitions(registry, names.iter().map(String::as_str))
}

/// Full Swagger 2.0 document for a set of routes and schemas.
///
/// # Errors
///
/// Returns `ConventionError::UnknownSchema` if a route documents an
/// unregistered schema or a schema references one.
pub fn build_swagger(
    config: &ConventionConfig,
    routes: &RouteTable,
    registry: &SchemaRegistry,
) -> Result<Value, ConventionError> {
    let mut paths = Map::new();

    for route in routes.iter() {
        let operation = build_operation(route, registry)?;
        let path = relative_path(route.path.as_str(), &config.base_path);
        let entry = paths
            .entry(path)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(methods) = entry {
            methods.insert(route.method().as_str().to_lowercase(), operation);
        }
    }

    Ok(json!({
        "swagger": SWAGGER_VERSION,
        "info": {
            "title": config.name,
            "version": config.version,
        },
        "basePath": config.base_path,
        "consumes": ["application/json"],
        "produces": ["application/json"],
        "paths": paths,
        "definitions": all_definitions(registry)?,
    }))
}

fn relative_path(path: &str, base_path: &str) -> String {
    let base_path = base_path.trim_end_matches('/');
    match path.strip_prefix(base_path) {
        Some(rest) if !base_path.is_empty() && (rest.is_empty() || rest.starts_with('/')) => {
            if rest.is_empty() {
                "/".to_string()
            } else {
                rest.to_string()
            }
        }
        _ => path.to_string(),
    }
}

fn build_operation(route: &Route, registry: &SchemaRegistry) -> Result<Value, ConventionError> {
    let mut parameters: Vec<Value> = route
        .path
        .placeholders()
        .map(|name| {
            json!({
                "in": "path",
                "name": name,
                "required": true,
                "type": "string",
            })
        })
        .collect();

    if let Some(request) = &route.docs.request_schema {
        let schema = registry.resolve(request)?;
        if carries_body(&route.method()) {
            parameters.push(json!({
                "in": "body",
                "name": "body",
                "required": true,
                "schema": { "$ref": definition_ref(&schema.type_name()) },
            }));
        } else {
            parameters.extend(query_parameters(schema));
        }
    }

    let code = route.operation.default_code();
    let mut success = Map::new();
    success.insert(
        "description".to_string(),
        Value::String(reason(code).to_string()),
    );
    if let Some(response) = &route.docs.response_schema {
        let schema = registry.resolve(response)?;
        success.insert(
            "schema".to_string(),
            json!({ "$ref": definition_ref(&schema.type_name()) }),
        );
    }

    let mut responses = Map::new();
    responses.insert(code.to_string(), Value::Object(success));
    responses.insert(
        "default".to_string(),
        json!({ "description": "An error occurred" }),
    );

    let mut operation = Map::new();
    operation.insert(
        "operationId".to_string(),
        Value::String(operation_name(route.operation, &route.namespace)?),
    );
    operation.insert("tags".to_string(), json!([route.namespace.subject()]));
    if let Some(description) = &route.docs.description {
        operation.insert("description".to_string(), Value::String(description.clone()));
    }
    operation.insert("parameters".to_string(), Value::Array(parameters));
    operation.insert("responses".to_string(), Value::Object(responses));
    Ok(Value::Object(operation))
}

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Query parameters for a request schema on a bodiless method.
///
/// Nested fields cannot be expressed as query parameters and are skipped.
fn query_parameters(schema: &Schema) -> Vec<Value> {
    schema
        .fields()
        .iter()
        .filter(|field| field.field_type.references().is_empty())
        .filter_map(|field| {
            let Value::Object(property) = type_property(&field.field_type) else {
                return None;
            };
            let mut parameter = Map::new();
            parameter.insert("in".to_string(), Value::String("query".to_string()));
            parameter.insert("name".to_string(), Value::String(field.wire_name.clone()));
            parameter.insert("required".to_string(), Value::Bool(field.required));
            parameter.extend(property);
            Some(Value::Object(parameter))
        })
        .collect()
}

fn reason(code: u16) -> &'static str {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Success")
}
