//! Resource schema descriptors.
//!
//! A schema is an immutable list of field descriptors. Each field carries two
//! names: the internal name used by application code and the wire name used
//! on the network (and in Swagger). Nested schemas are referenced by name and
//! resolved through a [`SchemaRegistry`], so self-referential schemas need no
//! special construction.
//!
//! # Example
//!
//! ```
//! use rest_conventions::{Field, Schema, SelectedField};
//!
//! let person = Schema::builder("person_schema")
//!     .field(Field::string("firstName").attribute("first_name").required(true))
//!     .field(Field::string("last_name").data_key("lastName").required(true))
//!     .field(Field::email("email"))
//!     .associate("PubsubMessage", [SelectedField::new("email").required(true)])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(person.type_name(), "Person");
//! assert_eq!(person.associated()[0].type_name(), "PersonPubsubMessage");
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConventionError;
use crate::naming::{name_for, to_snake_case, type_name, SCHEMA_SUFFIX};

/// A Rust enum with an explicit, bidirectional wire-string mapping.
pub trait WireEnum: Sized + Copy + PartialEq + 'static {
    /// Every variant.
    fn variants() -> &'static [Self];
    fn to_wire(&self) -> &'static str;
    fn from_wire(value: &str) -> Option<Self>;
}

/// Allowed wire values of an enum field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumSpec {
    pub values: Vec<String>,
}

impl EnumSpec {
    /// Enum values from a fixed list.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::InvalidEnumMapping` for an empty list or a
    /// repeated value.
    pub fn new<I, S>(name: &str, values: I) -> Result<Self, ConventionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = Self {
            values: values.into_iter().map(Into::into).collect(),
        };
        spec.check(name)?;
        Ok(spec)
    }

    /// Enum values from a [`WireEnum`], checking that the mapping is a bijection.
    pub fn of<E: WireEnum>() -> Result<Self, ConventionError> {
        let name = std::any::type_name::<E>();
        let invalid = |reason: String| ConventionError::InvalidEnumMapping {
            name: name.to_string(),
            reason,
        };

        for variant in E::variants() {
            let wire = variant.to_wire();
            if E::from_wire(wire) != Some(*variant) {
                return Err(invalid(format!("\"{}\" does not map back to its variant", wire)));
            }
        }

        Self::new(name, E::variants().iter().map(|v| v.to_wire()))
    }

    fn check(&self, name: &str) -> Result<(), ConventionError> {
        let invalid = |reason: String| ConventionError::InvalidEnumMapping {
            name: name.to_string(),
            reason,
        };

        if self.values.is_empty() {
            return Err(invalid("no values".to_string()));
        }
        let mut seen = HashSet::new();
        for value in &self.values {
            if !seen.insert(value.as_str()) {
                return Err(invalid(format!("value \"{}\" is repeated", value)));
            }
        }
        Ok(())
    }
}

/// Type tag of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Boolean,
    Date,
    DateTime,
    Decimal,
    Dict,
    Email,
    Float,
    Integer,
    Number,
    String,
    Time,
    Url,
    Uuid,
    /// Computed on dump (e.g. `_links`).
    Method,
    Enum(EnumSpec),
    /// Reference to another schema by identifier or type name.
    Nested {
        schema: String,
    },
    List {
        items: Box<FieldType>,
    },
}

impl FieldType {
    pub fn nested(schema: impl Into<String>) -> Self {
        FieldType::Nested {
            schema: schema.into(),
        }
    }

    pub fn list(items: FieldType) -> Self {
        FieldType::List {
            items: Box::new(items),
        }
    }

    /// Names of schemas this type refers to.
    pub fn references(&self) -> Vec<&str> {
        match self {
            FieldType::Nested { schema } => vec![schema.as_str()],
            FieldType::List { items } => items.references(),
            _ => Vec::new(),
        }
    }
}

/// A field descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Internal (attribute) name.
    pub name: String,
    /// External name on the wire; defaults to `name`.
    pub wire_name: String,
    pub field_type: FieldType,
    pub required: bool,
    /// Serialized but never accepted as input.
    pub dump_only: bool,
    pub description: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            wire_name: name.clone(),
            name,
            field_type,
            required: false,
            dump_only: false,
            description: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Email)
    }

    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Uuid)
    }

    pub fn enumeration(name: impl Into<String>, spec: EnumSpec) -> Self {
        Self::new(name, FieldType::Enum(spec))
    }

    pub fn nested(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self::new(name, FieldType::nested(schema))
    }

    pub fn list(name: impl Into<String>, items: FieldType) -> Self {
        Self::new(name, FieldType::list(items))
    }

    /// Set the wire name, keeping the internal name.
    pub fn data_key(mut self, wire_name: impl Into<String>) -> Self {
        self.wire_name = wire_name.into();
        self
    }

    /// Set the internal name, keeping the wire name.
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn dump_only(mut self, dump_only: bool) -> Self {
        self.dump_only = dump_only;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Selects a field for an associated schema, optionally overriding `required`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedField {
    pub name: String,
    pub required: Option<bool>,
}

impl SelectedField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }
}

impl From<&str> for SelectedField {
    fn from(name: &str) -> Self {
        SelectedField::new(name)
    }
}

impl From<String> for SelectedField {
    fn from(name: String) -> Self {
        SelectedField::new(name)
    }
}

/// An immutable resource schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    identifier: String,
    fields: Vec<Field>,
    associated: Vec<Schema>,
}

impl Schema {
    /// Start building a schema identified by a snake_case identifier (`person_schema`).
    pub fn builder(identifier: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            identifier: identifier.into(),
            fields: Vec::new(),
            associations: Vec::new(),
        }
    }

    /// Start building a schema identified by a Rust type's name.
    pub fn builder_for<T: ?Sized>() -> SchemaBuilder {
        Self::builder(name_for::<T>())
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Swagger definition name.
    pub fn type_name(&self) -> String {
        type_name(&self.identifier)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Find a field by internal name, then by wire name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.wire_name == name))
    }

    /// Associated schemas declared on the builder.
    pub fn associated(&self) -> &[Schema] {
        &self.associated
    }

    /// Derive a named schema from a strict subset of this schema's fields.
    ///
    /// The derived type name is this schema's type name followed by `name`
    /// (`Person` + `PubsubMessage`).
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::UnknownField` for a field this schema does not
    /// declare, or `InvalidSchema` for an empty or repeated selection or one
    /// that covers every field.
    pub fn select<I, F>(&self, name: &str, selection: I) -> Result<Schema, ConventionError>
    where
        I: IntoIterator<Item = F>,
        F: Into<SelectedField>,
    {
        let stem = self
            .identifier
            .strip_suffix(SCHEMA_SUFFIX)
            .unwrap_or(&self.identifier);
        let identifier = format!("{}_{}", stem, to_snake_case(name));
        let invalid = |reason: String| ConventionError::InvalidSchema {
            schema: identifier.clone(),
            reason,
        };

        let mut fields: Vec<Field> = Vec::new();
        for selected in selection.into_iter().map(Into::into) {
            let field = self
                .field(&selected.name)
                .ok_or_else(|| ConventionError::UnknownField {
                    schema: self.identifier.clone(),
                    field: selected.name.clone(),
                })?;
            if fields.iter().any(|f| f.name == field.name) {
                return Err(invalid(format!("field \"{}\" selected twice", selected.name)));
            }
            let mut field = field.clone();
            if let Some(required) = selected.required {
                field.required = required;
            }
            fields.push(field);
        }

        if fields.is_empty() {
            return Err(invalid("no fields selected".to_string()));
        }
        if fields.len() == self.fields.len() {
            return Err(invalid("selection covers every field".to_string()));
        }

        Ok(Schema {
            identifier,
            fields,
            associated: Vec::new(),
        })
    }
}

/// Builder for [`Schema`]; validation happens in [`SchemaBuilder::build`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    identifier: String,
    fields: Vec<Field>,
    associations: Vec<(String, Vec<SelectedField>)>,
}

impl SchemaBuilder {
    /// Add a field. A field with the same internal name replaces the earlier one.
    pub fn field(mut self, field: Field) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Inherit every field of `base` (later fields override by internal name).
    pub fn extend(self, base: &Schema) -> Self {
        base.fields
            .iter()
            .cloned()
            .fold(self, |builder, field| builder.field(field))
    }

    /// Declare an associated schema built from a selection of this schema's fields.
    pub fn associate<I, F>(mut self, name: impl Into<String>, selection: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<SelectedField>,
    {
        self.associations
            .push((name.into(), selection.into_iter().map(Into::into).collect()));
        self
    }

    /// Validate and freeze the schema.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::InvalidSchema` for an empty identifier or
    /// clashing wire names, `InvalidEnumMapping` for a bad enum field, and
    /// any error from deriving associated schemas.
    pub fn build(self) -> Result<Schema, ConventionError> {
        let invalid = |reason: String| ConventionError::InvalidSchema {
            schema: self.identifier.clone(),
            reason,
        };

        if self.identifier.is_empty() {
            return Err(invalid("empty identifier".to_string()));
        }

        let mut wire_names = HashSet::new();
        for field in &self.fields {
            if !wire_names.insert(field.wire_name.as_str()) {
                return Err(invalid(format!("wire name \"{}\" is repeated", field.wire_name)));
            }
            check_enums(&field.field_type, &format!("{}.{}", self.identifier, field.name))?;
        }

        let mut schema = Schema {
            identifier: self.identifier.clone(),
            fields: self.fields,
            associated: Vec::new(),
        };

        let mut associated = Vec::with_capacity(self.associations.len());
        for (name, selection) in self.associations {
            let derived = schema.select(&name, selection)?;
            if associated
                .iter()
                .any(|a: &Schema| a.identifier == derived.identifier)
            {
                return Err(invalid(format!("associated schema \"{}\" is repeated", name)));
            }
            associated.push(derived);
        }
        schema.associated = associated;

        Ok(schema)
    }
}

fn check_enums(field_type: &FieldType, name: &str) -> Result<(), ConventionError> {
    match field_type {
        FieldType::Enum(spec) => spec.check(name),
        FieldType::List { items } => check_enums(items, name),
        _ => Ok(()),
    }
}

/// Named schemas, looked up by type name.
///
/// Associated schemas are registered alongside their parent.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<Schema>,
    index: HashMap<String, usize>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema and its associated schemas.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::DuplicateSchema` if any of the type names is
    /// already taken; nothing is registered in that case.
    pub fn register(&mut self, schema: Schema) -> Result<(), ConventionError> {
        let mut incoming: Vec<Schema> = schema.associated.clone();
        incoming.insert(0, schema);

        let mut names = HashSet::new();
        for candidate in &incoming {
            let name = candidate.type_name();
            if self.index.contains_key(&name) || !names.insert(name.clone()) {
                return Err(ConventionError::DuplicateSchema { name });
            }
        }

        for schema in incoming {
            debug!(
                schema = schema.identifier(),
                type_name = %schema.type_name(),
                fields = schema.fields().len(),
                "Registered schema"
            );
            self.index.insert(schema.type_name(), self.schemas.len());
            self.schemas.push(schema);
        }
        Ok(())
    }

    /// Look up by identifier (`person_schema`) or type name (`Person`).
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.index
            .get(&type_name(name))
            .map(|&i| &self.schemas[i])
    }

    pub fn resolve(&self, name: &str) -> Result<&Schema, ConventionError> {
        self.get(name).ok_or_else(|| ConventionError::UnknownSchema {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered schemas in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
