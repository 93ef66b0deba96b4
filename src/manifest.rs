//! Declarative service manifests.
//!
//! A manifest describes a service as JSON: its configuration, its schemas and
//! the operations it exposes. Building a manifest yields a [`Service`] holding
//! the schema registry and the route table.
//!
//! ```json
//! {
//!   "service": { "name": "example" },
//!   "conventions": ["health", "discovery"],
//!   "schemas": [{
//!     "name": "person_schema",
//!     "fields": [
//!       { "name": "first_name", "data_key": "firstName", "type": "string", "required": true },
//!       { "name": "addresses", "type": "list", "items": { "type": "nested", "schema": "address_schema" } }
//!     ],
//!     "associated": [{ "name": "PubsubMessage", "fields": ["firstName"] }]
//!   }],
//!   "routes": [
//!     { "operation": "search", "subject": "person", "response_schema": "person_schema" },
//!     { "operation": "search_for", "subject": "person", "object": "address" }
//!   ]
//! }
//! ```
//!
//! Routes without a `path` are registered at the conventional path for their
//! operation under the service's `base_path`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::config::ConventionConfig;
use crate::discovery::DiscoveryConvention;
use crate::error::{ConventionError, ValidateError};
use crate::health::HealthConvention;
use crate::namespace::Namespace;
use crate::operations::Operation;
use crate::routing::{RequestContext, Route, RouteDocs, RouteTable};
use crate::schema::{Field, FieldType, Schema, SchemaRegistry, SelectedField};
use crate::swagger::build_swagger;
use crate::validator::validate_with_registry;

/// Conventions a manifest can switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConventionKind {
    Health,
    Discovery,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub service: ConventionConfig,
    #[serde(default)]
    pub conventions: Vec<ConventionKind>,
    #[serde(default)]
    pub schemas: Vec<SchemaSpec>,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub data_key: Option<String>,
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(flatten)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub dump_only: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn to_field(&self) -> Field {
        let mut field = Field::new(self.name.clone(), self.field_type.clone())
            .required(self.required)
            .dump_only(self.dump_only);
        if let Some(data_key) = &self.data_key {
            field = field.data_key(data_key.clone());
        }
        if let Some(attribute) = &self.attribute {
            field = field.attribute(attribute.clone());
        }
        if let Some(description) = &self.description {
            field = field.description(description.clone());
        }
        field
    }
}

/// A selected field: either a bare name or `{"name", "required"}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SelectionSpec {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        required: Option<bool>,
    },
}

impl From<&SelectionSpec> for SelectedField {
    fn from(spec: &SelectionSpec) -> Self {
        match spec {
            SelectionSpec::Name(name) => SelectedField::new(name.clone()),
            SelectionSpec::Detailed { name, required } => SelectedField {
                name: name.clone(),
                required: *required,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssociatedSpec {
    pub name: String,
    pub fields: Vec<SelectionSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaSpec {
    /// Schema identifier (`person_schema`).
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub associated: Vec<AssociatedSpec>,
}

impl SchemaSpec {
    pub fn to_schema(&self) -> Result<Schema, ConventionError> {
        let builder = self
            .fields
            .iter()
            .fold(Schema::builder(self.name.clone()), |builder, spec| {
                builder.field(spec.to_field())
            });
        self.associated
            .iter()
            .fold(builder, |builder, assoc| {
                builder.associate(assoc.name.clone(), assoc.fields.iter())
            })
            .build()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteSpec {
    pub operation: Operation,
    pub subject: String,
    #[serde(default)]
    pub object: Option<String>,
    /// Path template; defaults to the conventional path.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub request_schema: Option<String>,
    #[serde(default)]
    pub response_schema: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RouteSpec {
    pub fn namespace(&self, prefix: &str) -> Namespace {
        let ns = Namespace::new(self.subject.clone()).with_prefix(prefix);
        match &self.object {
            Some(object) => ns.with_object(object.clone()),
            None => ns,
        }
    }

    /// Path this route registers at under `prefix`.
    pub fn resolved_path(&self, prefix: &str) -> Result<String, ConventionError> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => self.namespace(prefix).path_for(self.operation),
        }
    }

    pub fn docs(&self) -> RouteDocs {
        RouteDocs {
            request_schema: self.request_schema.clone(),
            response_schema: self.response_schema.clone(),
            description: self.description.clone(),
        }
    }

    pub fn register<'a>(
        &self,
        routes: &'a mut RouteTable,
        prefix: &str,
    ) -> Result<&'a Route, ConventionError> {
        let path = self.resolved_path(prefix)?;
        routes.register_with(&path, self.operation, &self.namespace(prefix), self.docs())
    }
}

impl Manifest {
    pub fn schema_registry(&self) -> Result<SchemaRegistry, ConventionError> {
        let mut registry = SchemaRegistry::new();
        for spec in &self.schemas {
            registry.register(spec.to_schema()?)?;
        }
        Ok(registry)
    }

    /// Route table with the enabled conventions registered first.
    pub fn route_table(&self) -> Result<RouteTable, ConventionError> {
        let prefix = self.service.base_path.as_str();
        let mut routes = RouteTable::new();
        for convention in &self.conventions {
            match convention {
                ConventionKind::Health => {
                    HealthConvention::register(&mut routes, prefix)?;
                }
                ConventionKind::Discovery => {
                    self.discovery().register(&mut routes)?;
                }
            }
        }
        for spec in &self.routes {
            spec.register(&mut routes, prefix)?;
        }
        Ok(routes)
    }

    pub fn discovery(&self) -> DiscoveryConvention {
        DiscoveryConvention::new(self.service.name.clone(), &self.service.base_path)
    }

    /// Build the service this manifest describes.
    ///
    /// # Errors
    ///
    /// Returns the first `ConventionError` hit while building schemas or
    /// registering routes.
    pub fn build(&self) -> Result<Service, ConventionError> {
        Ok(Service {
            config: self.service.clone(),
            schemas: self.schema_registry()?,
            routes: Arc::new(self.route_table()?),
        })
    }
}

/// A built service: configuration, schemas and routes.
#[derive(Debug, Clone)]
pub struct Service {
    pub config: ConventionConfig,
    pub schemas: SchemaRegistry,
    pub routes: Arc<RouteTable>,
}

impl Service {
    pub fn swagger(&self) -> Result<Value, ConventionError> {
        build_swagger(&self.config, &self.routes, &self.schemas)
    }

    /// Request context at `url_root`, or at the configured root when `None`.
    pub fn request_context(&self, url_root: Option<&str>) -> Result<RequestContext, ConventionError> {
        RequestContext::new(
            Arc::clone(&self.routes),
            url_root.unwrap_or(&self.config.url_root),
        )
    }

    pub fn validate(&self, schema: &str, payload: &Value) -> Result<(), ValidateError> {
        validate_with_registry(&self.schemas, schema, payload)
    }

    pub fn health(&self) -> HealthConvention {
        HealthConvention::from_config(&self.config)
    }
}
