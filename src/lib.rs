//! REST Conventions
//!
//! Conventions for discoverable REST APIs: semantic operation naming,
//! endpoint identifiers, conventional paths, hyperlinks and Swagger
//! derivation from explicit schema descriptors.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rest_conventions::{Link, LinkOptions, Namespace, Operation, Params, RequestContext, RouteTable};
//!
//! let person = Namespace::new("person");
//! let mut routes = RouteTable::new();
//! routes.register_conventional(Operation::Search, &person).unwrap();
//! routes.register_conventional(Operation::Retrieve, &person).unwrap();
//!
//! assert_eq!(person.endpoint_for(Operation::Retrieve).unwrap(), "person.retrieve");
//!
//! let ctx = RequestContext::new(Arc::new(routes), "http://localhost/").unwrap();
//! let link = Link::for_(&ctx, Operation::Retrieve, &person, &Params::from([("person_id", 42)])).unwrap();
//! assert_eq!(link.href, "http://localhost/api/persons/42");
//!
//! let templated = Link::for_with(
//!     &ctx,
//!     Operation::Retrieve,
//!     &person,
//!     &Params::new(),
//!     &LinkOptions::new().allow_templates(true),
//! )
//! .unwrap();
//! assert_eq!(templated.href, "http://localhost/api/persons/{person_id}");
//! assert_eq!(templated.templated, Some(true));
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Scope | Path |
//! |-----------|--------|-------|------|
//! | `search` | GET | collection | `/api/persons` |
//! | `create` | POST | collection | `/api/persons` |
//! | `retrieve` | GET | instance | `/api/persons/{person_id}` |
//! | `search_for` | GET | collection | `/api/persons/{person_id}/addresses` |
//! | `command` (object `merge`) | POST | collection | `/api/persons/merge` |
//!
//! # Endpoint identifiers
//!
//! `{subject}.{verb}` for plain operations (`person.search`) and
//! `{subject}.{verb}.{object}` for relation operations
//! (`person.search_for.address`). [`Namespace::parse_endpoint`] reverses
//! [`Namespace::endpoint_for`].

mod config;
mod discovery;
mod error;
mod health;
mod linking;
mod linter;
mod loader;
mod manifest;
mod namespace;
mod naming;
mod operations;
mod routing;
mod schema;
mod swagger;
mod validator;

pub use config::ConventionConfig;
pub use discovery::DiscoveryConvention;
pub use error::{ConventionError, LoadError, SchemaError, ValidateError};
pub use health::{CheckError, CheckResult, HealthConvention, HealthReport};
pub use linking::{Link, LinkOptions, LinkValue, Links};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{is_url, load_json, load_manifest, load_manifest_auto, load_manifest_str};
pub use manifest::{
    AssociatedSpec, ConventionKind, FieldSpec, Manifest, RouteSpec, SchemaSpec, SelectionSpec,
    Service,
};
pub use namespace::{Namespace, DEFAULT_PREFIX};
pub use naming::{name_for, operation_name, pluralize, to_snake_case, type_name, SCHEMA_SUFFIX};
pub use operations::{Operation, Scope};
pub use routing::{
    Params, PathTemplate, RenderedPath, RequestContext, Route, RouteDocs, RouteTable,
    SharedRoutes,
};
pub use schema::{
    EnumSpec, Field, FieldType, Schema, SchemaBuilder, SchemaRegistry, SelectedField, WireEnum,
};
pub use swagger::{
    all_definitions, build_definition, build_definitions, build_swagger, definition_ref,
    field_property, type_property, SWAGGER_VERSION,
};
pub use validator::{validate, validate_with_registry};

#[cfg(feature = "remote")]
pub use loader::load_manifest_url;
