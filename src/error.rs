//! Error types for naming, routing, linking, and Swagger derivation.

use std::path::PathBuf;
use thiserror::Error;

/// Convention violations detected while naming, routing, or describing resources.
///
/// These indicate programmer or configuration mistakes, never transient failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConventionError {
    #[error("unknown operation \"{name}\"")]
    UnknownOperation { name: String },

    #[error("operation {operation} requires an object but namespace \"{subject}\" has none")]
    InvalidNamespace { operation: String, subject: String },

    #[error("invalid resource name \"{name}\": {reason}")]
    InvalidName { name: String, reason: String },

    #[error("malformed endpoint \"{endpoint}\": {reason}")]
    MalformedEndpoint { endpoint: String, reason: String },

    #[error("no route registered for endpoint \"{endpoint}\"")]
    RouteNotRegistered { endpoint: String },

    #[error("missing path parameter \"{parameter}\" for endpoint \"{endpoint}\"")]
    MissingPathParameter { endpoint: String, parameter: String },

    #[error("route already registered for endpoint \"{endpoint}\" at {path}")]
    DuplicateRoute { endpoint: String, path: String },

    #[error("invalid path template \"{template}\": {reason}")]
    InvalidPathTemplate { template: String, reason: String },

    #[error("invalid url root \"{url_root}\": {reason}")]
    InvalidUrlRoot { url_root: String, reason: String },

    #[error("unknown schema \"{name}\"")]
    UnknownSchema { name: String },

    #[error("schema \"{name}\" is already registered")]
    DuplicateSchema { name: String },

    #[error("schema \"{schema}\" has no field \"{field}\"")]
    UnknownField { schema: String, field: String },

    #[error("invalid schema \"{schema}\": {reason}")]
    InvalidSchema { schema: String, reason: String },

    #[error("invalid enum mapping for {name}: {reason}")]
    InvalidEnumMapping { name: String, reason: String },
}

impl ConventionError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading a service manifest.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Convention(#[from] ConventionError),
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
            LoadError::Convention(e) => e.exit_code(),
        }
    }
}

/// Errors during payload validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Convention(#[from] ConventionError),

    #[error("invalid definitions: {message}")]
    InvalidDefinitions { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Convention(e) => e.exit_code(),
            ValidateError::InvalidDefinitions { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}
