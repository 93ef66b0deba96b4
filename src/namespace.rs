//! Resource namespaces: the subject (and optional object) operations act on.
//!
//! A namespace plus an operation determines everything else about a route:
//!
//! | Operation | Endpoint | Conventional path |
//! |-----------|----------|-------------------|
//! | `Search` | `foo.search` | `/api/foos` |
//! | `Retrieve` | `foo.retrieve` | `/api/foos/{foo_id}` |
//! | `SearchFor` | `foo.search_for.bar` | `/api/foos/{foo_id}/bars` |
//! | `RetrieveFor` | `foo.retrieve_for.bar` | `/api/foos/{foo_id}/bar` |
//! | `Command` | `foo.command.reindex` | `/api/foos/reindex` |
//! | `Discover` | `foo.discover` | `/api/` |
//!
//! The endpoint identifier encodes the subject, verb, and object only; the
//! path prefix is not part of it. Parsing an endpoint therefore yields a
//! namespace with [`DEFAULT_PREFIX`], so a custom prefix survives a round trip
//! only if it is reapplied with [`Namespace::with_prefix`].

use crate::error::ConventionError;
use crate::naming::{name_for, pluralize};
use crate::operations::{Operation, Scope};
use crate::routing::{append_query, Params, RequestContext, RouteTable};

/// Default path prefix for all conventional paths.
pub const DEFAULT_PREFIX: &str = "/api";

/// Identifies a resource (subject) and an optional related resource (object).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    subject: String,
    object: Option<String>,
    prefix: String,
}

impl Namespace {
    /// Namespace for a subject given by name.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            object: None,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Namespace whose subject name is derived from a Rust type (`Person` → `person`).
    pub fn for_type<T: ?Sized>() -> Self {
        Self::new(name_for::<T>())
    }

    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    pub fn with_object_type<T: ?Sized>(self) -> Self {
        self.with_object(name_for::<T>())
    }

    /// Replace the path prefix. A trailing `/` is dropped; an empty prefix mounts at the root.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn object(&self) -> Option<&str> {
        self.object.as_deref()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The object name, required by relation operations.
    pub(crate) fn require_object(&self, operation: Operation) -> Result<&str, ConventionError> {
        self.object()
            .ok_or_else(|| ConventionError::InvalidNamespace {
                operation: operation.verb().to_string(),
                subject: self.subject.clone(),
            })
    }

    /// Endpoint identifier for an operation: `foo.search` or `foo.search_for.bar`.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::InvalidNamespace` for a relation operation on a
    /// namespace without an object, or `InvalidName` for an empty subject or
    /// object or one containing `.`.
    pub fn endpoint_for(&self, operation: Operation) -> Result<String, ConventionError> {
        check_name(&self.subject)?;
        if operation.implies_relation() {
            let object = self.require_object(operation)?;
            check_name(object)?;
            Ok(format!("{}.{}.{}", self.subject, operation.verb(), object))
        } else {
            Ok(format!("{}.{}", self.subject, operation.verb()))
        }
    }

    /// Parse an endpoint identifier back into its operation and namespace.
    ///
    /// The returned namespace has the default prefix, whatever prefix the
    /// namespace that produced `endpoint` carried.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::MalformedEndpoint` on a wrong token count, an
    /// empty token, an unknown verb, or an object segment that does not match
    /// the operation's relation flag.
    pub fn parse_endpoint(endpoint: &str) -> Result<(Operation, Namespace), ConventionError> {
        let malformed = |reason: String| ConventionError::MalformedEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let tokens: Vec<&str> = endpoint.split('.').collect();
        if !(2..=3).contains(&tokens.len()) {
            return Err(malformed(format!(
                "expected 2 or 3 dot-separated tokens, got {}",
                tokens.len()
            )));
        }
        if tokens.iter().any(|t| t.is_empty()) {
            return Err(malformed("empty token".to_string()));
        }

        let operation = Operation::from_verb(tokens[1])
            .ok_or_else(|| malformed(format!("unknown operation \"{}\"", tokens[1])))?;

        let ns = Namespace::new(tokens[0]);
        match (operation.implies_relation(), tokens.get(2)) {
            (true, Some(object)) => Ok((operation, ns.with_object(*object))),
            (false, None) => Ok((operation, ns)),
            (true, None) => Err(malformed(format!(
                "operation {} requires an object segment",
                operation
            ))),
            (false, Some(_)) => Err(malformed(format!(
                "operation {} does not take an object segment",
                operation
            ))),
        }
    }

    /// Name of the subject's identifier placeholder: `foo_id`.
    pub fn subject_id(&self) -> String {
        format!("{}_id", self.subject)
    }

    /// `{prefix}/{plural subject}`
    pub fn collection_path(&self) -> String {
        format!("{}/{}", self.prefix, pluralize(&self.subject))
    }

    /// `{collection_path}/{{subject}_id}`
    pub fn instance_path(&self) -> String {
        format!("{}/{{{}}}", self.collection_path(), self.subject_id())
    }

    /// `{prefix}/{subject}`, for resources that exist once per service (e.g. health).
    pub fn singleton_path(&self) -> String {
        format!("{}/{}", self.prefix, self.subject)
    }

    /// Path for a relation operation.
    ///
    /// Collection-scoped relations pluralize the object; instance-scoped
    /// relations address a single related object.
    pub fn relation_path(&self, operation: Operation) -> Result<String, ConventionError> {
        let object = self.require_object(operation)?;
        Ok(match (operation, operation.scope()) {
            (Operation::Command | Operation::Query, _) => {
                format!("{}/{}", self.collection_path(), object)
            }
            (_, Scope::Collection) => format!("{}/{}", self.instance_path(), pluralize(object)),
            (_, Scope::Instance) => format!("{}/{}", self.instance_path(), object),
        })
    }

    /// Conventional path template for an operation.
    pub fn path_for(&self, operation: Operation) -> Result<String, ConventionError> {
        if operation == Operation::Discover {
            return Ok(format!("{}/", self.prefix));
        }
        if operation.implies_relation() {
            return self.relation_path(operation);
        }
        Ok(match operation.scope() {
            Scope::Collection => self.collection_path(),
            Scope::Instance => self.instance_path(),
        })
    }

    /// Resolve the operation's registered route into a URL path.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::RouteNotRegistered` if the endpoint has no
    /// route, or `MissingPathParameter` for an unfilled placeholder.
    pub fn url_for(
        &self,
        operation: Operation,
        routes: &RouteTable,
        params: &Params,
    ) -> Result<String, ConventionError> {
        routes.resolve(&self.endpoint_for(operation)?, params)
    }

    /// Resolve into an absolute href on the request's scheme and host.
    pub fn href_for(
        &self,
        operation: Operation,
        ctx: &RequestContext,
        params: &Params,
        qs: Option<&Params>,
    ) -> Result<String, ConventionError> {
        let mut href = ctx.href(&self.url_for(operation, ctx.routes(), params)?);
        if let Some(qs) = qs {
            append_query(&mut href, qs.iter());
        }
        Ok(href)
    }
}

/// Subject and object names are endpoint tokens: non-empty and dot-free.
fn check_name(name: &str) -> Result<(), ConventionError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains('.') {
        "name contains '.'"
    } else {
        return Ok(());
    };
    Err(ConventionError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}
