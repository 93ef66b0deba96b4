//! Route registration table and reverse URL resolution.
//!
//! The table maps endpoint identifiers (`foo.search`) to path templates
//! (`/api/foos`) and resolves them back into URLs. It is populated once at
//! startup and read-only afterwards. Rebuilds go through [`SharedRoutes`],
//! which swaps a whole new table in atomically so readers never observe a
//! partially-registered state.
//!
//! Placeholders use the Swagger syntax: `/api/foos/{foo_id}`.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use http::Method;
use tracing::{debug, info};
use url::Url;

use crate::error::ConventionError;
use crate::namespace::Namespace;
use crate::operations::Operation;

/// Ordered name/value pairs used for path placeholders and query strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a value, replacing an existing entry in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl<K: Into<String>, V: ToString, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed path template such as `/api/foos/{foo_id}/bars`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    template: String,
    segments: Vec<Segment>,
}

/// Output of rendering a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPath {
    pub path: String,
    /// True if at least one placeholder was left unfilled.
    pub templated: bool,
}

impl PathTemplate {
    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::InvalidPathTemplate` if the template does not
    /// start with `/`, has unbalanced braces, empty or non-identifier
    /// placeholder names, or repeats a placeholder.
    pub fn parse(template: &str) -> Result<Self, ConventionError> {
        let invalid = |reason: &str| ConventionError::InvalidPathTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        if !template.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(invalid("unclosed '{'"));
                    }
                    if name.is_empty() {
                        return Err(invalid("empty placeholder"));
                    }
                    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                        return Err(invalid(&format!("invalid placeholder name \"{}\"", name)));
                    }
                    let repeated = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Placeholder(n) if *n == name));
                    if repeated {
                        return Err(invalid(&format!("placeholder \"{}\" repeated", name)));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => return Err(invalid("unmatched '}'")),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Placeholder names in path order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Fill placeholders from `params`.
    ///
    /// When `allow_templates` is true, unfilled placeholders are rendered
    /// literally (`{foo_id}`) and the result is marked templated.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::MissingPathParameter` for an unfilled
    /// placeholder when templates are not allowed.
    pub fn render(
        &self,
        endpoint: &str,
        params: &Params,
        allow_templates: bool,
    ) -> Result<RenderedPath, ConventionError> {
        let mut path = String::with_capacity(self.template.len());
        let mut templated = false;

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Placeholder(name) => match params.get(name) {
                    Some(value) => path.push_str(&encode_path_value(value)),
                    None if allow_templates => {
                        templated = true;
                        path.push('{');
                        path.push_str(name);
                        path.push('}');
                    }
                    None => {
                        return Err(ConventionError::MissingPathParameter {
                            endpoint: endpoint.to_string(),
                            parameter: name.clone(),
                        })
                    }
                },
            }
        }

        Ok(RenderedPath { path, templated })
    }
}

/// Percent-encode a single path segment value. Only RFC 3986 unreserved
/// characters pass through.
fn encode_path_value(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Append `pairs` as a query string, using `&` if `url` already has one.
pub(crate) fn append_query<'a>(url: &mut String, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    if query.is_empty() {
        return;
    }
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(&query);
}

/// Documentation attached to a route, consumed by Swagger generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteDocs {
    /// Schema identifier of the request body.
    pub request_schema: Option<String>,
    /// Schema identifier of the success response body.
    pub response_schema: Option<String>,
    pub description: Option<String>,
}

impl RouteDocs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(mut self, schema: impl Into<String>) -> Self {
        self.request_schema = Some(schema.into());
        self
    }

    pub fn response(mut self, schema: impl Into<String>) -> Self {
        self.response_schema = Some(schema.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A registered `(operation, namespace)` pair and its path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub endpoint: String,
    pub operation: Operation,
    pub namespace: Namespace,
    pub path: PathTemplate,
    pub docs: RouteDocs,
}

impl Route {
    pub fn method(&self) -> Method {
        self.operation.method()
    }
}

/// Registration table: one route per endpoint, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `operation` on `namespace` at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::DuplicateRoute` if the endpoint is already
    /// registered, `InvalidPathTemplate` for a bad template, or
    /// `InvalidNamespace` for a relation operation without an object.
    pub fn register(
        &mut self,
        path: &str,
        operation: Operation,
        namespace: &Namespace,
    ) -> Result<&Route, ConventionError> {
        self.register_with(path, operation, namespace, RouteDocs::default())
    }

    /// Register with Swagger documentation attached.
    pub fn register_with(
        &mut self,
        path: &str,
        operation: Operation,
        namespace: &Namespace,
        docs: RouteDocs,
    ) -> Result<&Route, ConventionError> {
        let endpoint = namespace.endpoint_for(operation)?;
        if let Some(&existing) = self.index.get(&endpoint) {
            return Err(ConventionError::DuplicateRoute {
                endpoint,
                path: self.routes[existing].path.as_str().to_string(),
            });
        }

        let path = PathTemplate::parse(path)?;
        debug!(
            endpoint = %endpoint,
            method = %operation.method(),
            path = path.as_str(),
            "Registered route"
        );

        let position = self.routes.len();
        self.index.insert(endpoint.clone(), position);
        self.routes.push(Route {
            endpoint,
            operation,
            namespace: namespace.clone(),
            path,
            docs,
        });
        Ok(&self.routes[position])
    }

    /// Register at the conventional path for the operation.
    pub fn register_conventional(
        &mut self,
        operation: Operation,
        namespace: &Namespace,
    ) -> Result<&Route, ConventionError> {
        let path = namespace.path_for(operation)?;
        self.register(&path, operation, namespace)
    }

    pub fn get(&self, endpoint: &str) -> Option<&Route> {
        self.index.get(endpoint).map(|&i| &self.routes[i])
    }

    /// Look up the route for an `(operation, namespace)` pair.
    pub fn route_for(
        &self,
        operation: Operation,
        namespace: &Namespace,
    ) -> Result<&Route, ConventionError> {
        let endpoint = namespace.endpoint_for(operation)?;
        self.get(&endpoint)
            .ok_or(ConventionError::RouteNotRegistered { endpoint })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolve an endpoint to a URL path.
    ///
    /// Params not consumed by placeholders are appended as a query string.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::RouteNotRegistered` for an unknown endpoint
    /// or `MissingPathParameter` for an unfilled placeholder.
    pub fn resolve(&self, endpoint: &str, params: &Params) -> Result<String, ConventionError> {
        self.resolve_template(endpoint, params, false)
            .map(|rendered| rendered.path)
    }

    /// Resolve an endpoint, optionally leaving unfilled placeholders as URI templates.
    pub fn resolve_template(
        &self,
        endpoint: &str,
        params: &Params,
        allow_templates: bool,
    ) -> Result<RenderedPath, ConventionError> {
        let route = self
            .get(endpoint)
            .ok_or_else(|| ConventionError::RouteNotRegistered {
                endpoint: endpoint.to_string(),
            })?;

        let mut rendered = route.path.render(endpoint, params, allow_templates)?;
        let placeholders: Vec<&str> = route.path.placeholders().collect();
        append_query(
            &mut rendered.path,
            params.iter().filter(|(k, _)| !placeholders.contains(k)),
        );
        Ok(rendered)
    }
}

/// The scheme+host root of the current request plus a route table snapshot.
#[derive(Debug, Clone)]
pub struct RequestContext {
    routes: Arc<RouteTable>,
    url_root: Url,
}

impl RequestContext {
    /// Create a context for a request arriving at `url_root` (e.g. `http://localhost/`).
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::InvalidUrlRoot` unless `url_root` is an
    /// absolute http(s) URL without query or fragment.
    pub fn new(routes: Arc<RouteTable>, url_root: &str) -> Result<Self, ConventionError> {
        let invalid = |reason: String| ConventionError::InvalidUrlRoot {
            url_root: url_root.to_string(),
            reason,
        };

        let parsed = Url::parse(url_root).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", parsed.scheme())));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid("query and fragment are not allowed".to_string()));
        }

        Ok(Self {
            routes,
            url_root: parsed,
        })
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn url_root(&self) -> &str {
        self.url_root.as_str()
    }

    /// Expand a URL path into an absolute href.
    pub fn href(&self, path: &str) -> String {
        format!("{}{}", self.url_root.as_str().trim_end_matches('/'), path)
    }
}

/// Route table handle supporting atomic whole-table replacement.
#[derive(Debug)]
pub struct SharedRoutes {
    inner: ArcSwap<RouteTable>,
}

impl SharedRoutes {
    pub fn new(table: RouteTable) -> Self {
        Self {
            inner: ArcSwap::from_pointee(table),
        }
    }

    /// Current snapshot. Holders keep a consistent view across a rebuild.
    pub fn load(&self) -> Arc<RouteTable> {
        self.inner.load_full()
    }

    /// Replace the whole table, returning the previous one.
    pub fn swap(&self, table: RouteTable) -> Arc<RouteTable> {
        info!(routes_count = table.len(), "Swapping route table");
        self.inner.swap(Arc::new(table))
    }

    /// Request context bound to the current snapshot.
    pub fn request_context(&self, url_root: &str) -> Result<RequestContext, ConventionError> {
        RequestContext::new(self.load(), url_root)
    }
}
