//! Hyperlink representations for resource responses.
//!
//! # Example
//!
//! ```
//! use rest_conventions::{Link, Links};
//! use serde_json::json;
//!
//! let mut links = Links::new();
//! links.insert("self", Link::new("http://localhost/api/foos/1"));
//! links.insert("children", vec![Link::new("a"), Link::new("b")]);
//!
//! assert_eq!(links.to_dict(), json!({
//!     "self": { "href": "http://localhost/api/foos/1" },
//!     "children": [{ "href": "a" }, { "href": "b" }]
//! }));
//! ```

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::ConventionError;
use crate::namespace::Namespace;
use crate::operations::Operation;
use crate::routing::{append_query, Params, RequestContext};

/// A hyperlink. Serializes only the fields that are set, in order `href, type, templated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
}

/// Options for resolving a link against the route table.
#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    /// Render unfilled placeholders literally and mark the link templated.
    pub allow_templates: bool,
    /// Query string appended in insertion order.
    pub qs: Option<Params>,
    pub link_type: Option<String>,
}

impl LinkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_templates(mut self, allow: bool) -> Self {
        self.allow_templates = allow;
        self
    }

    pub fn qs(mut self, qs: Params) -> Self {
        self.qs = Some(qs);
        self
    }

    pub fn link_type(mut self, link_type: impl Into<String>) -> Self {
        self.link_type = Some(link_type.into());
        self
    }
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            link_type: None,
            templated: None,
        }
    }

    pub fn with_type(mut self, link_type: impl Into<String>) -> Self {
        self.link_type = Some(link_type.into());
        self
    }

    pub fn with_templated(mut self, templated: bool) -> Self {
        self.templated = Some(templated);
        self
    }

    /// Link to an operation on a namespace, with every placeholder filled from `params`.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::RouteNotRegistered` if no route is registered
    /// for the endpoint, or `MissingPathParameter` for an unfilled placeholder.
    pub fn for_(
        ctx: &RequestContext,
        operation: Operation,
        ns: &Namespace,
        params: &Params,
    ) -> Result<Self, ConventionError> {
        Self::for_with(ctx, operation, ns, params, &LinkOptions::default())
    }

    /// Link to an operation with explicit options.
    ///
    /// With `allow_templates`, unfilled placeholders are rendered as
    /// `{name}` and the link is marked `templated`.
    pub fn for_with(
        ctx: &RequestContext,
        operation: Operation,
        ns: &Namespace,
        params: &Params,
        options: &LinkOptions,
    ) -> Result<Self, ConventionError> {
        let endpoint = ns.endpoint_for(operation)?;
        let rendered = ctx
            .routes()
            .resolve_template(&endpoint, params, options.allow_templates)?;

        let mut href = ctx.href(&rendered.path);
        if let Some(qs) = &options.qs {
            append_query(&mut href, qs.iter());
        }

        Ok(Self {
            href,
            link_type: options.link_type.clone(),
            templated: rendered.templated.then_some(true),
        })
    }

    /// JSON representation with only the set fields.
    pub fn to_dict(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A single link or an ordered list of links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LinkValue {
    One(Link),
    Many(Vec<Link>),
}

impl From<Link> for LinkValue {
    fn from(link: Link) -> Self {
        LinkValue::One(link)
    }
}

impl From<Vec<Link>> for LinkValue {
    fn from(links: Vec<Link>) -> Self {
        LinkValue::Many(links)
    }
}

/// Ordered mapping from link name to one or more links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    entries: Vec<(String, LinkValue)>,
}

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a link (or links) to `name`. Re-assigning keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<LinkValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&LinkValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LinkValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object in insertion order.
    pub fn to_dict(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl<K: Into<String>, V: Into<LinkValue>> FromIterator<(K, V)> for Links {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut links = Links::new();
        for (name, value) in iter {
            links.insert(name, value);
        }
        links
    }
}

impl Serialize for Links {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RouteTable;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn link_to_dict() {
        assert_eq!(Link::new("href").to_dict(), json!({ "href": "href" }));
    }

    #[test]
    fn typed_link_to_dict() {
        let link = Link::new("href").with_type("type");
        assert_eq!(link.to_dict(), json!({ "href": "href", "type": "type" }));
    }

    #[test]
    fn templated_link_to_dict() {
        let link = Link::new("href").with_templated(true);
        assert_eq!(link.to_dict(), json!({ "href": "href", "templated": true }));
    }

    #[test]
    fn link_field_order() {
        let link = Link::new("href").with_templated(true).with_type("type");
        assert_eq!(
            serde_json::to_string(&link).unwrap(),
            r#"{"href":"href","type":"type","templated":true}"#
        );
    }

    fn context(path: &str, operation: Operation) -> RequestContext {
        let mut routes = RouteTable::new();
        routes
            .register(path, operation, &Namespace::new("foo"))
            .unwrap();
        RequestContext::new(Arc::new(routes), "http://localhost/").unwrap()
    }

    #[test]
    fn link_for_operation() {
        let ctx = context("/api/foo", Operation::Search);
        let link = Link::for_(&ctx, Operation::Search, &Namespace::new("foo"), &Params::new())
            .unwrap();
        assert_eq!(link.href, "http://localhost/api/foo");
        assert_eq!(link.templated, None);
    }

    #[test]
    fn link_for_operation_with_query_string() {
        let ctx = context("/api/foo", Operation::Search);
        let options = LinkOptions::new().qs(Params::from([("bar", "baz")]));
        let link = Link::for_with(
            &ctx,
            Operation::Search,
            &Namespace::new("foo"),
            &Params::new(),
            &options,
        )
        .unwrap();
        assert_eq!(link.href, "http://localhost/api/foo?bar=baz");
    }

    #[test]
    fn link_for_operation_templated() {
        let ctx = context("/api/foo/{foo_id}", Operation::Retrieve);
        let options = LinkOptions::new().allow_templates(true);
        let link = Link::for_with(
            &ctx,
            Operation::Retrieve,
            &Namespace::new("foo"),
            &Params::new(),
            &options,
        )
        .unwrap();
        assert_eq!(link.href, "http://localhost/api/foo/{foo_id}");
        assert_eq!(link.templated, Some(true));
    }

    #[test]
    fn link_for_operation_requires_parameters() {
        let ctx = context("/api/foo/{foo_id}", Operation::Retrieve);
        let err = Link::for_(&ctx, Operation::Retrieve, &Namespace::new("foo"), &Params::new())
            .unwrap_err();
        assert!(matches!(err, ConventionError::MissingPathParameter { .. }));

        let link = Link::for_(
            &ctx,
            Operation::Retrieve,
            &Namespace::new("foo"),
            &Params::from([("foo_id", 42)]),
        )
        .unwrap();
        assert_eq!(link.href, "http://localhost/api/foo/42");
    }

    #[test]
    fn links_empty() {
        assert_eq!(Links::new().to_dict(), json!({}));
    }

    #[test]
    fn links_from_iter() {
        let links: Links = [("foo", Link::new("foo")), ("bar", Link::new("bar"))]
            .into_iter()
            .collect();
        assert_eq!(
            serde_json::to_string(&links).unwrap(),
            r#"{"foo":{"href":"foo"},"bar":{"href":"bar"}}"#
        );
    }

    #[test]
    fn links_list() {
        let mut links = Links::new();
        links.insert("foo", vec![Link::new("bar"), Link::new("baz")]);
        assert_eq!(
            links.to_dict(),
            json!({ "foo": [{ "href": "bar" }, { "href": "baz" }] })
        );
    }

    #[test]
    fn links_reassignment_keeps_position() {
        let mut links = Links::new();
        links.insert("foo", Link::new("foo"));
        links.insert("bar", Link::new("bar"));
        links.insert("foo", Link::new("foo2"));
        let names: Vec<_> = links.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["foo", "bar"]);
        assert_eq!(links.get("foo"), Some(&LinkValue::One(Link::new("foo2"))));
    }
}
