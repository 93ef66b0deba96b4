//! Discovery convention: a link document listing every search endpoint.
//!
//! ```json
//! {
//!   "_links": {
//!     "search": [{ "href": "http://localhost/api/persons", "type": "person" }],
//!     "self": { "href": "http://localhost/api/" }
//!   }
//! }
//! ```

use serde_json::{json, Value};

use crate::error::ConventionError;
use crate::linking::{Link, LinkOptions, Links};
use crate::namespace::Namespace;
use crate::operations::Operation;
use crate::routing::{Params, RequestContext, Route, RouteTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConvention {
    namespace: Namespace,
}

impl DiscoveryConvention {
    /// Discovery for the service `name`, mounted under `prefix`.
    pub fn new(name: impl Into<String>, prefix: &str) -> Self {
        Self {
            namespace: Namespace::new(name).with_prefix(prefix),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Register `{name}.discover` at `{prefix}/`.
    pub fn register<'a>(&self, routes: &'a mut RouteTable) -> Result<&'a Route, ConventionError> {
        routes.register_conventional(Operation::Discover, &self.namespace)
    }

    /// Links to every registered search route, plus `self`.
    ///
    /// Search routes with path parameters are rendered as templates.
    pub fn links(&self, ctx: &RequestContext) -> Result<Links, ConventionError> {
        let mut search = Vec::new();
        for route in ctx.routes().iter() {
            if route.operation != Operation::Search {
                continue;
            }
            let options = LinkOptions::new()
                .allow_templates(true)
                .link_type(route.namespace.subject());
            search.push(Link::for_with(
                ctx,
                Operation::Search,
                &route.namespace,
                &Params::new(),
                &options,
            )?);
        }

        let mut links = Links::new();
        links.insert("search", search);
        links.insert(
            "self",
            Link::for_(ctx, Operation::Discover, &self.namespace, &Params::new())?,
        );
        Ok(links)
    }

    /// The discovery response body.
    pub fn document(&self, ctx: &RequestContext) -> Result<Value, ConventionError> {
        Ok(json!({ "_links": self.links(ctx)? }))
    }
}
