//! The closed set of semantic REST operations.

use std::fmt;
use std::str::FromStr;

use http::Method;
use serde::{Deserialize, Serialize};

use crate::error::ConventionError;

/// Whether an operation addresses a whole collection or a single instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Collection,
    Instance,
}

/// A semantic REST action bound to an HTTP method and a scope.
///
/// Relation operations (the `*For` family, plus `Command` and `Query`) carry an
/// object segment in their endpoint identifier: `foo.search_for.bar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Discover,
    // collection operations
    Search,
    Count,
    Create,
    DeleteBatch,
    UpdateBatch,
    CreateCollection,
    SavedSearch,
    Upload,
    // instance operations
    Retrieve,
    Delete,
    Replace,
    Update,
    // relation operations
    CreateFor,
    DeleteFor,
    ReplaceFor,
    RetrieveFor,
    SearchFor,
    UpdateFor,
    UploadFor,
    Command,
    Query,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: &'static [Operation] = &[
        Operation::Discover,
        Operation::Search,
        Operation::Count,
        Operation::Create,
        Operation::DeleteBatch,
        Operation::UpdateBatch,
        Operation::CreateCollection,
        Operation::SavedSearch,
        Operation::Upload,
        Operation::Retrieve,
        Operation::Delete,
        Operation::Replace,
        Operation::Update,
        Operation::CreateFor,
        Operation::DeleteFor,
        Operation::ReplaceFor,
        Operation::RetrieveFor,
        Operation::SearchFor,
        Operation::UpdateFor,
        Operation::UploadFor,
        Operation::Command,
        Operation::Query,
    ];

    /// Canonical lower-snake-case verb, as used in endpoint identifiers.
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Discover => "discover",
            Operation::Search => "search",
            Operation::Count => "count",
            Operation::Create => "create",
            Operation::DeleteBatch => "delete_batch",
            Operation::UpdateBatch => "update_batch",
            Operation::CreateCollection => "create_collection",
            Operation::SavedSearch => "saved_search",
            Operation::Upload => "upload",
            Operation::Retrieve => "retrieve",
            Operation::Delete => "delete",
            Operation::Replace => "replace",
            Operation::Update => "update",
            Operation::CreateFor => "create_for",
            Operation::DeleteFor => "delete_for",
            Operation::ReplaceFor => "replace_for",
            Operation::RetrieveFor => "retrieve_for",
            Operation::SearchFor => "search_for",
            Operation::UpdateFor => "update_for",
            Operation::UploadFor => "upload_for",
            Operation::Command => "command",
            Operation::Query => "query",
        }
    }

    /// HTTP method the operation is served under.
    pub fn method(&self) -> Method {
        match self {
            Operation::Discover
            | Operation::Search
            | Operation::Retrieve
            | Operation::RetrieveFor
            | Operation::SearchFor
            | Operation::Query => Method::GET,
            Operation::Count => Method::HEAD,
            Operation::Create
            | Operation::CreateCollection
            | Operation::SavedSearch
            | Operation::Upload
            | Operation::CreateFor
            | Operation::UploadFor
            | Operation::Command => Method::POST,
            Operation::Replace | Operation::ReplaceFor => Method::PUT,
            Operation::Update | Operation::UpdateBatch | Operation::UpdateFor => Method::PATCH,
            Operation::Delete | Operation::DeleteBatch | Operation::DeleteFor => Method::DELETE,
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Operation::Retrieve
            | Operation::Delete
            | Operation::Replace
            | Operation::Update
            | Operation::DeleteFor
            | Operation::ReplaceFor
            | Operation::RetrieveFor
            | Operation::UpdateFor => Scope::Instance,
            _ => Scope::Collection,
        }
    }

    /// Returns true if the operation addresses a collection rather than an instance.
    pub fn is_collection(&self) -> bool {
        self.scope() == Scope::Collection
    }

    /// Returns true if the endpoint identifier carries an object segment.
    pub fn implies_relation(&self) -> bool {
        matches!(
            self,
            Operation::CreateFor
                | Operation::DeleteFor
                | Operation::ReplaceFor
                | Operation::RetrieveFor
                | Operation::SearchFor
                | Operation::UpdateFor
                | Operation::UploadFor
                | Operation::Command
                | Operation::Query
        )
    }

    /// Status code of a successful response.
    pub fn default_code(&self) -> u16 {
        match self {
            Operation::Create | Operation::CreateFor => 201,
            Operation::Delete | Operation::DeleteBatch | Operation::DeleteFor => 204,
            _ => 200,
        }
    }

    /// Look up an operation by its canonical verb.
    pub fn from_verb(verb: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.verb() == verb)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

impl FromStr for Operation {
    type Err = ConventionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_verb(s).ok_or_else(|| ConventionError::UnknownOperation {
            name: s.to_string(),
        })
    }
}
