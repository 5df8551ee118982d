//! Knowledge graph access: the read-only query seam used by the enrichment engine.
//!
//! The engine never talks to a concrete store. It goes through [`GraphClient`],
//! which runs a parameterized SPARQL `SELECT` and returns rows of named
//! bindings. Two backends implement it:
//!
//! - **Remote layer** ([`SparqlEndpoint`]): a SPARQL 1.1 protocol endpoint over HTTP (`ureq`)
//! - **Local layer** ([`SparqlStore`]): an `oxigraph` store loaded from RDF files
//!
//! Both backends produce the same [`Term`] data model, so results are
//! interchangeable between them.

pub mod endpoint;
pub mod query;
pub mod sparql;
#[cfg(test)]
pub(crate) mod testing;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

pub use endpoint::SparqlEndpoint;
pub use query::{Param, Params, Prefixes, Query, QueryTemplate};
pub use sparql::SparqlStore;

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Canonical, graph-assigned identifier for a unit or a person (an IRI).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRef(String);

impl EntityRef {
    pub fn new(iri: impl Into<String>) -> Self {
        EntityRef(iri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// A value bound to a query variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Term {
    /// A named node.
    Iri { value: String },
    /// A literal. `datatype` is `None` for plain and language-tagged strings.
    Literal {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    /// A blank node, identified only within one result set.
    BlankNode { value: String },
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri {
            value: value.into(),
        }
    }

    /// A plain string literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// A literal with an explicit datatype IRI.
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// The lexical form: the IRI, literal value, or blank node label.
    pub fn lexical(&self) -> &str {
        match self {
            Term::Iri { value } | Term::Literal { value, .. } | Term::BlankNode { value } => value,
        }
    }

    /// Parse a literal as a non-negative integer count.
    ///
    /// IRIs and blank nodes never parse; neither do negative or fractional values.
    pub fn as_count(&self) -> Option<u64> {
        match self {
            Term::Literal { value, .. } => value.trim().parse().ok(),
            _ => None,
        }
    }

    /// Convert an IRI term into an entity reference.
    pub fn into_entity(self) -> Option<EntityRef> {
        match self {
            Term::Iri { value } => Some(EntityRef(value)),
            _ => None,
        }
    }
}

/// One solution of a `SELECT` query: variable name (without `?`) to bound value.
///
/// Variables left unbound by the query are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryRow(BTreeMap<String, Term>);

impl QueryRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for scripted results in tests.
    pub fn with(mut self, variable: impl Into<String>, term: Term) -> Self {
        self.0.insert(variable.into(), term);
        self
    }

    pub fn insert(&mut self, variable: impl Into<String>, term: Term) {
        self.0.insert(variable.into(), term);
    }

    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.0.get(variable)
    }

    pub fn remove(&mut self, variable: &str) -> Option<Term> {
        self.0.remove(variable)
    }

    /// Lexical value of a binding, if bound.
    pub fn text(&self, variable: &str) -> Option<String> {
        self.get(variable).map(|t| t.lexical().to_string())
    }
}

impl FromIterator<(String, Term)> for QueryRow {
    fn from_iter<I: IntoIterator<Item = (String, Term)>>(iter: I) -> Self {
        QueryRow(iter.into_iter().collect())
    }
}

const ATTRIBUTE_QUERY: QueryTemplate = QueryTemplate::new(
    r#"
    SELECT ?value
    WHERE {
        {{entity}} {{attribute}} ?value .
    }
    LIMIT 1
    "#,
);

const PROBE_QUERY: QueryTemplate = QueryTemplate::new("SELECT ?s WHERE { ?s ?p ?o } LIMIT 1");

/// Read-only access to a knowledge graph.
///
/// Implementations must be shareable across enrichment workers.
pub trait GraphClient: Send + Sync {
    /// Run a SPARQL `SELECT` and return its solutions in the order the store yields them.
    ///
    /// An empty result set is `Ok(vec![])`, not an error.
    fn select(&self, query: &Query) -> GraphResult<Vec<QueryRow>>;

    /// Fetch at most one value of `attribute` (a prefixed name or `<iri>`) on `entity`.
    fn fetch_attribute(&self, entity: &EntityRef, attribute: &str) -> GraphResult<Option<Term>> {
        let query = ATTRIBUTE_QUERY.bind(
            &Params::new()
                .iri("entity", entity.as_str())
                .predicate("attribute", attribute),
        )?;
        let rows = self.select(&query)?;
        Ok(rows.into_iter().next().and_then(|mut row| row.remove("value")))
    }

    /// Issue a trivial query to check that the graph answers at all.
    fn probe(&self) -> GraphResult<()> {
        self.select(&PROBE_QUERY.bind(&Params::new())?)?;
        Ok(())
    }
}

impl<G: GraphClient + ?Sized> GraphClient for &G {
    fn select(&self, query: &Query) -> GraphResult<Vec<QueryRow>> {
        (**self).select(query)
    }

    fn fetch_attribute(&self, entity: &EntityRef, attribute: &str) -> GraphResult<Option<Term>> {
        (**self).fetch_attribute(entity, attribute)
    }

    fn probe(&self) -> GraphResult<()> {
        (**self).probe()
    }
}

impl<G: GraphClient + ?Sized> GraphClient for Box<G> {
    fn select(&self, query: &Query) -> GraphResult<Vec<QueryRow>> {
        (**self).select(query)
    }

    fn fetch_attribute(&self, entity: &EntityRef, attribute: &str) -> GraphResult<Option<Term>> {
        (**self).fetch_attribute(entity, attribute)
    }

    fn probe(&self) -> GraphResult<()> {
        (**self).probe()
    }
}

impl<G: GraphClient + ?Sized> GraphClient for Arc<G> {
    fn select(&self, query: &Query) -> GraphResult<Vec<QueryRow>> {
        (**self).select(query)
    }

    fn fetch_attribute(&self, entity: &EntityRef, attribute: &str) -> GraphResult<Option<Term>> {
        (**self).fetch_attribute(entity, attribute)
    }

    fn probe(&self) -> GraphResult<()> {
        (**self).probe()
    }
}
