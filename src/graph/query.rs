//! Parameterized SPARQL templates.
//!
//! Templates carry `{{name}}` placeholders. Values are bound through a typed
//! [`Params`] map and rendered as SPARQL syntax at bind time, so roster data
//! can never change the shape of a query: literals are escaped, IRIs and
//! predicates are validated.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use oxigraph::model::{Literal, NamedNode};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

use super::GraphResult;

static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

static RE_PREFIXED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*:[A-Za-z_][A-Za-z0-9_.-]*$").unwrap());

/// A typed value for a template placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// Rendered as an escaped simple string literal: `"U1"`.
    Literal(String),
    /// Rendered as an IRI reference: `<http://...>`.
    Iri(String),
    /// A predicate: a prefixed name (`rdfs:label`) or `<iri>`, rendered as given.
    Predicate(String),
}

impl Param {
    fn render(&self, name: &str) -> GraphResult<String> {
        match self {
            Param::Literal(value) => Ok(Literal::new_simple_literal(value.as_str()).to_string()),
            Param::Iri(value) => render_iri(name, value),
            Param::Predicate(value) => {
                if let Some(inner) = value.strip_prefix('<').and_then(|v| v.strip_suffix('>')) {
                    render_iri(name, inner)
                } else if RE_PREFIXED_NAME.is_match(value) {
                    Ok(value.clone())
                } else {
                    Err(GraphError::InvalidParam {
                        name: name.to_string(),
                        value: value.clone(),
                        reason: "not a prefixed name or <iri>".into(),
                    })
                }
            }
        }
    }
}

fn render_iri(name: &str, value: &str) -> GraphResult<String> {
    NamedNode::new(value)
        .map(|node| node.to_string())
        .map_err(|e| GraphError::InvalidParam {
            name: name.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Substitution map for a [`QueryTemplate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, Param>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literal(mut self, name: &str, value: impl Into<String>) -> Self {
        self.0.insert(name.to_string(), Param::Literal(value.into()));
        self
    }

    pub fn iri(mut self, name: &str, value: impl Into<String>) -> Self {
        self.0.insert(name.to_string(), Param::Iri(value.into()));
        self
    }

    pub fn predicate(mut self, name: &str, value: impl Into<String>) -> Self {
        self.0.insert(name.to_string(), Param::Predicate(value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.0.get(name)
    }
}

/// A SPARQL query with `{{name}}` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTemplate {
    text: &'static str,
}

impl QueryTemplate {
    pub const fn new(text: &'static str) -> Self {
        Self { text }
    }

    /// Substitute every placeholder, failing on the first unbound or invalid one.
    pub fn bind(&self, params: &Params) -> GraphResult<Query> {
        let mut body = String::with_capacity(self.text.len());
        let mut last = 0;
        for caps in RE_PLACEHOLDER.captures_iter(self.text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let name = &caps[1];
            let param = params.get(name).ok_or_else(|| GraphError::MissingParam {
                name: name.to_string(),
            })?;
            body.push_str(&self.text[last..whole.start()]);
            body.push_str(&param.render(name)?);
            last = whole.end();
        }
        body.push_str(&self.text[last..]);
        Ok(Query { body })
    }
}

/// A fully bound query, still without its `PREFIX` prologue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    body: String,
}

impl Query {
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The complete query text with the given prefixes declared.
    pub fn render(&self, prefixes: &Prefixes) -> String {
        let mut text = prefixes.prologue();
        text.push_str(&self.body);
        text
    }
}

/// Namespace prefixes declared at the top of every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prefixes(BTreeMap<String, String>);

impl Prefixes {
    pub fn empty() -> Self {
        Prefixes(BTreeMap::new())
    }

    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.0.insert(prefix.into(), namespace.into());
    }

    pub fn prologue(&self) -> String {
        self.0
            .iter()
            .map(|(prefix, ns)| format!("PREFIX {prefix}: <{ns}>\n"))
            .collect()
    }
}

impl Default for Prefixes {
    /// The namespaces of the VIVO 1.5 ontology and the University of Florida extension.
    fn default() -> Self {
        let mut prefixes = Prefixes::empty();
        prefixes.insert("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
        prefixes.insert("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
        prefixes.insert("xsd", "http://www.w3.org/2001/XMLSchema#");
        prefixes.insert("foaf", "http://xmlns.com/foaf/0.1/");
        prefixes.insert("obo", "http://purl.obolibrary.org/obo/");
        prefixes.insert("vivo", "http://vivoweb.org/ontology/core#");
        prefixes.insert("ufVivo", "http://vivo.ufl.edu/ontology/vivo-ufl/");
        prefixes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOOKUP: QueryTemplate =
        QueryTemplate::new(r#"SELECT ?uri WHERE { ?uri {{pred}} {{id}} . }"#);

    #[test]
    fn literal_values_are_escaped() {
        let query = LOOKUP
            .bind(
                &Params::new()
                    .predicate("pred", "ufVivo:ufid")
                    .literal("id", "12\" } ?x ?y ?z {"),
            )
            .unwrap();
        assert!(query.body().contains(r#""12\" } ?x ?y ?z {""#));
    }

    #[test]
    fn iri_params_are_validated() {
        let template = QueryTemplate::new("SELECT ?p WHERE { {{s}} ?p ?o }");
        let ok = template
            .bind(&Params::new().iri("s", "http://vivo.ufl.edu/individual/n25562"))
            .unwrap();
        assert!(ok.body().contains("<http://vivo.ufl.edu/individual/n25562>"));

        let bad = template.bind(&Params::new().iri("s", "not an iri> } DROP ALL {"));
        assert!(matches!(bad, Err(GraphError::InvalidParam { .. })));
    }

    #[test]
    fn predicate_accepts_prefixed_and_full_iri() {
        for pred in ["rdfs:label", "<http://www.w3.org/2000/01/rdf-schema#label>"] {
            let q = LOOKUP
                .bind(&Params::new().predicate("pred", pred).literal("id", "1"))
                .unwrap();
            assert!(q.body().contains(pred));
        }
        let bad = LOOKUP.bind(&Params::new().predicate("pred", "?x").literal("id", "1"));
        assert!(matches!(bad, Err(GraphError::InvalidParam { .. })));
    }

    #[test]
    fn unbound_placeholder_is_an_error() {
        let result = LOOKUP.bind(&Params::new().predicate("pred", "rdfs:label"));
        assert!(matches!(result, Err(GraphError::MissingParam { name }) if name == "id"));
    }

    #[test]
    fn render_declares_prefixes() {
        let q = LOOKUP
            .bind(&Params::new().predicate("pred", "ufVivo:deptID").literal("id", "29010000"))
            .unwrap();
        let text = q.render(&Prefixes::default());
        assert!(text.starts_with("PREFIX "));
        assert!(text.contains("PREFIX ufVivo: <http://vivo.ufl.edu/ontology/vivo-ufl/>"));
        assert!(text.ends_with(q.body()));
    }
}
