//! Remote SPARQL 1.1 protocol endpoint.
//!
//! Queries are POSTed as `application/x-www-form-urlencoded` with an `Accept`
//! header of `application/sparql-results+json`. VIVO's query API additionally
//! expects `email` and `password` form fields; they are sent when configured.
//!
//! Uses `ureq` for synchronous HTTP. The agent timeout bounds every call, so a
//! stuck endpoint surfaces as [`GraphError::Transport`] instead of hanging.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::GraphError;

use super::query::{Prefixes, Query};
use super::{GraphClient, GraphResult, QueryRow, Term};

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// Longest error body echoed back in diagnostics.
const MAX_ERROR_PREVIEW: usize = 500;

/// Credentials for endpoints that require them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// HTTP client for a SPARQL query endpoint.
pub struct SparqlEndpoint {
    url: String,
    credentials: Option<Credentials>,
    prefixes: Prefixes,
    http: ureq::Agent,
}

impl SparqlEndpoint {
    pub fn new(url: impl Into<String>, prefixes: Prefixes, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            credentials: None,
            prefixes,
            http: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

impl GraphClient for SparqlEndpoint {
    fn select(&self, query: &Query) -> GraphResult<Vec<QueryRow>> {
        let sparql = query.render(&self.prefixes);
        debug!(endpoint = %self.url, query = query.body(), "remote SPARQL select");

        let mut form: Vec<(&str, &str)> = vec![("query", sparql.as_str())];
        if let Some(creds) = &self.credentials {
            form.push(("email", creds.email.as_str()));
            form.push(("password", creds.password.as_str()));
        }

        let response = match self
            .http
            .post(&self.url)
            .set("Accept", SPARQL_RESULTS_JSON)
            .send_form(&form)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(GraphError::Endpoint {
                    status,
                    message: preview(&body),
                });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(GraphError::Transport {
                    endpoint: self.url.clone(),
                    message: transport.to_string(),
                });
            }
        };

        let body = response.into_string().map_err(|e| GraphError::Transport {
            endpoint: self.url.clone(),
            message: format!("failed to read response body: {e}"),
        })?;
        parse_results(&body)
    }
}

impl std::fmt::Debug for SparqlEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparqlEndpoint")
            .field("url", &self.url)
            .field("authenticated", &self.credentials.is_some())
            .finish()
    }
}

fn preview(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_PREVIEW) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

// ---------------------------------------------------------------------------
// SPARQL 1.1 Query Results JSON
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ResultsDocument {
    results: ResultsBody,
}

#[derive(Deserialize)]
struct ResultsBody {
    bindings: Vec<BTreeMap<String, JsonTerm>>,
}

#[derive(Deserialize)]
struct JsonTerm {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(default)]
    datatype: Option<String>,
    #[serde(default, rename = "xml:lang")]
    lang: Option<String>,
}

impl JsonTerm {
    fn into_term(self) -> Option<Term> {
        match self.kind.as_str() {
            "uri" => Some(Term::Iri { value: self.value }),
            "bnode" => Some(Term::BlankNode { value: self.value }),
            "literal" | "typed-literal" => Some(Term::Literal {
                value: self.value,
                datatype: self
                    .datatype
                    .filter(|dt| dt != XSD_STRING && dt != RDF_LANG_STRING),
                language: self.lang,
            }),
            _ => None,
        }
    }
}

/// Decode a `application/sparql-results+json` document.
///
/// Bindings of an unknown term type are dropped from their row rather than
/// failing the whole result.
pub(crate) fn parse_results(body: &str) -> GraphResult<Vec<QueryRow>> {
    let document: ResultsDocument =
        serde_json::from_str(body).map_err(|e| GraphError::Response {
            message: format!("invalid SPARQL JSON: {e}"),
        })?;
    Ok(document
        .results
        .bindings
        .into_iter()
        .map(|binding| {
            binding
                .into_iter()
                .filter_map(|(var, term)| term.into_term().map(|t| (var, t)))
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_bindings() {
        let body = r#"{
            "head": { "vars": ["uri", "label", "n"] },
            "results": { "bindings": [
                {
                    "uri": { "type": "uri", "value": "http://vivo.ufl.edu/individual/n1" },
                    "label": { "type": "literal", "value": "Medicine", "xml:lang": "en" },
                    "n": { "type": "typed-literal", "value": "4",
                           "datatype": "http://www.w3.org/2001/XMLSchema#integer" }
                },
                { "uri": { "type": "bnode", "value": "b0" } }
            ] }
        }"#;
        let rows = parse_results(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("uri"),
            Some(&Term::iri("http://vivo.ufl.edu/individual/n1"))
        );
        assert_eq!(rows[0].get("n").and_then(Term::as_count), Some(4));
        assert_eq!(
            rows[0].get("label"),
            Some(&Term::Literal {
                value: "Medicine".into(),
                datatype: None,
                language: Some("en".into()),
            })
        );
        assert!(rows[1].get("uri").cloned().and_then(Term::into_entity).is_none());
    }

    #[test]
    fn empty_bindings_are_valid() {
        let body = r#"{ "head": { "vars": ["uri"] }, "results": { "bindings": [] } }"#;
        assert!(parse_results(body).unwrap().is_empty());
    }

    #[test]
    fn unknown_term_types_are_dropped() {
        let body = r#"{ "head": {}, "results": { "bindings": [
            { "a": { "type": "triple", "value": "x" }, "b": { "type": "literal", "value": "y" } }
        ] } }"#;
        let rows = parse_results(body).unwrap();
        assert!(rows[0].get("a").is_none());
        assert_eq!(rows[0].text("b").as_deref(), Some("y"));
    }

    #[test]
    fn html_error_page_is_a_response_error() {
        let result = parse_results("<html><body>Login required</body></html>");
        assert!(matches!(result, Err(GraphError::Response { .. })));
    }

    #[test]
    fn unreachable_endpoint_is_a_transport_error() {
        // Port 9 (discard) on localhost is closed on test machines.
        let endpoint = SparqlEndpoint::new(
            "http://127.0.0.1:9/sparql",
            Prefixes::default(),
            Duration::from_secs(2),
        );
        let result = endpoint.probe();
        assert!(matches!(result, Err(GraphError::Transport { .. })));
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let long = "x".repeat(MAX_ERROR_PREVIEW + 10);
        assert_eq!(preview(&long).len(), MAX_ERROR_PREVIEW + 3);
        assert_eq!(preview("short"), "short");
    }
}
