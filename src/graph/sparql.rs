//! Local SPARQL RDF graph backed by oxigraph.
//!
//! Loads a VIVO export (Turtle, N-Triples, RDF/XML, ...) into an in-memory
//! store and answers the same queries a remote endpoint would. Used for
//! offline runs against a snapshot and as the backing store of the test suite.

use std::path::Path;

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::Term as OxTerm;
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use tracing::debug;

use crate::error::GraphError;

use super::query::{Prefixes, Query};
use super::{GraphClient, GraphResult, QueryRow, Term};

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

/// Local SPARQL-capable RDF store.
pub struct SparqlStore {
    store: Store,
    prefixes: Prefixes,
}

impl SparqlStore {
    /// Create a new in-memory SPARQL store (no persistence).
    pub fn in_memory(prefixes: Prefixes) -> GraphResult<Self> {
        let store = Store::new().map_err(|e| GraphError::Sparql {
            message: format!("failed to create oxigraph store: {e}"),
        })?;
        Ok(Self { store, prefixes })
    }

    /// Load an RDF file, choosing the syntax from its extension.
    ///
    /// Returns the number of quads inserted.
    pub fn load_file(&self, path: &Path) -> GraphResult<usize> {
        let display = path.display().to_string();
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(RdfFormat::from_extension)
            .ok_or_else(|| GraphError::Load {
                path: display.clone(),
                message: "unrecognized RDF file extension".into(),
            })?;
        let file = std::fs::File::open(path).map_err(|e| GraphError::Load {
            path: display.clone(),
            message: e.to_string(),
        })?;
        self.load_reader(format, std::io::BufReader::new(file), &display)
    }

    /// Load RDF text in the given syntax.
    pub fn load_str(&self, format: RdfFormat, data: &str) -> GraphResult<usize> {
        self.load_reader(format, data.as_bytes(), "<inline>")
    }

    fn load_reader(
        &self,
        format: RdfFormat,
        reader: impl std::io::Read,
        origin: &str,
    ) -> GraphResult<usize> {
        let mut count = 0;
        for quad in RdfParser::from_format(format).for_reader(reader) {
            let quad = quad.map_err(|e| GraphError::Load {
                path: origin.to_string(),
                message: e.to_string(),
            })?;
            self.store.insert(&quad).map_err(|e| GraphError::Sparql {
                message: format!("insert failed: {e}"),
            })?;
            count += 1;
        }
        debug!(origin, quads = count, "loaded RDF data");
        Ok(count)
    }

    /// Get the number of quads in the store.
    pub fn quad_count(&self) -> GraphResult<usize> {
        self.store.len().map_err(|e| GraphError::Sparql {
            message: format!("failed to count quads: {e}"),
        })
    }
}

impl GraphClient for SparqlStore {
    fn select(&self, query: &Query) -> GraphResult<Vec<QueryRow>> {
        let sparql = query.render(&self.prefixes);
        debug!(query = query.body(), "local SPARQL select");
        let results = self.store.query(sparql.as_str()).map_err(|e| GraphError::Sparql {
            message: format!("SPARQL query failed: {e}"),
        })?;

        match results {
            QueryResults::Solutions(solutions) => {
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(|e| GraphError::Sparql {
                        message: format!("solution error: {e}"),
                    })?;
                    let row = solution
                        .iter()
                        .filter_map(|(var, term)| {
                            convert_term(term).map(|t| (var.as_str().to_string(), t))
                        })
                        .collect();
                    rows.push(row);
                }
                Ok(rows)
            }
            _ => Err(GraphError::Sparql {
                message: "only SELECT queries are supported".into(),
            }),
        }
    }
}

/// Map an oxigraph term onto the backend-neutral [`Term`].
///
/// Datatypes are dropped for plain and language-tagged strings so that results
/// compare equal to those decoded from SPARQL JSON.
fn convert_term(term: &OxTerm) -> Option<Term> {
    #[allow(unreachable_patterns)]
    match term {
        OxTerm::NamedNode(node) => Some(Term::iri(node.as_str())),
        OxTerm::BlankNode(node) => Some(Term::BlankNode {
            value: node.as_str().to_string(),
        }),
        OxTerm::Literal(literal) => {
            let datatype = literal.datatype().as_str();
            Some(Term::Literal {
                value: literal.value().to_string(),
                datatype: (datatype != XSD_STRING && datatype != RDF_LANG_STRING)
                    .then(|| datatype.to_string()),
                language: literal.language().map(str::to_string),
            })
        }
        // Quoted triples have no meaning in roster lookups.
        _ => None,
    }
}

impl std::fmt::Debug for SparqlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparqlStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EntityRef, Params, QueryTemplate};

    const DATA: &str = r#"
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        @prefix ufVivo: <http://vivo.ufl.edu/ontology/vivo-ufl/> .
        @prefix ex: <http://vivo.example.edu/individual/> .

        ex:dept1 ufVivo:deptID "29010000" ;
            rdfs:label "Medicine"@en .
        ex:dept2 ufVivo:deptID "29020000" .
    "#;

    fn store() -> SparqlStore {
        let store = SparqlStore::in_memory(Prefixes::default()).unwrap();
        store.load_str(RdfFormat::Turtle, DATA).unwrap();
        store
    }

    #[test]
    fn load_counts_quads() {
        let store = store();
        assert_eq!(store.quad_count().unwrap(), 3);
    }

    #[test]
    fn select_with_prefixes_and_params() {
        let store = store();
        let template = QueryTemplate::new("SELECT ?uri WHERE { ?uri ufVivo:deptID {{id}} . }");
        let rows = store
            .select(&template.bind(&Params::new().literal("id", "29010000")).unwrap())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get("uri"),
            Some(&Term::iri("http://vivo.example.edu/individual/dept1"))
        );
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let store = store();
        let template = QueryTemplate::new("SELECT ?uri WHERE { ?uri ufVivo:deptID {{id}} . }");
        let rows = store
            .select(&template.bind(&Params::new().literal("id", "nope")).unwrap())
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn fetch_attribute_keeps_language_tag() {
        let store = store();
        let dept = EntityRef::new("http://vivo.example.edu/individual/dept1");
        let label = store.fetch_attribute(&dept, "rdfs:label").unwrap();
        assert_eq!(
            label,
            Some(Term::Literal {
                value: "Medicine".into(),
                datatype: None,
                language: Some("en".into()),
            })
        );

        let dept2 = EntityRef::new("http://vivo.example.edu/individual/dept2");
        assert_eq!(store.fetch_attribute(&dept2, "rdfs:label").unwrap(), None);
    }

    #[test]
    fn undeclared_prefix_is_a_query_error() {
        let store = store();
        let template = QueryTemplate::new("SELECT ?s WHERE { ?s nope:thing ?o }");
        let result = store.select(&template.bind(&Params::new()).unwrap());
        assert!(matches!(result, Err(GraphError::Sparql { .. })));
    }

    #[test]
    fn probe_succeeds_on_empty_store() {
        let store = SparqlStore::in_memory(Prefixes::default()).unwrap();
        store.probe().unwrap();
    }

    #[test]
    fn load_file_by_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vivo.ttl");
        std::fs::write(&path, DATA).unwrap();
        let store = SparqlStore::in_memory(Prefixes::default()).unwrap();
        assert_eq!(store.load_file(&path).unwrap(), 3);

        let bad = dir.path().join("vivo.unknown");
        std::fs::write(&bad, DATA).unwrap();
        assert!(matches!(store.load_file(&bad), Err(GraphError::Load { .. })));
    }
}
