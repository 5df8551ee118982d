//! Entity resolution: map roster identifiers to canonical graph entities.
//!
//! One lookup query per call, no caching. The identifier is matched exactly as
//! it appears in the roster. When several entities carry the same identifier
//! the first row the store returns wins; no ordering is imposed on it.

use tracing::{debug, warn};

use crate::graph::{EntityRef, GraphClient, Params, QueryTemplate};

use super::Vocabulary;

const LOOKUP_QUERY: QueryTemplate = QueryTemplate::new(
    r#"
    SELECT ?uri
    WHERE {
        ?uri {{predicate}} {{identifier}} .
    }
    "#,
);

/// Resolves unit codes and person identifiers against the graph.
#[derive(Clone, Copy)]
pub struct EntityResolver<'a> {
    graph: &'a dyn GraphClient,
    vocabulary: &'a Vocabulary,
}

impl<'a> EntityResolver<'a> {
    pub fn new(graph: &'a dyn GraphClient, vocabulary: &'a Vocabulary) -> Self {
        Self { graph, vocabulary }
    }

    /// Find the unit whose unit-code literal equals `unit_code`.
    pub fn resolve_unit(&self, unit_code: &str) -> Option<EntityRef> {
        self.resolve("unit", &self.vocabulary.unit_id, unit_code)
    }

    /// Find the person whose identifier literal equals `person_id`.
    pub fn resolve_person(&self, person_id: &str) -> Option<EntityRef> {
        self.resolve("person", &self.vocabulary.person_id, person_id)
    }

    fn resolve(&self, kind: &str, predicate: &str, identifier: &str) -> Option<EntityRef> {
        let params = Params::new()
            .predicate("predicate", predicate)
            .literal("identifier", identifier);
        let query = match LOOKUP_QUERY.bind(&params) {
            Ok(query) => query,
            Err(e) => {
                warn!(kind, identifier, error = %e, "cannot build lookup query");
                return None;
            }
        };

        let rows = match self.graph.select(&query) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(kind, identifier, error = %e, "resolution failed");
                return None;
            }
        };

        let Some(mut first) = rows.into_iter().next() else {
            debug!(kind, identifier, "no matching entity");
            return None;
        };
        let entity = first.remove("uri").and_then(|term| term.into_entity());
        match &entity {
            Some(entity) => debug!(kind, identifier, %entity, "resolved"),
            None => warn!(kind, identifier, "lookup returned a row without an IRI binding"),
        }
        entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::testing::ScriptedGraph;
    use crate::graph::{QueryRow, Term};

    fn uri(iri: &str) -> QueryRow {
        QueryRow::new().with("uri", Term::iri(iri))
    }

    #[test]
    fn first_row_wins() {
        let graph = ScriptedGraph::new().on(
            "deptID",
            vec![uri("http://vivo.example.edu/a"), uri("http://vivo.example.edu/b")],
        );
        let vocab = Vocabulary::default();
        let resolver = EntityResolver::new(&graph, &vocab);
        assert_eq!(
            resolver.resolve_unit("29010000"),
            Some(EntityRef::new("http://vivo.example.edu/a"))
        );
        let seen = graph.queries();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains(r#"ufVivo:deptID "29010000""#));
    }

    #[test]
    fn person_lookup_uses_person_predicate() {
        let graph = ScriptedGraph::new();
        let vocab = Vocabulary::default();
        let resolver = EntityResolver::new(&graph, &vocab);
        assert_eq!(resolver.resolve_person("12345678"), None);
        assert!(graph.queries()[0].contains(r#"ufVivo:ufid "12345678""#));
    }

    #[test]
    fn no_match_is_none() {
        let graph = ScriptedGraph::new();
        let vocab = Vocabulary::default();
        assert_eq!(EntityResolver::new(&graph, &vocab).resolve_unit("U404"), None);
    }

    #[test]
    fn transport_failure_is_none() {
        let graph = ScriptedGraph::new().fail_on("ufid");
        let vocab = Vocabulary::default();
        assert_eq!(EntityResolver::new(&graph, &vocab).resolve_person("1"), None);
    }

    #[test]
    fn malformed_first_row_is_none() {
        let graph = ScriptedGraph::new().on(
            "deptID",
            vec![
                QueryRow::new().with("uri", Term::literal("not an entity")),
                uri("http://vivo.example.edu/b"),
            ],
        );
        let vocab = Vocabulary::default();
        assert_eq!(EntityResolver::new(&graph, &vocab).resolve_unit("U1"), None);

        let graph = ScriptedGraph::new().on("deptID", vec![QueryRow::new()]);
        assert_eq!(EntityResolver::new(&graph, &vocab).resolve_unit("U1"), None);
    }

    #[test]
    fn repeated_calls_query_again() {
        let graph = ScriptedGraph::new();
        let vocab = Vocabulary::default();
        let resolver = EntityResolver::new(&graph, &vocab);
        resolver.resolve_unit("U1");
        resolver.resolve_unit("U1");
        assert_eq!(graph.queries().len(), 2);
    }

    #[test]
    fn identifiers_are_not_normalized() {
        let graph = ScriptedGraph::new();
        let vocab = Vocabulary::default();
        EntityResolver::new(&graph, &vocab).resolve_unit(" u1 ");
        assert!(graph.queries()[0].contains(r#"" u1 ""#));
    }

    #[test]
    fn custom_vocabulary() {
        let graph = ScriptedGraph::new();
        let vocab = Vocabulary {
            unit_id: "<http://example.edu/ontology#code>".into(),
            ..Vocabulary::default()
        };
        EntityResolver::new(&graph, &vocab).resolve_unit("U1");
        assert!(graph.queries()[0].contains(r#"<http://example.edu/ontology#code> "U1""#));
    }
}
