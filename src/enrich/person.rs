//! Person facts for the faculty table and biographical sketches.
//!
//! A lookup issues three queries: preferred title, degrees, positions. Each
//! group succeeds or fails on its own, so a timeout on positions still leaves
//! the title and degrees in place.

use tracing::{debug, warn};

use crate::graph::{EntityRef, GraphClient, Params, QueryRow, QueryTemplate};

use super::attribute::{PREFERRED_TITLE, fetch_attribute};
use super::{DegreeRecord, PersonFacts, PositionRecord};

// Most recent first; undated entries sort last.
const DEGREES_QUERY: QueryTemplate = QueryTemplate::new(
    r#"
    SELECT ?degree_name ?institution_name ?major_field ?end_date
    WHERE {
        {{person}} vivo:educationalTraining ?training .
        OPTIONAL {
            ?training vivo:degreeEarned ?degree .
            ?degree vivo:abbreviation ?degree_name .
        }
        OPTIONAL {
            ?training vivo:trainingAtOrganization ?institution .
            ?institution rdfs:label ?institution_name .
        }
        OPTIONAL { ?training vivo:majorField ?major_field . }
        OPTIONAL {
            ?training vivo:dateTimeInterval ?interval .
            ?interval vivo:end ?end .
            ?end vivo:dateTime ?end_date .
        }
    }
    ORDER BY DESC(?end_date) ?degree_name
    "#,
);

const POSITIONS_QUERY: QueryTemplate = QueryTemplate::new(
    r#"
    SELECT ?position_label ?org_name ?start_date ?end_date
    WHERE {
        {{person}} vivo:personInPosition ?position .
        OPTIONAL { ?position rdfs:label ?position_label . }
        OPTIONAL {
            ?position vivo:positionInOrganization ?org .
            ?org rdfs:label ?org_name .
        }
        OPTIONAL {
            ?position vivo:dateTimeInterval ?interval .
            ?interval vivo:start ?start .
            ?start vivo:dateTime ?start_date .
        }
        OPTIONAL {
            ?position vivo:dateTimeInterval ?end_interval .
            ?end_interval vivo:end ?end .
            ?end vivo:dateTime ?end_date .
        }
    }
    ORDER BY DESC(?start_date) ?position_label
    "#,
);

/// Fetch the title, degrees and positions of `person`.
///
/// An unresolved person issues no query and yields `None`. Otherwise each group
/// is `None` when its query failed; a person with no degrees gets `Some(vec![])`.
pub fn fetch_person(graph: &dyn GraphClient, person: Option<&EntityRef>) -> Option<PersonFacts> {
    let person = person?;
    let preferred_title =
        fetch_attribute(graph, Some(person), PREFERRED_TITLE).map(|t| t.lexical().to_string());
    let degrees = fetch_list(graph, person, "degrees", &DEGREES_QUERY, degree_from_row);
    let positions = fetch_list(graph, person, "positions", &POSITIONS_QUERY, position_from_row);
    Some(PersonFacts {
        preferred_title,
        degrees,
        positions,
    })
}

fn fetch_list<T>(
    graph: &dyn GraphClient,
    person: &EntityRef,
    group: &str,
    template: &QueryTemplate,
    convert: fn(&QueryRow) -> T,
) -> Option<Vec<T>> {
    let result = template
        .bind(&Params::new().iri("person", person.as_str()))
        .and_then(|query| graph.select(&query));
    match result {
        Ok(rows) => {
            debug!(%person, group, count = rows.len(), "person facts");
            Some(rows.iter().map(convert).collect())
        }
        Err(e) => {
            warn!(%person, group, error = %e, "person lookup failed");
            None
        }
    }
}

fn degree_from_row(row: &QueryRow) -> DegreeRecord {
    DegreeRecord {
        degree_name: row.text("degree_name"),
        institution_name: row.text("institution_name"),
        major_field: row.text("major_field"),
        end_date: row.text("end_date"),
    }
}

fn position_from_row(row: &QueryRow) -> PositionRecord {
    PositionRecord {
        position_label: row.text("position_label"),
        org_name: row.text("org_name"),
        start_date: row.text("start_date"),
        end_date: row.text("end_date"),
    }
}
