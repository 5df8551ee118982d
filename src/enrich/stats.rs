//! Per-unit headcounts, computed by the graph in a single grouped query.

use tracing::{debug, warn};

use crate::graph::{EntityRef, GraphClient, Params, QueryRow, QueryTemplate};

use super::{UnitStatistics, Vocabulary};

// One branch per statistic. Each person is counted at most once per statistic;
// a unit with no matches in any branch yields no group and therefore no row.
const UNIT_STATISTICS_QUERY: QueryTemplate = QueryTemplate::new(
    r#"
    SELECT ?unit
        (COUNT(DISTINCT ?faculty) AS ?faculty_count)
        (COUNT(DISTINCT ?predoc) AS ?predoc_count)
        (COUNT(DISTINCT ?postdoc) AS ?postdoc_count)
        (COUNT(DISTINCT ?predoc_pi) AS ?predoc_supported)
        (COUNT(DISTINCT ?postdoc_pi) AS ?postdoc_supported)
    WHERE {
        VALUES ?unit { {{unit}} }
        {
            ?faculty {{home_unit}} ?unit .
            ?faculty a vivo:FacultyMember .
        }
        UNION
        {
            ?predoc {{home_unit}} ?unit .
            ?predoc a vivo:GraduateStudent .
        }
        UNION
        {
            ?postdoc {{home_unit}} ?unit .
            ?postdoc a vivo:Postdoc .
        }
        UNION
        {
            ?predoc_pi {{home_unit}} ?unit .
            ?predoc_pi a vivo:GraduateStudent .
            ?predoc_pi vivo:hasPrincipalInvestigatorRole ?predoc_role .
            ?predoc_role vivo:roleIn ?predoc_grant .
            ?predoc_grant a vivo:Grant .
        }
        UNION
        {
            ?postdoc_pi {{home_unit}} ?unit .
            ?postdoc_pi a vivo:Postdoc .
            ?postdoc_pi vivo:hasPrincipalInvestigatorRole ?postdoc_role .
            ?postdoc_role vivo:roleIn ?postdoc_grant .
            ?postdoc_grant a vivo:Grant .
        }
    }
    GROUP BY ?unit
    "#,
);

/// Compute the five headcounts of `unit`.
///
/// An unresolved unit issues no query. A failed query, or a unit the graph has
/// nothing on, leaves every field unset. A field whose binding is missing or
/// is not a non-negative integer is unset on its own.
pub fn aggregate_unit_statistics(
    graph: &dyn GraphClient,
    vocabulary: &Vocabulary,
    unit: Option<&EntityRef>,
) -> UnitStatistics {
    let Some(unit) = unit else {
        return UnitStatistics::default();
    };
    let params = Params::new()
        .iri("unit", unit.as_str())
        .predicate("home_unit", vocabulary.home_unit.as_str());
    let rows = match UNIT_STATISTICS_QUERY
        .bind(&params)
        .and_then(|query| graph.select(&query))
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!(%unit, error = %e, "unit statistics query failed");
            return UnitStatistics::default();
        }
    };

    match rows.first() {
        Some(row) => {
            let statistics = from_row(row);
            debug!(%unit, ?statistics, "unit statistics");
            statistics
        }
        None => {
            debug!(%unit, "graph has no members for unit");
            UnitStatistics::default()
        }
    }
}

fn from_row(row: &QueryRow) -> UnitStatistics {
    let count = |variable: &str| row.get(variable).and_then(|term| term.as_count());
    UnitStatistics {
        faculty_count: count("faculty_count"),
        predoc_count: count("predoc_count"),
        postdoc_count: count("postdoc_count"),
        predoc_supported: count("predoc_supported"),
        postdoc_supported: count("postdoc_supported"),
    }
}
