//! Single-attribute lookup on a resolved entity.

use tracing::{debug, warn};

use crate::graph::{EntityRef, GraphClient, Term};

/// Display label of a unit.
pub const LABEL: &str = "rdfs:label";
/// Preferred title (academic rank) of a person.
pub const PREFERRED_TITLE: &str = "vivo:preferredTitle";

/// Fetch one value of `attribute` on `entity`.
///
/// An unresolved entity issues no query. A failed or empty lookup is `None`.
pub fn fetch_attribute(
    graph: &dyn GraphClient,
    entity: Option<&EntityRef>,
    attribute: &str,
) -> Option<Term> {
    let entity = entity?;
    match graph.fetch_attribute(entity, attribute) {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            debug!(%entity, attribute, "attribute not present");
            None
        }
        Err(e) => {
            warn!(%entity, attribute, error = %e, "attribute lookup failed");
            None
        }
    }
}
