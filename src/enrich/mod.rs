//! Record enrichment: resolve roster identifiers in the knowledge graph, pull
//! unit statistics and person facts, and merge them onto the roster.
//!
//! Every graph lookup is best effort. A lookup that fails or finds nothing
//! leaves its fields unset (`None`) and processing moves on to the next record;
//! counts that are unknown stay distinct from counts that are zero.
//!
//! - [`resolve`]: roster identifier → [`EntityRef`]
//! - [`attribute`]: single scalar attribute of an entity
//! - [`stats`]: the five per-unit graph counts in one grouped query
//! - [`person`]: preferred title, degrees and positions of a person
//! - [`merge`]: the per-record passes that write all of the above onto a [`Roster`]
//!
//! [`Roster`]: crate::roster::Roster

pub mod attribute;
pub mod merge;
pub mod person;
pub mod resolve;
pub mod stats;

use serde::{Deserialize, Serialize};

use crate::error::EnrichError;
use crate::graph::EntityRef;
use crate::roster::{RosterRecord, RowKey};

pub use attribute::fetch_attribute;
pub use merge::Enricher;
pub use person::fetch_person;
pub use resolve::EntityResolver;
pub use stats::aggregate_unit_statistics;

pub type EnrichResult<T> = std::result::Result<T, EnrichError>;

/// Predicates tying roster identifiers to graph entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Unit code literal on a unit entity.
    pub unit_id: String,
    /// Person identifier literal on a person entity.
    pub person_id: String,
    /// Links a person to their home unit.
    pub home_unit: String,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            unit_id: "ufVivo:deptID".into(),
            person_id: "ufVivo:ufid".into(),
            home_unit: "ufVivo:homeDept".into(),
        }
    }
}

/// Graph-derived headcounts of a unit. `None` means the graph did not report it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatistics {
    pub faculty_count: Option<u64>,
    pub predoc_count: Option<u64>,
    pub postdoc_count: Option<u64>,
    /// Predocs holding a principal-investigator role on a grant.
    pub predoc_supported: Option<u64>,
    /// Postdocs holding a principal-investigator role on a grant.
    pub postdoc_supported: Option<u64>,
}

impl UnitStatistics {
    pub fn is_unset(&self) -> bool {
        *self == UnitStatistics::default()
    }
}

/// Roster-derived counts for one trainee population of a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraineeTallies {
    pub participating: u64,
    pub tge: u64,
    pub urm: u64,
    pub disabilities: u64,
    pub disadvantaged: u64,
}

/// All roster-derived counts of a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTallies {
    pub faculty_participating: u64,
    pub predoc: TraineeTallies,
    pub postdoc: TraineeTallies,
}

/// A unit row with its graph facts and local tallies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub record: RosterRecord,
    pub entity: Option<EntityRef>,
    pub label: Option<String>,
    pub statistics: UnitStatistics,
    pub tallies: UnitTallies,
}

impl UnitRecord {
    /// A unit with nothing enriched yet.
    pub fn new(record: RosterRecord) -> Self {
        Self {
            record,
            entity: None,
            label: None,
            statistics: UnitStatistics::default(),
            tallies: UnitTallies::default(),
        }
    }
}

/// An educational training entry, as stored in the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeRecord {
    pub degree_name: Option<String>,
    pub institution_name: Option<String>,
    pub major_field: Option<String>,
    /// `xsd:dateTime` lexical form of the completion date.
    pub end_date: Option<String>,
}

/// A position held, as stored in the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub position_label: Option<String>,
    pub org_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// The three attribute groups of a person lookup. Each is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFacts {
    pub preferred_title: Option<String>,
    pub degrees: Option<Vec<DegreeRecord>>,
    pub positions: Option<Vec<PositionRecord>>,
}

/// A faculty row with its graph facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacultyRecord {
    pub record: RosterRecord,
    pub entity: Option<EntityRef>,
    pub rank: Option<String>,
    pub degrees: Option<Vec<DegreeRecord>>,
    pub positions: Option<Vec<PositionRecord>>,
}

impl FacultyRecord {
    pub fn new(record: RosterRecord) -> Self {
        Self {
            record,
            entity: None,
            rank: None,
            degrees: None,
            positions: None,
        }
    }
}

/// Rows whose graph resolution failed, in roster order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentSummary {
    pub unresolved_units: Vec<RowKey>,
    pub unresolved_faculty: Vec<RowKey>,
}

impl EnrichmentSummary {
    pub fn is_complete(&self) -> bool {
        self.unresolved_units.is_empty() && self.unresolved_faculty.is_empty()
    }
}
