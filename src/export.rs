//! Export types for inspecting a roster.
//!
//! These give a flat, human-readable view of the role partitions and the
//! enrichment results, suitable for JSON export from the CLI.

use serde::{Deserialize, Serialize};

use crate::enrich::{EnrichmentSummary, TraineeTallies, UnitStatistics};
use crate::error::ReportError;
use crate::roster::{Roster, RosterRecord};

/// Exported roster, partitioned by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterExport {
    pub units: Vec<UnitExport>,
    pub faculty: Vec<FacultyExport>,
    pub predocs: Vec<RosterRecord>,
    pub postdocs: Vec<RosterRecord>,
    /// Rows excluded from every partition.
    pub diagnostics: Vec<DiagnosticExport>,
    pub unresolved: EnrichmentSummary,
}

/// Exported unit with its graph facts and local tallies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitExport {
    pub row: usize,
    pub unit_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub statistics: UnitStatistics,
    pub faculty_participating: u64,
    pub predoc: TraineeTallies,
    pub postdoc: TraineeTallies,
}

/// Exported faculty member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacultyExport {
    pub row: usize,
    pub unit_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
    /// Number of degrees found, if the lookup succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degrees: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<usize>,
}

/// Exported roster diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticExport {
    pub row: usize,
    pub role_tag: String,
    pub message: String,
}

impl From<&Roster> for RosterExport {
    fn from(roster: &Roster) -> Self {
        Self {
            units: roster
                .units
                .iter()
                .map(|unit| UnitExport {
                    row: unit.record.key.0,
                    unit_code: unit.record.unit_code.clone(),
                    uri: unit.entity.as_ref().map(|e| e.as_str().to_string()),
                    label: unit.label.clone(),
                    statistics: unit.statistics,
                    faculty_participating: unit.tallies.faculty_participating,
                    predoc: unit.tallies.predoc,
                    postdoc: unit.tallies.postdoc,
                })
                .collect(),
            faculty: roster
                .faculty
                .iter()
                .map(|member| FacultyExport {
                    row: member.record.key.0,
                    unit_code: member.record.unit_code.clone(),
                    person_id: member.record.person_id.clone(),
                    name: member.record.name.clone(),
                    uri: member.entity.as_ref().map(|e| e.as_str().to_string()),
                    rank: member.rank.clone(),
                    degrees: member.degrees.as_ref().map(Vec::len),
                    positions: member.positions.as_ref().map(Vec::len),
                })
                .collect(),
            predocs: roster.predocs.clone(),
            postdocs: roster.postdocs.clone(),
            diagnostics: roster
                .malformed
                .iter()
                .map(|row| DiagnosticExport {
                    row: row.key.0,
                    role_tag: row.role_tag.clone(),
                    message: row.to_string(),
                })
                .collect(),
            unresolved: roster.unresolved(),
        }
    }
}

impl RosterExport {
    pub fn to_json(&self) -> Result<String, ReportError> {
        serde_json::to_string_pretty(self).map_err(|e| ReportError::Serialization {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RawRecord;

    #[test]
    fn export_flattens_partitions_and_diagnostics() {
        let roster = Roster::partition(vec![
            RawRecord::new(1, "unit", "U1"),
            RawRecord::new(2, "faculty", "U1").with_person("F1"),
            RawRecord::new(3, "alumnus", "U1"),
        ]);
        let export = RosterExport::from(&roster);
        assert_eq!(export.units[0].unit_code, "U1");
        assert_eq!(export.units[0].uri, None);
        assert_eq!(export.faculty[0].person_id.as_deref(), Some("F1"));
        assert_eq!(export.faculty[0].degrees, None);
        assert_eq!(
            export.diagnostics,
            vec![DiagnosticExport {
                row: 3,
                role_tag: "alumnus".into(),
                message: "no such role \"alumnus\" on row 3".into(),
            }]
        );
        assert_eq!(export.unresolved.unresolved_units.len(), 1);
    }

    #[test]
    fn json_omits_unset_facts() {
        let roster = Roster::partition(vec![RawRecord::new(1, "faculty", "U1")]);
        let json: serde_json::Value =
            serde_json::from_str(&RosterExport::from(&roster).to_json().unwrap()).unwrap();
        let member = &json["faculty"][0];
        assert_eq!(member["row"], 1);
        assert!(member.get("rank").is_none());
        assert!(member.get("uri").is_none());
    }
}
