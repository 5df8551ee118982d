//! Proposal roster: the people and units named in a T32 application.
//!
//! A roster arrives as flat rows, each tagged with a role. [`Roster::partition`]
//! sorts valid rows into the four role partitions and sets aside rows whose
//! tag is not recognized as [`MalformedRow`] diagnostics, so a typo in the
//! input never leaks a person into the wrong table.

pub mod csv;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::enrich::{EnrichmentSummary, FacultyRecord, UnitRecord};

/// Role of a roster row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// An organizational unit (department or division).
    Unit,
    /// A participating faculty member.
    Faculty,
    /// A predoctoral trainee.
    Predoc,
    /// A postdoctoral trainee.
    Postdoc,
}

impl Role {
    /// Parse a role tag. Only the exact lowercase tags are recognized.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "unit" => Some(Role::Unit),
            "faculty" => Some(Role::Faculty),
            "predoc" => Some(Role::Predoc),
            "postdoc" => Some(Role::Postdoc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Unit => "unit",
            Role::Faculty => "faculty",
            Role::Predoc => "predoc",
            Role::Postdoc => "postdoc",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local key of a roster row: its 1-based position among the data rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowKey(pub usize);

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}", self.0)
    }
}

/// Demographic flag carried by trainee rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    UnderrepresentedMinority,
    Disability,
    DisadvantagedBackground,
    TargetedGroupEligible,
}

impl Flag {
    pub const ALL: [Flag; 4] = [
        Flag::UnderrepresentedMinority,
        Flag::Disability,
        Flag::DisadvantagedBackground,
        Flag::TargetedGroupEligible,
    ];
}

/// The only raw value that marks a flag as set.
pub const FLAG_MARKER: &str = "1";

/// Raw demographic flag values, exactly as they appeared in the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underrepresented_minority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disadvantaged_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targeted_group_eligible: Option<String>,
}

impl DemographicFlags {
    pub fn raw(&self, flag: Flag) -> Option<&str> {
        match flag {
            Flag::UnderrepresentedMinority => self.underrepresented_minority.as_deref(),
            Flag::Disability => self.disability.as_deref(),
            Flag::DisadvantagedBackground => self.disadvantaged_background.as_deref(),
            Flag::TargetedGroupEligible => self.targeted_group_eligible.as_deref(),
        }
    }

    pub fn set_raw(&mut self, flag: Flag, value: Option<String>) {
        match flag {
            Flag::UnderrepresentedMinority => self.underrepresented_minority = value,
            Flag::Disability => self.disability = value,
            Flag::DisadvantagedBackground => self.disadvantaged_background = value,
            Flag::TargetedGroupEligible => self.targeted_group_eligible = value,
        }
    }

    /// True only when the raw value is exactly `"1"`. Empty, absent, `"0"`,
    /// `"true"`, `" 1"` and anything else are all false.
    pub fn is_marked(&self, flag: Flag) -> bool {
        self.raw(flag) == Some(FLAG_MARKER)
    }
}

/// A validated roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRecord {
    pub key: RowKey,
    pub role: Role,
    /// Unit code, compared verbatim against other rows.
    pub unit_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub flags: DemographicFlags,
}

impl RosterRecord {
    pub fn new(key: RowKey, role: Role, unit_code: impl Into<String>) -> Self {
        Self {
            key,
            role,
            unit_code: unit_code.into(),
            person_id: None,
            name: None,
            flags: DemographicFlags::default(),
        }
    }

    pub fn with_person(mut self, person_id: impl Into<String>) -> Self {
        self.person_id = Some(person_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_flag(mut self, flag: Flag, value: impl Into<String>) -> Self {
        self.flags.set_raw(flag, Some(value.into()));
        self
    }
}

/// A roster row before its role tag has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub key: RowKey,
    pub role_tag: String,
    pub unit_code: String,
    pub person_id: Option<String>,
    pub name: Option<String>,
    pub flags: DemographicFlags,
}

impl RawRecord {
    pub fn new(key: usize, role_tag: impl Into<String>, unit_code: impl Into<String>) -> Self {
        Self {
            key: RowKey(key),
            role_tag: role_tag.into(),
            unit_code: unit_code.into(),
            person_id: None,
            name: None,
            flags: DemographicFlags::default(),
        }
    }

    pub fn with_person(mut self, person_id: impl Into<String>) -> Self {
        self.person_id = Some(person_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_flag(mut self, flag: Flag, value: impl Into<String>) -> Self {
        self.flags.set_raw(flag, Some(value.into()));
        self
    }

    /// Validate the role tag.
    pub fn into_record(self) -> Result<RosterRecord, MalformedRow> {
        match Role::parse(&self.role_tag) {
            Some(role) => Ok(RosterRecord {
                key: self.key,
                role,
                unit_code: self.unit_code,
                person_id: self.person_id,
                name: self.name,
                flags: self.flags,
            }),
            None => Err(MalformedRow {
                key: self.key,
                role_tag: self.role_tag,
            }),
        }
    }
}

/// A row excluded from every partition because its role tag is unrecognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedRow {
    pub key: RowKey,
    pub role_tag: String,
}

impl std::fmt::Display for MalformedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no such role \"{}\" on {}", self.role_tag, self.key)
    }
}

/// A roster partitioned by role. Owned by one run and enriched in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub units: Vec<UnitRecord>,
    pub faculty: Vec<FacultyRecord>,
    pub predocs: Vec<RosterRecord>,
    pub postdocs: Vec<RosterRecord>,
    /// Rows excluded for an unrecognized role tag, in input order.
    pub malformed: Vec<MalformedRow>,
}

impl Roster {
    /// Partition raw rows by role, preserving input order within each partition.
    ///
    /// Each malformed row is logged once at `warn` and recorded in `malformed`.
    pub fn partition(rows: impl IntoIterator<Item = RawRecord>) -> Self {
        let mut roster = Roster::default();
        for raw in rows {
            match raw.into_record() {
                Ok(record) => match record.role {
                    Role::Unit => roster.units.push(UnitRecord::new(record)),
                    Role::Faculty => roster.faculty.push(FacultyRecord::new(record)),
                    Role::Predoc => roster.predocs.push(record),
                    Role::Postdoc => roster.postdocs.push(record),
                },
                Err(malformed) => {
                    warn!(row = malformed.key.0, tag = %malformed.role_tag, "{malformed}");
                    roster.malformed.push(malformed);
                }
            }
        }
        roster
    }

    /// Number of rows accepted into a partition.
    pub fn len(&self) -> usize {
        self.units.len() + self.faculty.len() + self.predocs.len() + self.postdocs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Units and faculty whose graph lookup has not succeeded.
    pub fn unresolved(&self) -> EnrichmentSummary {
        EnrichmentSummary {
            unresolved_units: self
                .units
                .iter()
                .filter(|u| u.entity.is_none())
                .map(|u| u.record.key)
                .collect(),
            unresolved_faculty: self
                .faculty
                .iter()
                .filter(|f| f.entity.is_none())
                .map(|f| f.record.key)
                .collect(),
        }
    }

    /// Look up a unit by its roster code (first match in roster order).
    pub fn unit(&self, unit_code: &str) -> Option<&UnitRecord> {
        self.units.iter().find(|u| u.record.unit_code == unit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_tags_are_exact() {
        assert_eq!(Role::parse("unit"), Some(Role::Unit));
        assert_eq!(Role::parse("postdoc"), Some(Role::Postdoc));
        assert_eq!(Role::parse("Faculty"), None);
        assert_eq!(Role::parse(" predoc"), None);
        assert_eq!(Role::parse("department"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn flag_marker_is_literal_one() {
        for (value, expected) in [
            ("1", true),
            ("0", false),
            ("", false),
            ("true", false),
            ("yes", false),
            (" 1", false),
            ("01", false),
        ] {
            let flags = DemographicFlags {
                targeted_group_eligible: Some(value.into()),
                ..Default::default()
            };
            assert_eq!(
                flags.is_marked(Flag::TargetedGroupEligible),
                expected,
                "value {value:?}"
            );
        }
        assert!(!DemographicFlags::default().is_marked(Flag::Disability));
    }

    #[test]
    fn partition_preserves_order_within_roles() {
        let roster = Roster::partition(vec![
            RawRecord::new(1, "predoc", "U1").with_person("p1"),
            RawRecord::new(2, "unit", "U1"),
            RawRecord::new(3, "predoc", "U2").with_person("p2"),
            RawRecord::new(4, "faculty", "U1").with_person("f1"),
            RawRecord::new(5, "postdoc", "U1").with_person("d1"),
        ]);
        assert_eq!(roster.len(), 5);
        assert_eq!(
            roster.predocs.iter().map(|r| r.key).collect::<Vec<_>>(),
            vec![RowKey(1), RowKey(3)]
        );
        assert_eq!(roster.units[0].record.key, RowKey(2));
        assert_eq!(roster.faculty[0].record.person_id.as_deref(), Some("f1"));
        assert_eq!(roster.postdocs.len(), 1);
        assert!(roster.malformed.is_empty());
    }

    #[test]
    fn unknown_role_is_reported_once_and_excluded() {
        let roster = Roster::partition(vec![
            RawRecord::new(1, "unit", "U1"),
            RawRecord::new(2, "alumnus", "U1").with_person("a1"),
        ]);
        assert_eq!(roster.len(), 1);
        assert_eq!(
            roster.malformed,
            vec![MalformedRow {
                key: RowKey(2),
                role_tag: "alumnus".into(),
            }]
        );
        assert!(roster.faculty.is_empty());
        assert!(roster.predocs.is_empty());
        assert!(roster.postdocs.is_empty());
        assert_eq!(roster.malformed[0].to_string(), "no such role \"alumnus\" on row 2");
    }

    #[test]
    fn fresh_roster_is_fully_unresolved() {
        let roster = Roster::partition(vec![
            RawRecord::new(1, "unit", "U1"),
            RawRecord::new(2, "faculty", "U1").with_person("f1"),
        ]);
        let summary = roster.unresolved();
        assert_eq!(summary.unresolved_units, vec![RowKey(1)]);
        assert_eq!(summary.unresolved_faculty, vec![RowKey(2)]);
        assert!(roster.unit("U1").is_some());
        assert!(roster.unit("U9").is_none());
    }
}
