//! CSV roster ingest: parse a proposal roster into [`RawRecord`]s.
//!
//! The first non-empty, non-comment line is the header; columns are located by
//! name through [`RosterColumns`], so extra columns are ignored and column order
//! does not matter. Fields may be quoted; inside quotes the delimiter and line
//! breaks are literal and `""` is an escaped quote. Unquoted fields are trimmed,
//! quoted fields are kept byte-for-byte.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::config::{RosterColumns, RosterConfig};
use crate::error::RosterError;

use super::{Flag, RawRecord, Roster, RowKey};

/// Result type for roster ingest.
pub type RosterResult<T> = std::result::Result<T, RosterError>;

/// Read and partition a roster file.
pub fn read_roster(path: &Path, config: &RosterConfig) -> RosterResult<Roster> {
    let content = std::fs::read_to_string(path).map_err(|source| RosterError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let roster = parse_roster(&content, config)?;
    info!(
        path = %path.display(),
        units = roster.units.len(),
        faculty = roster.faculty.len(),
        predocs = roster.predocs.len(),
        postdocs = roster.postdocs.len(),
        malformed = roster.malformed.len(),
        "read roster"
    );
    Ok(roster)
}

/// Parse roster text and partition it by role.
pub fn parse_roster(content: &str, config: &RosterConfig) -> RosterResult<Roster> {
    Ok(Roster::partition(parse_records(content, config)?))
}

/// Parse roster text into unvalidated rows, keyed by their 1-based data-row number.
pub fn parse_records(content: &str, config: &RosterConfig) -> RosterResult<Vec<RawRecord>> {
    let mut lines = split_records(content, config.delimiter)?.into_iter();
    let header = lines.next().ok_or(RosterError::MissingHeader)?;
    let layout = ColumnLayout::locate(&header, &config.columns)?;

    let mut records = Vec::new();
    for (index, fields) in lines.enumerate() {
        records.push(layout.record(RowKey(index + 1), &fields));
    }
    debug!(rows = records.len(), "parsed roster rows");
    Ok(records)
}

/// Column positions resolved against the header.
struct ColumnLayout {
    role: usize,
    unit: usize,
    person: Option<usize>,
    name: Option<usize>,
    flags: Vec<(Flag, usize)>,
}

impl ColumnLayout {
    fn locate(header: &[String], columns: &RosterColumns) -> RosterResult<Self> {
        let index: HashMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let required = |column: &str| {
            index
                .get(column)
                .copied()
                .ok_or_else(|| RosterError::MissingColumn {
                    column: column.to_string(),
                })
        };
        let optional = |column: &str| index.get(column).copied();

        let flags = [
            (Flag::UnderrepresentedMinority, &columns.underrepresented_minority),
            (Flag::Disability, &columns.disability),
            (Flag::DisadvantagedBackground, &columns.disadvantaged_background),
            (Flag::TargetedGroupEligible, &columns.targeted_group_eligible),
        ]
        .into_iter()
        .filter_map(|(flag, column)| optional(column.as_str()).map(|i| (flag, i)))
        .collect();

        Ok(Self {
            role: required(columns.role.as_str())?,
            unit: required(columns.unit_code.as_str())?,
            person: optional(columns.person_id.as_str()),
            name: optional(columns.name.as_str()),
            flags,
        })
    }

    fn record(&self, key: RowKey, fields: &[String]) -> RawRecord {
        let cell = |i: usize| fields.get(i).cloned();
        let non_empty = |i: usize| cell(i).filter(|v| !v.is_empty());

        let mut record = RawRecord::new(
            key.0,
            cell(self.role).unwrap_or_default(),
            cell(self.unit).unwrap_or_default(),
        );
        record.person_id = self.person.and_then(non_empty);
        record.name = self.name.and_then(non_empty);
        for &(flag, i) in &self.flags {
            record.flags.set_raw(flag, cell(i));
        }
        record
    }
}

/// Split CSV text into records of fields.
///
/// Blank lines and lines starting with `#` are skipped.
fn split_records(content: &str, delimiter: char) -> RosterResult<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut was_quoted = false;
    let mut line = 1;
    let mut quote_line = 0;
    let mut at_line_start = true;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => quoted = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        if at_line_start {
            at_line_start = false;
            if c == '#' {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
                line += 1;
                at_line_start = true;
                continue;
            }
        }

        match c {
            '"' if field.trim().is_empty() && !was_quoted => {
                field.clear();
                quoted = true;
                was_quoted = true;
                quote_line = line;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                push_field(&mut fields, &mut field, was_quoted);
                was_quoted = false;
                finish_record(&mut records, &mut fields);
                line += 1;
                at_line_start = true;
            }
            c if c == delimiter => {
                push_field(&mut fields, &mut field, was_quoted);
                was_quoted = false;
            }
            _ => field.push(c),
        }
    }

    if quoted {
        return Err(RosterError::UnterminatedQuote { line: quote_line });
    }
    push_field(&mut fields, &mut field, was_quoted);
    finish_record(&mut records, &mut fields);
    Ok(records)
}

fn push_field(fields: &mut Vec<String>, field: &mut String, was_quoted: bool) {
    let value = std::mem::take(field);
    if was_quoted {
        fields.push(value);
    } else {
        fields.push(value.trim().to_string());
    }
}

fn finish_record(records: &mut Vec<Vec<String>>, fields: &mut Vec<String>) {
    let record = std::mem::take(fields);
    let blank = record.len() == 1 && record[0].is_empty();
    if !record.is_empty() && !blank {
        records.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Role;

    fn config() -> RosterConfig {
        RosterConfig::default()
    }

    const SAMPLE: &str = "\
TYPE,DEPTID,NAME,UFID,URM,DISABILITIES,DISADVANTAGED,TGE
unit,29010000,Medicine,,,,,
faculty,29010000,\"Conlon, Michael\",12345678,,,,
predoc,29010000,\"Doe, Jane\",22222222,1,0,,0
postdoc,29010000,\"Roe, Richard\",33333333,0,0,1,1
alumnus,29010000,\"Old, Timer\",44444444,,,,
";

    #[test]
    fn sample_roster_partitions() {
        let roster = parse_roster(SAMPLE, &config()).unwrap();
        assert_eq!(roster.units.len(), 1);
        assert_eq!(roster.faculty.len(), 1);
        assert_eq!(roster.predocs.len(), 1);
        assert_eq!(roster.postdocs.len(), 1);
        assert_eq!(roster.malformed.len(), 1);
        assert_eq!(roster.malformed[0].key, RowKey(5));

        let faculty = &roster.faculty[0].record;
        assert_eq!(faculty.role, Role::Faculty);
        assert_eq!(faculty.name.as_deref(), Some("Conlon, Michael"));
        assert_eq!(faculty.person_id.as_deref(), Some("12345678"));

        let predoc = &roster.predocs[0];
        assert!(predoc.flags.is_marked(Flag::UnderrepresentedMinority));
        assert!(!predoc.flags.is_marked(Flag::TargetedGroupEligible));
        assert_eq!(predoc.flags.raw(Flag::DisadvantagedBackground), Some(""));
    }

    #[test]
    fn unit_rows_have_no_person() {
        let roster = parse_roster(SAMPLE, &config()).unwrap();
        assert_eq!(roster.units[0].record.person_id, None);
        assert_eq!(roster.units[0].record.unit_code, "29010000");
    }

    #[test]
    fn department_tag_is_malformed_under_default_columns() {
        let csv = "TYPE,DEPTID,NAME\ndepartment,29010000,Medicine\nunit,29020000,Surgery\n";
        let roster = parse_roster(csv, &config()).unwrap();
        assert_eq!(roster.units.len(), 1);
        assert_eq!(roster.units[0].record.unit_code, "29020000");
        assert_eq!(roster.malformed.len(), 1);
        assert_eq!(roster.malformed[0].key, RowKey(1));
        assert_eq!(roster.malformed[0].role_tag, "department");
    }

    #[test]
    fn column_order_and_extra_columns_are_irrelevant() {
        let csv = "NOTES,DEPTID,TYPE\nhello,U1,unit\n";
        let roster = parse_roster(csv, &config()).unwrap();
        assert_eq!(roster.units[0].record.unit_code, "U1");
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let result = parse_roster("TYPE,NAME\nunit,Medicine\n", &config());
        assert!(matches!(
            result,
            Err(RosterError::MissingColumn { column }) if column == "DEPTID"
        ));
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(
            parse_roster("\n# only a comment\n\n", &config()),
            Err(RosterError::MissingHeader)
        ));
    }

    #[test]
    fn quoted_fields_keep_delimiters_quotes_and_newlines() {
        let records = split_records("a,\"b,\"\"c\"\"\nd\", e \r\n", ',').unwrap();
        assert_eq!(records, vec![vec!["a", "b,\"c\"\nd", "e"]]);
    }

    #[test]
    fn unterminated_quote_reports_its_line() {
        let result = split_records("a,b\nc,\"oops\n", ',');
        assert!(matches!(
            result,
            Err(RosterError::UnterminatedQuote { line: 2 })
        ));
    }

    #[test]
    fn comments_and_blank_lines_skipped() {
        let records = split_records("# header comment\n\nA,B\n\n1,2\n", ',').unwrap();
        assert_eq!(records, vec![vec!["A", "B"], vec!["1", "2"]]);
    }

    #[test]
    fn tab_delimiter() {
        let mut cfg = config();
        cfg.delimiter = '\t';
        let roster = parse_roster("TYPE\tDEPTID\nunit\tU1\nfaculty\tU1\n", &cfg).unwrap();
        assert_eq!(roster.units.len(), 1);
        assert_eq!(roster.faculty.len(), 1);
    }

    #[test]
    fn short_rows_leave_fields_absent() {
        let records = parse_records("TYPE,DEPTID,UFID,TGE\npredoc,U1\n", &config()).unwrap();
        assert_eq!(records[0].person_id, None);
        assert_eq!(records[0].flags.raw(Flag::TargetedGroupEligible), None);
    }

    #[test]
    fn read_roster_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("proposal.csv");
        std::fs::write(&path, SAMPLE).unwrap();
        let roster = read_roster(&path, &config()).unwrap();
        assert_eq!(roster.len(), 4);

        let missing = read_roster(&dir.path().join("absent.csv"), &config());
        assert!(matches!(missing, Err(RosterError::Read { .. })));
    }
}
