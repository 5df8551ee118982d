//! Report assembly: the enriched roster as a logical document.
//!
//! [`assemble`] decides *what* the tables say. A [`DocumentRenderer`] decides
//! *how* it looks: fonts, column widths, page geometry. The same [`Document`]
//! renders to RTF for submission or JSON for inspection.

pub mod rtf;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ReportConfig;
use crate::enrich::{DegreeRecord, FacultyRecord, PositionRecord, UnitRecord};
use crate::error::ReportError;
use crate::roster::Roster;

pub use rtf::RtfRenderer;

pub type ReportResult<T> = std::result::Result<T, ReportError>;

/// Placeholder for a value the graph did not provide.
pub const UNKNOWN: &str = "n/a";

pub const HEADER_TEXT: &str = "Program Director/Principal Investigator (Last, First, Middle): ";
pub const FORM_ID: &str = "PHS 398/2590 (Rev. 06/09)";
pub const FORM_PAGE: &str = "Biographical Sketch Format Page";

// ── Document tree ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Repeated at the top of every page.
    pub header: Vec<Paragraph>,
    /// Repeated at the bottom of every page.
    pub footer: Vec<Paragraph>,
    pub sections: Vec<Section>,
}

/// A titled run of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphStyle {
    Normal,
    Heading,
    Header,
    Footer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub content: Vec<Inline>,
}

impl Paragraph {
    pub fn new(style: ParagraphStyle) -> Self {
        Self {
            style,
            content: Vec::new(),
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.content.push(Inline::Text(text.into()));
        self
    }

    pub fn bold(mut self, text: impl Into<String>) -> Self {
        self.content.push(Inline::Bold(text.into()));
        self
    }

    pub fn push(mut self, inline: Inline) -> Self {
        self.content.push(inline);
        self
    }

    /// Concatenated text content, with tabs as `\t` and page numbers as `#`.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(|inline| match inline {
                Inline::Text(text) | Inline::Bold(text) => text.as_str(),
                Inline::Tab => "\t",
                Inline::PageNumber => "#",
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    Bold(String),
    Tab,
    /// Current page number, filled in by the viewer.
    PageNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headings: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn columns(&self) -> usize {
        self.headings.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

/// A table cell; each line is a separate paragraph within the cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub lines: Vec<String>,
}

impl Cell {
    pub fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::line(text)
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::line(text)
    }
}

// ── Assembly ────────────────────────────────────────────────────────────

/// Inputs to [`assemble`] beyond the roster itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub program_director: String,
    pub max_degrees: usize,
    pub max_positions: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::from(&ReportConfig::default())
    }
}

impl From<&ReportConfig> for ReportOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            program_director: config.program_director.clone(),
            max_degrees: config.max_degrees,
            max_positions: config.max_positions,
        }
    }
}

pub const CENSUS_TITLE: &str = "Table 1. Census of Participating Departments";
pub const FACULTY_TITLE: &str = "Table 2. Participating Faculty Members";
pub const UNRESOLVED_TITLE: &str = "Unresolved records";

const CENSUS_HEADINGS: [&str; 17] = [
    "Participating Department",
    "Total Faculty",
    "Participating Faculty",
    "Total Predocs",
    "Predocs Supported",
    "Participating Predocs",
    "TGE Predocs",
    "URM Predocs",
    "Predocs with Disabilities",
    "Disadvantaged Predocs",
    "Total Postdocs",
    "Postdocs Supported",
    "Participating Postdocs",
    "TGE Postdocs",
    "URM Postdocs",
    "Postdocs with Disabilities",
    "Disadvantaged Postdocs",
];

const FACULTY_HEADINGS: [&str; 5] = [
    "Faculty Member",
    "Rank",
    "Degree(s)",
    "Department",
    "Recent Positions",
];

/// Build the document for an enriched roster. Units and faculty appear in
/// roster order.
pub fn assemble(roster: &Roster, options: &ReportOptions) -> Document {
    let mut sections = vec![
        Section {
            title: CENSUS_TITLE.into(),
            blocks: vec![Block::Table(census_table(roster))],
        },
        Section {
            title: FACULTY_TITLE.into(),
            blocks: vec![Block::Table(faculty_table(roster, options))],
        },
    ];
    if let Some(section) = unresolved_section(roster) {
        sections.push(section);
    }

    Document {
        header: vec![
            Paragraph::new(ParagraphStyle::Header)
                .text(HEADER_TEXT)
                .text(options.program_director.as_str()),
        ],
        footer: vec![
            Paragraph::new(ParagraphStyle::Footer)
                .text(FORM_ID)
                .push(Inline::Tab)
                .text("Page ")
                .push(Inline::PageNumber)
                .push(Inline::Tab)
                .text(FORM_PAGE),
        ],
        sections,
    }
}

/// Display name of a unit: graph label, then roster name, then unit code.
pub fn unit_display_name(unit: &UnitRecord) -> &str {
    unit.label
        .as_deref()
        .or(unit.record.name.as_deref())
        .unwrap_or(&unit.record.unit_code)
}

fn count(value: Option<u64>) -> Cell {
    value.map_or_else(|| UNKNOWN.into(), |n| n.to_string().into())
}

fn exact(value: u64) -> Cell {
    value.to_string().into()
}

fn census_table(roster: &Roster) -> Table {
    let rows = roster
        .units
        .iter()
        .map(|unit| {
            let stats = &unit.statistics;
            let tallies = &unit.tallies;
            Row {
                cells: vec![
                    unit_display_name(unit).into(),
                    count(stats.faculty_count),
                    exact(tallies.faculty_participating),
                    count(stats.predoc_count),
                    count(stats.predoc_supported),
                    exact(tallies.predoc.participating),
                    exact(tallies.predoc.tge),
                    exact(tallies.predoc.urm),
                    exact(tallies.predoc.disabilities),
                    exact(tallies.predoc.disadvantaged),
                    count(stats.postdoc_count),
                    count(stats.postdoc_supported),
                    exact(tallies.postdoc.participating),
                    exact(tallies.postdoc.tge),
                    exact(tallies.postdoc.urm),
                    exact(tallies.postdoc.disabilities),
                    exact(tallies.postdoc.disadvantaged),
                ],
            }
        })
        .collect();
    Table {
        headings: CENSUS_HEADINGS.iter().map(|h| h.to_string()).collect(),
        rows,
    }
}

fn faculty_table(roster: &Roster, options: &ReportOptions) -> Table {
    let rows = roster
        .faculty
        .iter()
        .map(|member| Row {
            cells: vec![
                faculty_name(member).into(),
                member.rank.as_deref().unwrap_or(UNKNOWN).into(),
                list_cell(member.degrees.as_deref(), options.max_degrees, degree_line),
                roster
                    .unit(&member.record.unit_code)
                    .map_or(member.record.unit_code.as_str(), unit_display_name)
                    .into(),
                list_cell(member.positions.as_deref(), options.max_positions, position_line),
            ],
        })
        .collect();
    Table {
        headings: FACULTY_HEADINGS.iter().map(|h| h.to_string()).collect(),
        rows,
    }
}

fn faculty_name(member: &FacultyRecord) -> &str {
    member
        .record
        .name
        .as_deref()
        .or(member.record.person_id.as_deref())
        .unwrap_or(UNKNOWN)
}

fn list_cell<T>(items: Option<&[T]>, limit: usize, line: fn(&T) -> String) -> Cell {
    match items {
        None => Cell::line(UNKNOWN),
        Some(items) => Cell {
            lines: items.iter().take(limit).map(line).collect(),
        },
    }
}

/// Leading four-digit year of an `xsd:dateTime` lexical form.
pub fn year(date: &str) -> Option<&str> {
    let year = date.get(..4)?;
    year.bytes().all(|b| b.is_ascii_digit()).then_some(year)
}

fn degree_line(degree: &DegreeRecord) -> String {
    let name = degree.degree_name.as_deref().unwrap_or(UNKNOWN);
    let mut line = match degree.end_date.as_deref().and_then(year) {
        Some(year) => format!("{name} {year}"),
        None => name.to_string(),
    };
    if let Some(institution) = &degree.institution_name {
        line.push_str(", ");
        line.push_str(institution);
    }
    line
}

fn position_line(position: &PositionRecord) -> String {
    let start = position.start_date.as_deref().and_then(year);
    let end = position.end_date.as_deref().and_then(year);
    let dates = match (start, end) {
        (Some(start), Some(end)) => format!("{start}-{end} "),
        (Some(start), None) => format!("{start}-present "),
        (None, Some(end)) => format!("-{end} "),
        (None, None) => String::new(),
    };
    let label = position.position_label.as_deref().unwrap_or(UNKNOWN);
    match &position.org_name {
        Some(org) => format!("{dates}{label}, {org}"),
        None => format!("{dates}{label}"),
    }
}

fn unresolved_section(roster: &Roster) -> Option<Section> {
    let summary = roster.unresolved();
    if summary.is_complete() {
        return None;
    }
    let mut blocks = Vec::new();
    if !summary.unresolved_units.is_empty() {
        let names: Vec<String> = roster
            .units
            .iter()
            .filter(|u| u.entity.is_none())
            .map(|u| format!("{} ({})", u.record.unit_code, u.record.key))
            .collect();
        blocks.push(Block::Paragraph(
            Paragraph::new(ParagraphStyle::Normal)
                .bold("Departments not found in VIVO: ")
                .text(names.join("; ")),
        ));
    }
    if !summary.unresolved_faculty.is_empty() {
        let names: Vec<String> = roster
            .faculty
            .iter()
            .filter(|f| f.entity.is_none())
            .map(|f| format!("{} ({})", faculty_name(f), f.record.key))
            .collect();
        blocks.push(Block::Paragraph(
            Paragraph::new(ParagraphStyle::Normal)
                .bold("Faculty not found in VIVO: ")
                .text(names.join("; ")),
        ));
    }
    Some(Section {
        title: UNRESOLVED_TITLE.into(),
        blocks,
    })
}

// ── Rendering ───────────────────────────────────────────────────────────

/// A concrete format for a [`Document`].
pub trait DocumentRenderer: Send + Sync {
    /// Format name as used in configuration (`rtf`, `json`).
    fn name(&self) -> &str;

    fn render(&self, document: &Document) -> ReportResult<String>;
}

/// Pretty-printed JSON of the document tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl DocumentRenderer for JsonRenderer {
    fn name(&self) -> &str {
        "json"
    }

    fn render(&self, document: &Document) -> ReportResult<String> {
        serde_json::to_string_pretty(document).map_err(|e| ReportError::Serialization {
            message: e.to_string(),
        })
    }
}

/// Renderer for a configured format name.
pub fn renderer_for(format: &str) -> ReportResult<Box<dyn DocumentRenderer>> {
    match format {
        "rtf" => Ok(Box::new(RtfRenderer::default())),
        "json" => Ok(Box::new(JsonRenderer)),
        other => Err(ReportError::UnknownFormat {
            format: other.to_string(),
        }),
    }
}

/// Render `document` and write it to `path`.
pub fn write_report(
    renderer: &dyn DocumentRenderer,
    document: &Document,
    path: &Path,
) -> ReportResult<()> {
    let text = renderer.render(document)?;
    std::fs::write(path, &text)?;
    info!(path = %path.display(), format = renderer.name(), bytes = text.len(), "wrote report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{TraineeTallies, UnitStatistics};
    use crate::graph::EntityRef;
    use crate::roster::{RawRecord, RowKey};

    fn roster() -> Roster {
        let mut roster = Roster::partition(vec![
            RawRecord::new(1, "unit", "U1").with_name("Dept. of Medicine"),
            RawRecord::new(2, "unit", "U2"),
            RawRecord::new(3, "faculty", "U1")
                .with_person("F1")
                .with_name("Conlon, Michael"),
            RawRecord::new(4, "faculty", "U2").with_person("F2"),
        ]);
        let u1 = &mut roster.units[0];
        u1.entity = Some(EntityRef::new("http://vivo.example.edu/u1"));
        u1.label = Some("Medicine".into());
        u1.statistics = UnitStatistics {
            faculty_count: Some(40),
            predoc_count: Some(12),
            postdoc_count: Some(0),
            predoc_supported: Some(3),
            postdoc_supported: None,
        };
        u1.tallies.faculty_participating = 1;
        u1.tallies.predoc = TraineeTallies {
            participating: 2,
            tge: 1,
            urm: 1,
            disabilities: 0,
            disadvantaged: 0,
        };
        let f1 = &mut roster.faculty[0];
        f1.entity = Some(EntityRef::new("http://vivo.example.edu/f1"));
        f1.rank = Some("Professor".into());
        f1.degrees = Some(vec![
            DegreeRecord {
                degree_name: Some("Ph.D.".into()),
                institution_name: Some("University of Florida".into()),
                major_field: None,
                end_date: Some("1996-05-01T00:00:00".into()),
            },
            DegreeRecord {
                degree_name: Some("B.S.".into()),
                ..Default::default()
            },
        ]);
        f1.positions = Some(vec![PositionRecord {
            position_label: Some("Associate Director".into()),
            org_name: Some("CTSI".into()),
            start_date: Some("2009-07-01T00:00:00".into()),
            end_date: None,
        }]);
        roster
    }

    fn table(document: &Document, title: &str) -> Table {
        let section = document.sections.iter().find(|s| s.title == title).unwrap();
        match &section.blocks[0] {
            Block::Table(table) => table.clone(),
            other => panic!("expected a table, got {other:?}"),
        }
    }

    fn cells(row: &Row) -> Vec<String> {
        row.cells.iter().map(Cell::text).collect()
    }

    #[test]
    fn census_rows_follow_roster_order() {
        let document = assemble(&roster(), &ReportOptions::default());
        let census = table(&document, CENSUS_TITLE);
        assert_eq!(census.columns(), 17);
        assert_eq!(census.rows.len(), 2);
        assert_eq!(
            cells(&census.rows[0]),
            vec![
                "Medicine", "40", "1", "12", "3", "2", "1", "1", "0", "0", "0", "n/a", "0", "0",
                "0", "0", "0"
            ]
        );
        // Unresolved unit: graph counts unknown, local tallies still shown.
        let u2 = cells(&census.rows[1]);
        assert_eq!(u2[0], "U2");
        assert_eq!(u2[1], UNKNOWN);
        assert_eq!(u2[2], "0");
    }

    #[test]
    fn unit_name_falls_back_to_roster_then_code() {
        let mut roster = roster();
        roster.units[0].label = None;
        assert_eq!(unit_display_name(&roster.units[0]), "Dept. of Medicine");
        assert_eq!(unit_display_name(&roster.units[1]), "U2");
    }

    #[test]
    fn faculty_rows_show_facts_or_unknown() {
        let document = assemble(&roster(), &ReportOptions::default());
        let faculty = table(&document, FACULTY_TITLE);
        assert_eq!(
            cells(&faculty.rows[0]),
            vec![
                "Conlon, Michael",
                "Professor",
                "Ph.D. 1996, University of Florida\nB.S.",
                "Medicine",
                "2009-present Associate Director, CTSI",
            ]
        );
        assert_eq!(cells(&faculty.rows[1]), vec!["F2", "n/a", "n/a", "U2", "n/a"]);
    }

    #[test]
    fn degree_and_position_limits() {
        let options = ReportOptions {
            max_degrees: 1,
            max_positions: 0,
            ..ReportOptions::default()
        };
        let document = assemble(&roster(), &options);
        let faculty = table(&document, FACULTY_TITLE);
        assert_eq!(faculty.rows[0].cells[2].lines.len(), 1);
        assert!(faculty.rows[0].cells[4].lines.is_empty());
    }

    #[test]
    fn unresolved_section_lists_rows() {
        let document = assemble(&roster(), &ReportOptions::default());
        let section = document.sections.last().unwrap();
        assert_eq!(section.title, UNRESOLVED_TITLE);
        let text: Vec<String> = section
            .blocks
            .iter()
            .map(|b| match b {
                Block::Paragraph(p) => p.plain_text(),
                Block::Table(_) => String::new(),
            })
            .collect();
        assert_eq!(
            text,
            vec![
                "Departments not found in VIVO: U2 (row 2)",
                "Faculty not found in VIVO: F2 (row 4)",
            ]
        );
        assert_eq!(roster().unresolved().unresolved_faculty, vec![RowKey(4)]);
    }

    #[test]
    fn fully_resolved_roster_has_no_unresolved_section() {
        let document = assemble(&Roster::default(), &ReportOptions::default());
        assert_eq!(document.sections.len(), 2);
    }

    #[test]
    fn header_and_footer() {
        let options = ReportOptions {
            program_director: "Conlon, Michael".into(),
            ..ReportOptions::default()
        };
        let document = assemble(&Roster::default(), &options);
        assert_eq!(
            document.header[0].plain_text(),
            "Program Director/Principal Investigator (Last, First, Middle): Conlon, Michael"
        );
        assert_eq!(
            document.footer[0].plain_text(),
            "PHS 398/2590 (Rev. 06/09)\tPage #\tBiographical Sketch Format Page"
        );
    }

    #[test]
    fn years_need_four_digits() {
        assert_eq!(year("1996-05-01T00:00:00"), Some("1996"));
        assert_eq!(year("96"), None);
        assert_eq!(year("n.d."), None);
    }

    #[test]
    fn json_renderer_round_trips_the_tree() {
        let document = assemble(&roster(), &ReportOptions::default());
        let json = JsonRenderer.render(&document).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, document);
    }

    #[test]
    fn renderer_lookup() {
        assert_eq!(renderer_for("rtf").unwrap().name(), "rtf");
        assert_eq!(renderer_for("json").unwrap().name(), "json");
        assert!(matches!(
            renderer_for("docx"),
            Err(ReportError::UnknownFormat { format }) if format == "docx"
        ));
    }

    #[test]
    fn write_report_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tables.json");
        let document = assemble(&roster(), &ReportOptions::default());
        write_report(&JsonRenderer, &document, &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains(CENSUS_TITLE));
    }
}
