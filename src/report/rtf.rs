//! RTF 1.x renderer for NIH-style landscape tables.
//!
//! Measurements are in twips (1440 to the inch) and font sizes in half points.

use std::fmt::{self, Write};

use crate::error::ReportError;

use super::{
    Block, Document, DocumentRenderer, Inline, Paragraph, ParagraphStyle, ReportResult, Table,
};

/// Page geometry and typography.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtfRenderer {
    pub page_width: u32,
    pub page_height: u32,
    pub margin: u32,
    pub font: String,
    /// Body text size in half points.
    pub body_size: u32,
    /// Heading size in half points.
    pub heading_size: u32,
}

impl Default for RtfRenderer {
    /// US Letter, landscape, half-inch margins, Arial 8/11 pt.
    fn default() -> Self {
        Self {
            page_width: 15840,
            page_height: 12240,
            margin: 720,
            font: "Arial".into(),
            body_size: 16,
            heading_size: 22,
        }
    }
}

const HEADER_INDENT: u32 = 810;
const BORDER: &str = "\\brdrs\\brdrw11";
const MIN_COLUMN_WEIGHT: usize = 6;
const MAX_COLUMN_WEIGHT: usize = 40;

impl RtfRenderer {
    fn text_width(&self) -> u32 {
        self.page_width.saturating_sub(2 * self.margin)
    }

    fn write_document(&self, out: &mut String, document: &Document) -> fmt::Result {
        write!(out, "{{\\rtf1\\ansi\\ansicpg1252\\deff0\\uc1")?;
        write!(out, "{{\\fonttbl{{\\f0\\fswiss {};}}}}", escape(&self.font))?;
        writeln!(out)?;
        writeln!(
            out,
            "\\paperw{w}\\paperh{h}\\margl{m}\\margr{m}\\margt{m}\\margb{m}\\landscape",
            w = self.page_width,
            h = self.page_height,
            m = self.margin,
        )?;

        if !document.header.is_empty() {
            write!(out, "{{\\header ")?;
            for paragraph in &document.header {
                self.write_paragraph(out, paragraph)?;
            }
            writeln!(out, "}}")?;
        }
        if !document.footer.is_empty() {
            write!(out, "{{\\footer ")?;
            for paragraph in &document.footer {
                self.write_paragraph(out, paragraph)?;
            }
            writeln!(out, "}}")?;
        }

        for section in &document.sections {
            let title = Paragraph::new(ParagraphStyle::Heading).text(section.title.as_str());
            self.write_paragraph(out, &title)?;
            for block in &section.blocks {
                match block {
                    Block::Paragraph(paragraph) => self.write_paragraph(out, paragraph)?,
                    Block::Table(table) => self.write_table(out, table)?,
                }
            }
        }
        writeln!(out, "}}")
    }

    fn paragraph_format(&self, style: ParagraphStyle) -> String {
        let body = self.body_size;
        match style {
            ParagraphStyle::Normal => format!("\\sb60\\sa60\\f0\\fs{body}"),
            ParagraphStyle::Heading => {
                format!("\\sb180\\sa60\\keepn\\f0\\fs{}\\b", self.heading_size)
            }
            ParagraphStyle::Header => format!("\\li{HEADER_INDENT}\\sa60\\f0\\fs{body}"),
            ParagraphStyle::Footer => {
                let width = self.text_width();
                format!(
                    "\\brdrt{BORDER}\\sb60\\tqc\\tx{}\\tqr\\tx{width}\\f0\\fs{body}",
                    width / 2
                )
            }
        }
    }

    fn write_paragraph(&self, out: &mut String, paragraph: &Paragraph) -> fmt::Result {
        write!(out, "\\pard\\plain{} ", self.paragraph_format(paragraph.style))?;
        for inline in &paragraph.content {
            match inline {
                Inline::Text(text) => out.push_str(&escape(text)),
                Inline::Bold(text) => write!(out, "{{\\b {}}}", escape(text))?,
                Inline::Tab => out.push_str("\\tab "),
                Inline::PageNumber => out.push_str("{\\field{\\*\\fldinst PAGE}{\\fldrslt 1}}"),
            }
        }
        writeln!(out, "\\par")
    }

    fn write_table(&self, out: &mut String, table: &Table) -> fmt::Result {
        let edges = self.column_edges(table);
        let headings: Vec<Vec<String>> = table.headings.iter().map(|h| vec![h.clone()]).collect();
        self.write_row(out, &edges, &headings, true)?;
        for row in &table.rows {
            let cells: Vec<Vec<String>> = (0..edges.len())
                .map(|i| row.cells.get(i).map(|c| c.lines.clone()).unwrap_or_default())
                .collect();
            self.write_row(out, &edges, &cells, false)?;
        }
        writeln!(out, "\\pard")
    }

    fn write_row(
        &self,
        out: &mut String,
        edges: &[u32],
        cells: &[Vec<String>],
        heading: bool,
    ) -> fmt::Result {
        write!(out, "\\trowd\\trgaph72")?;
        if heading {
            out.push_str("\\trhdr");
        }
        for edge in edges {
            write!(
                out,
                "\\clbrdrt{BORDER}\\clbrdrl{BORDER}\\clbrdrb{BORDER}\\clbrdrr{BORDER}\\cellx{edge}"
            )?;
        }
        writeln!(out)?;
        for lines in cells {
            write!(out, "\\pard\\intbl\\f0\\fs{}", self.body_size)?;
            if heading {
                out.push_str("\\b");
            }
            out.push(' ');
            let text: Vec<String> = lines.iter().map(|line| escape(line)).collect();
            out.push_str(&text.join("\\line "));
            out.push_str("\\cell");
            if heading {
                out.push_str("\\b0");
            }
            writeln!(out)?;
        }
        writeln!(out, "\\row")
    }

    /// Right edge of each column. Columns share the text width in proportion
    /// to their longest line, within fixed bounds.
    fn column_edges(&self, table: &Table) -> Vec<u32> {
        let weights: Vec<usize> = (0..table.columns())
            .map(|i| {
                let heading = table.headings[i].chars().count();
                let longest = table
                    .rows
                    .iter()
                    .filter_map(|row| row.cells.get(i))
                    .flat_map(|cell| cell.lines.iter())
                    .map(|line| line.chars().count())
                    .max()
                    .unwrap_or(0);
                heading.max(longest).clamp(MIN_COLUMN_WEIGHT, MAX_COLUMN_WEIGHT)
            })
            .collect();
        let total: usize = weights.iter().sum();
        if total == 0 {
            return Vec::new();
        }

        let width = self.text_width() as usize;
        let mut edge = 0;
        let mut edges: Vec<u32> = weights
            .iter()
            .map(|w| {
                edge += width * w / total;
                edge as u32
            })
            .collect();
        if let Some(last) = edges.last_mut() {
            *last = width as u32;
        }
        edges
    }
}

impl DocumentRenderer for RtfRenderer {
    fn name(&self) -> &str {
        "rtf"
    }

    fn render(&self, document: &Document) -> ReportResult<String> {
        let mut out = String::new();
        self.write_document(&mut out, document)
            .map_err(|e| ReportError::Serialization {
                message: e.to_string(),
            })?;
        Ok(out)
    }
}

/// Escape text for an RTF body. Non-ASCII characters become `\uN?` escapes
/// (UTF-16 code units, signed).
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\line "),
            '\t' => out.push_str("\\tab "),
            '\r' => {}
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{}?", *unit as i16);
                }
            }
        }
    }
    out
}
