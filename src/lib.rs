// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # t32-roster
//!
//! Builds the data tables of an NIH T32 training grant application from a
//! proposal roster and a VIVO knowledge graph.
//!
//! ## Architecture
//!
//! - **Roster** (`roster`): CSV ingest and role partitioning (units, faculty, predocs, postdocs)
//! - **Knowledge graph** (`graph`): parameterized SPARQL over HTTP (`ureq`) or a local `oxigraph` store
//! - **Enrichment** (`enrich`): entity resolution, unit statistics, person facts, local tallies
//! - **Report** (`report`): logical document tree with RTF and JSON renderers
//! - **Pipeline** (`pipeline`): connects the stages under one [`config::T32Config`]
//!
//! ## Library usage
//!
//! ```no_run
//! use oxigraph::io::RdfFormat;
//! use t32_roster::config::RosterConfig;
//! use t32_roster::enrich::{Enricher, Vocabulary};
//! use t32_roster::graph::{Prefixes, SparqlStore};
//! use t32_roster::report::{self, DocumentRenderer, ReportOptions, RtfRenderer};
//! use t32_roster::roster::csv::parse_roster;
//!
//! let store = SparqlStore::in_memory(Prefixes::default()).unwrap();
//! store.load_str(RdfFormat::Turtle, "").unwrap();
//!
//! let csv = "TYPE,DEPTID\nunit,29010000\n";
//! let mut roster = parse_roster(csv, &RosterConfig::default()).unwrap();
//! let vocabulary = Vocabulary::default();
//! Enricher::new(&store, &vocabulary).enrich(&mut roster).unwrap();
//!
//! let document = report::assemble(&roster, &ReportOptions::default());
//! let rtf = RtfRenderer::default().render(&document).unwrap();
//! ```

pub mod config;
pub mod enrich;
pub mod error;
pub mod export;
pub mod graph;
pub mod pipeline;
pub mod report;
pub mod roster;
