//! Run configuration, persisted as TOML.
//!
//! Every field has a serde default, so an empty file (or no file at all) gives a
//! configuration matching the University of Florida VIVO deployment and its
//! roster spreadsheet layout. CLI flags override individual fields.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::enrich::Vocabulary;
use crate::error::ConfigError;
use crate::graph::Prefixes;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct T32Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub enrich: EnrichConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl T32Config {
    /// Load a config file from disk.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse config text; `origin` names the source in diagnostics.
    pub fn parse(content: &str, origin: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Save this config to disk.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Where the knowledge graph lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// SPARQL query endpoint URL. When unset, `data_files` are loaded locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// RDF files for the local oxigraph backend.
    #[serde(default)]
    pub data_files: Vec<PathBuf>,
    #[serde(default)]
    pub vocabulary: Vocabulary,
    #[serde(default)]
    pub prefixes: Prefixes,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            email: None,
            password: None,
            timeout_secs: default_timeout_secs(),
            data_files: Vec::new(),
            vocabulary: Vocabulary::default(),
            prefixes: Prefixes::default(),
        }
    }
}

/// Roster spreadsheet layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub columns: RosterColumns,
}

fn default_delimiter() -> char {
    ','
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            columns: RosterColumns::default(),
        }
    }
}

/// Header names of the roster columns.
///
/// Only header names are configurable. The role column's values are fixed to
/// `unit`, `faculty`, `predoc` and `postdoc`; a `department` tag is not accepted
/// and such rows are reported as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterColumns {
    pub role: String,
    pub unit_code: String,
    pub person_id: String,
    pub name: String,
    pub underrepresented_minority: String,
    pub disability: String,
    pub disadvantaged_background: String,
    pub targeted_group_eligible: String,
}

impl Default for RosterColumns {
    fn default() -> Self {
        Self {
            role: "TYPE".into(),
            unit_code: "DEPTID".into(),
            person_id: "UFID".into(),
            name: "NAME".into(),
            underrepresented_minority: "URM".into(),
            disability: "DISABILITIES".into(),
            disadvantaged_background: "DISADVANTAGED".into(),
            targeted_group_eligible: "TGE".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Concurrent graph lookups. 1 means strictly sequential in roster order.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    1
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Shown in the page header.
    #[serde(default)]
    pub program_director: String,
    /// `rtf` or `json`.
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_max_degrees")]
    pub max_degrees: usize,
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,
}

fn default_format() -> String {
    "rtf".into()
}
fn default_output() -> PathBuf {
    PathBuf::from("t32_tables.rtf")
}
fn default_max_degrees() -> usize {
    5
}
fn default_max_positions() -> usize {
    20
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            program_director: String::new(),
            format: default_format(),
            output: default_output(),
            max_degrees: default_max_degrees(),
            max_positions: default_max_positions(),
        }
    }
}
