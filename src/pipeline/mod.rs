//! Run pipeline: connect the graph, read the roster, enrich it, write the report.
//!
//! Each stage logs at `info`. Connecting probes the graph once, so an
//! unreachable endpoint fails the run up front; after that, individual lookup
//! failures are absorbed by the enrichment passes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::config::{GraphConfig, T32Config};
use crate::enrich::{Enricher, EnrichmentSummary};
use crate::error::{ConfigError, T32Result};
use crate::graph::endpoint::Credentials;
use crate::graph::{GraphClient, SparqlEndpoint, SparqlStore};
use crate::report::{self, ReportOptions};
use crate::roster::{self, Roster};

/// A configured run against one graph.
pub struct Pipeline {
    config: T32Config,
    graph: Box<dyn GraphClient>,
}

/// What [`Pipeline::build`] produced.
#[derive(Debug)]
pub struct BuildOutcome {
    pub roster: Roster,
    pub summary: EnrichmentSummary,
    pub output: PathBuf,
}

impl Pipeline {
    /// Open the configured graph backend and check that it answers.
    pub fn connect(config: T32Config) -> T32Result<Self> {
        let graph = open_graph(&config.graph)?;
        graph.probe()?;
        info!("knowledge graph reachable");
        Ok(Self::with_graph(config, graph))
    }

    /// Use an already-open graph. No probe is issued.
    pub fn with_graph(config: T32Config, graph: Box<dyn GraphClient>) -> Self {
        Self { config, graph }
    }

    pub fn read_roster(&self, path: &Path) -> T32Result<Roster> {
        Ok(roster::csv::read_roster(path, &self.config.roster)?)
    }

    pub fn enrich(&self, roster: &mut Roster) -> T32Result<EnrichmentSummary> {
        let enricher = Enricher::new(&*self.graph, &self.config.graph.vocabulary)
            .with_workers(self.config.enrich.workers);
        Ok(enricher.enrich(roster)?)
    }

    /// Assemble and render the report for an enriched roster.
    pub fn render(&self, roster: &Roster) -> T32Result<String> {
        let renderer = report::renderer_for(&self.config.report.format)?;
        let document = report::assemble(roster, &ReportOptions::from(&self.config.report));
        Ok(renderer.render(&document)?)
    }

    /// Read, enrich, and write the report to `report.output`.
    pub fn build(&self, roster_path: &Path) -> T32Result<BuildOutcome> {
        let renderer = report::renderer_for(&self.config.report.format)?;
        let mut roster = self.read_roster(roster_path)?;
        let summary = self.enrich(&mut roster)?;
        let document = report::assemble(&roster, &ReportOptions::from(&self.config.report));
        let output = self.config.report.output.clone();
        report::write_report(&*renderer, &document, &output)?;
        Ok(BuildOutcome {
            roster,
            summary,
            output,
        })
    }
}

/// Open the remote endpoint if one is configured, else a local store loaded
/// from the data files.
pub fn open_graph(config: &GraphConfig) -> T32Result<Box<dyn GraphClient>> {
    if let Some(url) = &config.endpoint {
        let mut endpoint = SparqlEndpoint::new(
            url.as_str(),
            config.prefixes.clone(),
            Duration::from_secs(config.timeout_secs),
        );
        if let (Some(email), Some(password)) = (&config.email, &config.password) {
            endpoint = endpoint.with_credentials(Credentials {
                email: email.clone(),
                password: password.clone(),
            });
        }
        info!(endpoint = %url, "using remote SPARQL endpoint");
        return Ok(Box::new(endpoint));
    }

    if config.data_files.is_empty() {
        return Err(ConfigError::NoGraph.into());
    }
    let store = SparqlStore::in_memory(config.prefixes.clone())?;
    for path in &config.data_files {
        store.load_file(path)?;
    }
    info!(files = config.data_files.len(), quads = store.quad_count()?, "using local RDF snapshot");
    Ok(Box::new(store))
}
