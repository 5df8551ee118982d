//! Enrichment passes: write graph facts and local tallies onto a roster.
//!
//! Units are enriched before faculty. Each record is enriched independently,
//! and every field a pass writes is recomputed from scratch, so running a pass
//! twice against an unchanged graph gives the same roster.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::EnrichError;
use crate::graph::GraphClient;
use crate::roster::{Flag, Roster, RosterRecord};

use super::attribute::{LABEL, fetch_attribute};
use super::person::fetch_person;
use super::resolve::EntityResolver;
use super::stats::aggregate_unit_statistics;
use super::{
    EnrichResult, EnrichmentSummary, FacultyRecord, TraineeTallies, UnitTallies, Vocabulary,
};

/// Runs the enrichment passes against one graph.
pub struct Enricher<'a> {
    graph: &'a dyn GraphClient,
    vocabulary: &'a Vocabulary,
    workers: usize,
}

impl<'a> Enricher<'a> {
    pub fn new(graph: &'a dyn GraphClient, vocabulary: &'a Vocabulary) -> Self {
        Self {
            graph,
            vocabulary,
            workers: 1,
        }
    }

    /// Run up to `workers` record lookups concurrently. Output order is
    /// unaffected.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Enrich units, then faculty, and report what stayed unresolved.
    pub fn enrich(&self, roster: &mut Roster) -> EnrichResult<EnrichmentSummary> {
        self.enrich_units(roster)?;
        self.enrich_faculty(roster)?;
        let summary = roster.unresolved();
        info!(
            units = roster.units.len(),
            unresolved_units = summary.unresolved_units.len(),
            faculty = roster.faculty.len(),
            unresolved_faculty = summary.unresolved_faculty.len(),
            "enrichment finished"
        );
        Ok(summary)
    }

    /// Resolve each unit and set its label, graph statistics and local tallies.
    pub fn enrich_units(&self, roster: &mut Roster) -> EnrichResult<()> {
        let Roster {
            units,
            faculty,
            predocs,
            postdocs,
            ..
        } = roster;
        let (faculty, predocs, postdocs) = (&*faculty, &*predocs, &*postdocs);
        let resolver = EntityResolver::new(self.graph, self.vocabulary);

        self.for_each(units, |unit| {
            let entity = resolver.resolve_unit(&unit.record.unit_code);
            unit.label = fetch_attribute(self.graph, entity.as_ref(), LABEL)
                .map(|term| term.lexical().to_string());
            unit.statistics =
                aggregate_unit_statistics(self.graph, self.vocabulary, entity.as_ref());
            unit.entity = entity;
            unit.tallies = unit_tallies(&unit.record.unit_code, faculty, predocs, postdocs);
        })
    }

    /// Resolve each faculty member and set rank, degrees and positions.
    pub fn enrich_faculty(&self, roster: &mut Roster) -> EnrichResult<()> {
        let resolver = EntityResolver::new(self.graph, self.vocabulary);
        self.for_each(&mut roster.faculty, |member| {
            let entity = match member.record.person_id.as_deref() {
                Some(id) => resolver.resolve_person(id),
                None => {
                    debug!(row = member.record.key.0, "faculty row has no person identifier");
                    None
                }
            };
            let facts = fetch_person(self.graph, entity.as_ref()).unwrap_or_default();
            member.entity = entity;
            member.rank = facts.preferred_title;
            member.degrees = facts.degrees;
            member.positions = facts.positions;
        })
    }

    fn for_each<T, F>(&self, records: &mut [T], enrich: F) -> EnrichResult<()>
    where
        T: Send,
        F: Fn(&mut T) + Send + Sync,
    {
        if self.workers <= 1 || records.len() <= 1 {
            records.iter_mut().for_each(enrich);
            return Ok(());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| EnrichError::WorkerPool {
                message: e.to_string(),
            })?;
        pool.install(|| records.par_iter_mut().for_each(enrich));
        Ok(())
    }
}

/// Number of faculty rows whose unit code equals `unit_code` exactly.
pub fn count_participating_faculty(unit_code: &str, faculty: &[FacultyRecord]) -> u64 {
    faculty
        .iter()
        .filter(|member| member.record.unit_code == unit_code)
        .count() as u64
}

/// Participation and flag counts of the trainees whose unit code equals `unit_code`.
pub fn tally_trainees(unit_code: &str, trainees: &[RosterRecord]) -> TraineeTallies {
    let mut tallies = TraineeTallies::default();
    for trainee in trainees.iter().filter(|t| t.unit_code == unit_code) {
        tallies.participating += 1;
        let marked = |flag| u64::from(trainee.flags.is_marked(flag));
        tallies.tge += marked(Flag::TargetedGroupEligible);
        tallies.urm += marked(Flag::UnderrepresentedMinority);
        tallies.disabilities += marked(Flag::Disability);
        tallies.disadvantaged += marked(Flag::DisadvantagedBackground);
    }
    tallies
}

fn unit_tallies(
    unit_code: &str,
    faculty: &[FacultyRecord],
    predocs: &[RosterRecord],
    postdocs: &[RosterRecord],
) -> UnitTallies {
    UnitTallies {
        faculty_participating: count_participating_faculty(unit_code, faculty),
        predoc: tally_trainees(unit_code, predocs),
        postdoc: tally_trainees(unit_code, postdocs),
    }
}
