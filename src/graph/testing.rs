//! Scripted [`GraphClient`] for unit tests.

use std::sync::Mutex;

use super::{GraphClient, GraphResult, Prefixes, Query, QueryRow};
use crate::error::GraphError;

enum Answer {
    Rows(Vec<QueryRow>),
    Fail,
}

/// Answers each query with the first rule whose needle occurs in the query
/// text, or with no rows. Every query text is recorded.
#[derive(Default)]
pub(crate) struct ScriptedGraph {
    rules: Vec<(String, Answer)>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, needle: &str, rows: Vec<QueryRow>) -> Self {
        self.rules.push((needle.to_string(), Answer::Rows(rows)));
        self
    }

    pub(crate) fn fail_on(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), Answer::Fail));
        self
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, needle: &str) -> usize {
        self.queries().iter().filter(|q| q.contains(needle)).count()
    }
}

impl GraphClient for ScriptedGraph {
    fn select(&self, query: &Query) -> GraphResult<Vec<QueryRow>> {
        let text = query.render(&Prefixes::empty());
        self.seen.lock().unwrap().push(text.clone());
        match self.rules.iter().find(|(needle, _)| text.contains(needle.as_str())) {
            Some((_, Answer::Rows(rows))) => Ok(rows.clone()),
            Some((_, Answer::Fail)) => Err(GraphError::Transport {
                endpoint: "scripted".into(),
                message: "connection reset".into(),
            }),
            None => Ok(Vec::new()),
        }
    }
}
