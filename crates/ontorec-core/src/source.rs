//! Query-layer seam.
//!
//! The core consumes pre-filtered result sets through `TripleSource` and
//! never issues network requests itself. The SPARQL client in
//! `ontorec-sparql` implements this trait against a live endpoint;
//! `MemorySource` serves fixtures for tests and offline runs.
//!
//! Patterns are graph-pattern fragments (the `WHERE` body); the query
//! layer owns the surrounding `SELECT`, pagination and retry policy.

use std::collections::HashSet;

use ahash::AHashMap;
use anyhow::Result;

pub const SAMEAS_PATTERN: &str = "?e1 owl:sameAs ?e2 . ";
pub const SUBCLASSOF_PATTERN: &str = "?e1 rdfs:subClassOf ?e2 . ";
pub const TYPE_PATTERN: &str = "?e1 rdf:type ?e2 . ";

/// Pattern selecting all `?e1 <predicate> ?e2` edges.
pub fn predicate_pair_pattern(predicate: &str) -> String {
    format!("?e1 <{predicate}> ?e2 . ")
}

pub trait TripleSource {
    /// Distinct `?e` bindings for a single-variable pattern.
    fn select_terms(&self, pattern: &str) -> Result<HashSet<String>>;

    /// Distinct `(?e1, ?e2)` bindings for a two-variable pattern.
    fn select_pairs(&self, pattern: &str) -> Result<Vec<(String, String)>>;
}

/// In-memory `TripleSource` keyed by exact pattern string. Unregistered
/// patterns yield empty result sets, mirroring a store with no matches.
#[derive(Debug, Default)]
pub struct MemorySource {
    terms: AHashMap<String, HashSet<String>>,
    pairs: AHashMap<String, Vec<(String, String)>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_terms<I, S>(mut self, pattern: &str, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms
            .entry(pattern.to_string())
            .or_default()
            .extend(terms.into_iter().map(Into::into));
        self
    }

    pub fn with_pairs<I, S>(mut self, pattern: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        self.pairs
            .entry(pattern.to_string())
            .or_default()
            .extend(pairs.into_iter().map(|(a, b)| (a.into(), b.into())));
        self
    }

    /// Registers `?e1 <predicate> ?e2` edges under the canonical pattern.
    pub fn with_predicate_pairs<I, S>(self, predicate: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let pattern = predicate_pair_pattern(predicate);
        self.with_pairs(&pattern, pairs)
    }
}

impl TripleSource for MemorySource {
    fn select_terms(&self, pattern: &str) -> Result<HashSet<String>> {
        Ok(self.terms.get(pattern).cloned().unwrap_or_default())
    }

    fn select_pairs(&self, pattern: &str) -> Result<Vec<(String, String)>> {
        Ok(self.pairs.get(pattern).cloned().unwrap_or_default())
    }
}
