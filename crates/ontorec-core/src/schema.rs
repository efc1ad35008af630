//! Linking-predicate schema model.
//!
//! The schema document declares the hierarchy of linking predicates used
//! to connect relationship entities to their dimension members:
//! `rdfs:subPropertyOf` edges, `owl:inverseOf` pairs, and
//! `owl:SymmetricProperty` typing. From a seed set of predicate URIs this
//! module computes transitive ancestor/descendant/inverse sets, pulling
//! every predicate discovered through those sets into the model.
//!
//! The document is parsed from a simple N-Triples-like syntax: one triple
//! per line, `<iri>` or prefixed terms, terminated by `.`. Malformed lines
//! are skipped.

use std::collections::{BTreeSet, VecDeque};

use ahash::{AHashMap, AHashSet};

use crate::error::ModelError;

const RDFS_SUB_PROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
const OWL_INVERSE_OF: &str = "http://www.w3.org/2002/07/owl#inverseOf";
const OWL_SYMMETRIC_PROPERTY: &str = "http://www.w3.org/2002/07/owl#SymmetricProperty";
const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

#[derive(Debug, Default, Clone)]
struct PredicateInfo {
    ancestors: AHashSet<String>,
    descendants: AHashSet<String>,
    inverses: AHashSet<String>,
}

/// Per-predicate transitive hierarchy computed over the schema document.
#[derive(Debug, Default)]
pub struct LinkingSchema {
    predicates: AHashMap<String, PredicateInfo>,
}

/// Direct edges extracted from the document, before transitive closure.
#[derive(Debug, Default)]
struct SchemaDocument {
    supers: AHashMap<String, AHashSet<String>>,
    subs: AHashMap<String, AHashSet<String>>,
    inverses: AHashMap<String, AHashSet<String>>,
    symmetric: AHashSet<String>,
}

impl LinkingSchema {
    pub fn from_path<I>(path: &std::path::Path, seeds: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = String>,
    {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_document(&text, seeds))
    }

    /// Builds the schema model from document text and seed predicates.
    /// Predicates reachable from a seed through ancestor, descendant or
    /// inverse sets are explored as well (worklist).
    pub fn from_document<I>(document: &str, seeds: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let doc = parse_document(document);

        let mut schema = Self::default();
        let mut queue: VecDeque<String> = seeds.into_iter().collect();
        let mut seen: AHashSet<String> = queue.iter().cloned().collect();

        while let Some(predicate) = queue.pop_front() {
            let ancestors = transitive(&doc.supers, &predicate);
            let descendants = transitive(&doc.subs, &predicate);
            let mut inverses = doc.inverses.get(&predicate).cloned().unwrap_or_default();
            if doc.symmetric.contains(&predicate) {
                inverses.insert(predicate.clone());
            }

            for discovered in ancestors.iter().chain(&descendants).chain(&inverses) {
                if !schema.predicates.contains_key(discovered) && seen.insert(discovered.clone()) {
                    queue.push_back(discovered.clone());
                }
            }

            schema.predicates.insert(
                predicate,
                PredicateInfo {
                    ancestors,
                    descendants,
                    inverses,
                },
            );
        }

        schema
    }

    /// Every predicate in the model, sorted for deterministic traversal.
    pub fn predicate_uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.predicates.keys().cloned().collect();
        uris.sort();
        uris
    }

    pub fn ancestors(&self, predicate: &str) -> Vec<String> {
        self.sorted_field(predicate, |info| &info.ancestors)
    }

    pub fn inverses(&self, predicate: &str) -> Vec<String> {
        self.sorted_field(predicate, |info| &info.inverses)
    }

    /// Seed predicates plus all their descendants. Used to expand a
    /// dimension's top linking predicates into the concrete predicates
    /// whose adjacencies are compared.
    pub fn descendants_expansion<'a, I>(&self, seeds: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut expanded = BTreeSet::new();
        for seed in seeds {
            expanded.insert(seed.clone());
            if let Some(info) = self.predicates.get(seed) {
                expanded.extend(info.descendants.iter().cloned());
            }
        }
        expanded
    }

    fn sorted_field<F>(&self, predicate: &str, field: F) -> Vec<String>
    where
        F: Fn(&PredicateInfo) -> &AHashSet<String>,
    {
        let mut values: Vec<String> = self
            .predicates
            .get(predicate)
            .map(|info| field(info).iter().cloned().collect())
            .unwrap_or_default();
        values.sort();
        values
    }
}

fn parse_document(document: &str) -> SchemaDocument {
    let mut doc = SchemaDocument::default();

    for line in document.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }

        let subject = extract_iri(parts[0]);
        let predicate = extract_iri(parts[1]);
        let object = parts[2..parts.len() - 1].join(" ");
        let object = extract_iri(&object);

        match predicate.as_str() {
            "rdfs:subPropertyOf" | RDFS_SUB_PROPERTY_OF => {
                doc.supers
                    .entry(subject.clone())
                    .or_default()
                    .insert(object.clone());
                doc.subs.entry(object).or_default().insert(subject);
            }
            "owl:inverseOf" | OWL_INVERSE_OF => {
                doc.inverses
                    .entry(subject.clone())
                    .or_default()
                    .insert(object.clone());
                doc.inverses.entry(object).or_default().insert(subject);
            }
            "rdf:type" | "a" | RDF_TYPE => {
                if object == "owl:SymmetricProperty" || object == OWL_SYMMETRIC_PROPERTY {
                    doc.symmetric.insert(subject);
                }
            }
            _ => {}
        }
    }

    doc
}

/// Transitive closure of `edges` from `start`, excluding `start` itself
/// unless it lies on a cycle.
fn transitive(edges: &AHashMap<String, AHashSet<String>>, start: &str) -> AHashSet<String> {
    let mut reached = AHashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if let Some(nexts) = edges.get(current) {
            for next in nexts {
                if reached.insert(next.clone()) {
                    queue.push_back(next.as_str());
                }
            }
        }
    }

    reached
}

fn extract_iri(term: &str) -> String {
    term.trim_start_matches('<').trim_end_matches('>').to_string()
}
