//! Parallel term queries over independent patterns.

use std::collections::{BTreeSet, HashSet};

use anyhow::Result;
use rayon::prelude::*;
use tracing::info;

use ontorec_core::dimension::class_discovery_patterns;
use ontorec_core::TripleSource;

/// Runs every term pattern on the rayon pool and unions the results.
/// Patterns are independent selects, so failures surface individually.
pub fn select_terms_batch<S>(source: &S, patterns: &[String]) -> Result<HashSet<String>>
where
    S: TripleSource + Sync,
{
    let sets: Vec<HashSet<String>> = patterns
        .par_iter()
        .map(|pattern| source.select_terms(pattern))
        .collect::<Result<_>>()?;
    Ok(sets.into_iter().flatten().collect())
}

/// Class URIs of a dimension namespace: union of the discovery patterns
/// over every base URI, sorted for deterministic ontology construction.
pub fn discover_classes<S>(source: &S, base_uris: &[String]) -> Result<BTreeSet<String>>
where
    S: TripleSource + Sync,
{
    let patterns: Vec<String> = base_uris
        .iter()
        .flat_map(|base| class_discovery_patterns(base))
        .collect();
    let classes: BTreeSet<String> = select_terms_batch(source, &patterns)?
        .into_iter()
        .collect();
    info!(
        namespaces = base_uris.len(),
        classes = classes.len(),
        "discovered dimension classes"
    );
    Ok(classes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontorec_core::MemorySource;

    #[test]
    fn batch_unions_pattern_results() {
        let source = MemorySource::new()
            .with_terms("?e rdf:type owl:Class . ", ["http://ns.org/A", "http://ns.org/B"])
            .with_terms("?s rdf:type ?e . ", ["http://ns.org/B", "http://ns.org/C"]);
        let terms = select_terms_batch(
            &source,
            &["?e rdf:type owl:Class . ".to_string(), "?s rdf:type ?e . ".to_string()],
        )
        .unwrap();
        assert_eq!(terms.len(), 3);
    }

    #[test]
    fn discovery_queries_every_pattern_of_every_namespace() {
        let patterns = class_discovery_patterns("http://ns.org/");
        let source = MemorySource::new()
            .with_terms(&patterns[0], ["http://ns.org/Declared"])
            .with_terms(&patterns[2], ["http://ns.org/Super"]);
        let classes = discover_classes(&source, &["http://ns.org/".to_string()]).unwrap();
        assert_eq!(
            classes.into_iter().collect::<Vec<_>>(),
            vec!["http://ns.org/Declared".to_string(), "http://ns.org/Super".to_string()]
        );
    }
}
