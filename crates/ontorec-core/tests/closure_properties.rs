//! Property tests for the two closure passes: equivalence closure must
//! yield a partition, and the MSCI reduction must yield a covering
//! antichain.

use std::collections::BTreeSet;

use ahash::AHashSet;
use proptest::prelude::*;

use ontorec_core::dimension::ClassId;
use ontorec_core::source::{SAMEAS_PATTERN, SUBCLASSOF_PATTERN};
use ontorec_core::{DimensionOntology, Interner, LinkingSchema, MemorySource, RelationGraph};

const NS: &str = "http://ns.org/";
const UNIVERSE: u8 = 12;

fn uri(n: u8) -> String {
    format!("{NS}C{n:02}")
}

fn build_graph(source: &MemorySource, interner: &mut Interner) -> RelationGraph {
    let schema = LinkingSchema::from_document("", std::iter::empty());
    RelationGraph::build(interner, source, &schema, &[], &[], &[]).unwrap()
}

proptest! {
    /// Symmetric, transitive, irreflexive: equivalence adjacency describes
    /// a partition into components, whatever the raw edge list looked like.
    #[test]
    fn equivalence_closure_is_a_partition(
        edges in proptest::collection::vec((0..UNIVERSE, 0..UNIVERSE), 0..40)
    ) {
        let pairs: Vec<(String, String)> =
            edges.iter().map(|&(a, b)| (uri(a), uri(b))).collect();
        let source = MemorySource::new().with_pairs(SAMEAS_PATTERN, pairs);
        let mut interner = Interner::new();
        let graph = build_graph(&source, &mut interner);

        for n in 0..UNIVERSE {
            let Some(node) = interner.get(&uri(n)) else { continue };
            let partners = graph.equivalent_nodes(node);
            prop_assert!(!partners.contains(&node));
            for &partner in &partners {
                let back = graph.equivalent_nodes(partner);
                prop_assert!(back.contains(&node));
                for &third in &back {
                    prop_assert!(third == node || partners.contains(&third));
                }
            }
        }
    }

    /// The MSCI reduction of any class subset is an antichain that still
    /// covers the subset from below.
    #[test]
    fn msci_is_a_covering_antichain(
        edges in proptest::collection::vec(
            (0..UNIVERSE, 0..UNIVERSE).prop_filter("acyclic", |(a, b)| a < b),
            0..40,
        ),
        selection in 1u16..(1 << UNIVERSE),
    ) {
        let pairs: Vec<(String, String)> =
            edges.iter().map(|&(a, b)| (uri(a), uri(b))).collect();
        let source = MemorySource::new().with_pairs(SUBCLASSOF_PATTERN, pairs);
        let mut interner = Interner::new();
        let graph = build_graph(&source, &mut interner);

        let class_uris: BTreeSet<String> = (0..UNIVERSE).map(uri).collect();
        let ontology = DimensionOntology::build(
            &[NS.to_string()],
            &class_uris,
            &mut interner,
            &graph,
        );

        let selected: AHashSet<ClassId> = (0..UNIVERSE)
            .filter(|n| selection & (1 << n) != 0)
            .filter_map(|n| ontology.class_of(interner.get(&uri(n)).unwrap()))
            .collect();
        let min = ontology.min(&selected);

        // min is a subset of the input.
        prop_assert!(min.iter().all(|c| selected.contains(c)));
        // Antichain: no member subsumes another.
        for &c in &min {
            for &d in &min {
                prop_assert!(c == d || !ontology.is_subsumed(c, d));
            }
        }
        // Coverage: every selected class has a selected descendant-or-self
        // in the reduction.
        for &c in &selected {
            prop_assert!(min.iter().any(|&m| ontology.is_subsumed(m, c)));
        }
    }
}
