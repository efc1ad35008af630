//! Dimension ontologies: per comparison axis, the classes of a configured
//! namespace grouped by equivalence, with an ancestor/descendant index and
//! the most-specific-classes (MSCI) reduction.
//!
//! The namespace is the boundary rule: an equivalence partner outside the
//! configured base URIs never becomes a class member, an ancestor or a
//! descendant, even when equivalence-linked to an in-namespace class.

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use ahash::{AHashMap, AHashSet};
use tracing::info;

use crate::graph::RelationGraph;
use crate::interner::{Interner, NodeId};

/// Index of an `OntologyClass` within its `DimensionOntology`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ClassId(u32);

impl ClassId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// An equivalence class of in-namespace nodes, with its irreflexive
/// ancestor/descendant sets (class indices, derived from hierarchy
/// expansion, excluding self).
#[derive(Debug, Default)]
struct OntologyClass {
    members: AHashSet<NodeId>,
    ancestors: AHashSet<ClassId>,
    descendants: AHashSet<ClassId>,
}

#[derive(Debug, Default)]
pub struct DimensionOntology {
    /// Sorted, deduplicated base URI prefixes; the ontology's identity.
    base_uris: Vec<String>,
    class_by_node: AHashMap<NodeId, ClassId>,
    classes: Vec<OntologyClass>,
}

impl DimensionOntology {
    /// Builds the ontology from externally discovered class URIs. With an
    /// empty namespace the ontology stays empty (part-of dimensions carry
    /// no ontology).
    pub fn build(
        base_uris: &[String],
        class_uris: &BTreeSet<String>,
        interner: &mut Interner,
        graph: &RelationGraph,
    ) -> Self {
        let mut base: Vec<String> = base_uris.to_vec();
        base.sort();
        base.dedup();

        let mut ontology = Self {
            base_uris: base,
            ..Self::default()
        };
        if ontology.base_uris.is_empty() {
            return ontology;
        }

        for class_uri in class_uris {
            let node = interner.intern(class_uri);
            if ontology.class_by_node.contains_key(&node) {
                continue;
            }

            // Group the class with its equivalence partners, keeping only
            // partners inside the namespace.
            let mut members: AHashSet<NodeId> = [node].into_iter().collect();
            for partner in graph.equivalent_nodes(node) {
                if interner
                    .resolve(partner)
                    .is_some_and(|uri| ontology.in_namespace(uri))
                {
                    members.insert(partner);
                }
            }

            let class_id = ClassId::new(ontology.classes.len() as u32);
            for &member in &members {
                ontology.class_by_node.insert(member, class_id);
            }
            ontology.classes.push(OntologyClass {
                members,
                ..OntologyClass::default()
            });
        }

        for index in 0..ontology.classes.len() {
            let current = ClassId::new(index as u32);
            let expansion = graph.expand_equivalence_hierarchy(&ontology.classes[index].members);

            let mut ancestors = Vec::new();
            for node in expansion {
                let Some(uri) = interner.resolve(node) else {
                    continue;
                };
                if !ontology.in_namespace(uri) {
                    continue;
                }
                if let Some(&ancestor) = ontology.class_by_node.get(&node) {
                    if ancestor != current {
                        ancestors.push(ancestor);
                    }
                }
            }
            for ancestor in ancestors {
                ontology.classes[index].ancestors.insert(ancestor);
                ontology.classes[ancestor.index()].descendants.insert(current);
            }
        }

        info!(
            namespace = ?ontology.base_uris,
            classes = ontology.classes.len(),
            "built dimension ontology"
        );
        ontology
    }

    /// Class indices instantiated by any of the given nodes. Nodes not
    /// belonging to any class are skipped.
    pub fn classes_from_nodes(&self, nodes: &AHashSet<NodeId>) -> AHashSet<ClassId> {
        nodes
            .iter()
            .filter_map(|node| self.class_by_node.get(node).copied())
            .collect()
    }

    /// Antichain of most-specific classes: `c` is kept iff no other class
    /// `d` in the set has `c` among its ancestors.
    pub fn min(&self, class_ids: &AHashSet<ClassId>) -> AHashSet<ClassId> {
        class_ids
            .iter()
            .copied()
            .filter(|&c| {
                !class_ids
                    .iter()
                    .any(|&d| d != c && self.classes[d.index()].ancestors.contains(&c))
            })
            .collect()
    }

    /// `c1 <= c2` in the subsumption order (ancestors are less specific).
    pub fn is_subsumed(&self, c1: ClassId, c2: ClassId) -> bool {
        c1 == c2 || self.classes[c1.index()].ancestors.contains(&c2)
    }

    pub fn base_uris(&self) -> &[String] {
        &self.base_uris
    }

    pub fn in_namespace(&self, uri: &str) -> bool {
        self.base_uris.iter().any(|base| uri.starts_with(base))
    }

    pub fn class_of(&self, node: NodeId) -> Option<ClassId> {
        self.class_by_node.get(&node).copied()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn members(&self, class: ClassId) -> impl Iterator<Item = NodeId> + '_ {
        self.classes[class.index()].members.iter().copied()
    }

    pub fn ancestors(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.classes[class.index()].ancestors.iter().copied()
    }

    pub fn descendants(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.classes[class.index()].descendants.iter().copied()
    }
}

/// Identity is the configured namespace: two ontologies over the same base
/// URIs are the same comparison space.
impl PartialEq for DimensionOntology {
    fn eq(&self, other: &Self) -> bool {
        self.base_uris == other.base_uris
    }
}

impl Eq for DimensionOntology {}

impl Hash for DimensionOntology {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base_uris.hash(state);
    }
}

/// Graph patterns discovering the class URIs of a namespace: declared
/// classes, classes used as a type, and both ends of subclass edges.
pub fn class_discovery_patterns(base_uri: &str) -> [String; 4] {
    [
        format!("?e rdf:type owl:Class . FILTER(REGEX(STR(?e), \"{base_uri}\", \"i\")) . "),
        format!("?s rdf:type ?e . FILTER(REGEX(STR(?e), \"{base_uri}\", \"i\")) . "),
        format!("?s rdfs:subClassOf ?e . FILTER(REGEX(STR(?e), \"{base_uri}\", \"i\")) . "),
        format!("?e rdfs:subClassOf ?s . FILTER(REGEX(STR(?e), \"{base_uri}\", \"i\")) . "),
    ]
}
