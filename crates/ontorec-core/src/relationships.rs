//! Relationship model and pairwise reconciliation.
//!
//! Relationship entities are nodes typed by a configured relationship
//! class; their dimension members are collapsed into equivalence-class
//! elements. Once built, the model is immutable and every unordered pair
//! of relationships is compared in parallel: per-dimension preorder
//! verdicts are narrowed through flag intersection, with a depends-on
//! equivalence fallback producing `DoRelated` when direct comparison is
//! incomparable.

use std::collections::BTreeSet;

use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use tracing::info;

use crate::config::{Config, PreorderKind};
use crate::dimension::{ClassId, DimensionOntology};
use crate::error::ModelError;
use crate::graph::RelationGraph;
use crate::interner::{Interner, NodeId};
use crate::preorder::{CompareContext, OrderResult, Preorder};
use crate::schema::LinkingSchema;

/// Index of a `RelationshipElement` in the model's element arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ElementId(u32);

impl ElementId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

static EMPTY_ELEMENTS: BTreeSet<ElementId> = BTreeSet::new();

/// The equivalence class of a node participating in some relationship
/// dimension. Adjacencies are element indices, not node indices; the
/// instantiated-class and MSCI sets are indexed per dimension ontology.
#[derive(Debug)]
pub struct RelationshipElement {
    pub(crate) id: ElementId,
    pub(crate) nodes: AHashSet<NodeId>,
    pub(crate) part_of: AHashSet<ElementId>,
    pub(crate) depends_on: AHashSet<ElementId>,
    pub(crate) instantiated: Vec<AHashSet<ClassId>>,
    pub(crate) msci: Vec<AHashSet<ClassId>>,
}

impl RelationshipElement {
    fn new(id: ElementId, nodes: AHashSet<NodeId>, ontology_count: usize) -> Self {
        Self {
            id,
            nodes,
            part_of: AHashSet::new(),
            depends_on: AHashSet::new(),
            instantiated: vec![AHashSet::new(); ontology_count],
            msci: vec![AHashSet::new(); ontology_count],
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Node ids represented by this element (an equivalence class).
    pub fn nodes(&self) -> &AHashSet<NodeId> {
        &self.nodes
    }

    pub fn is_part_of(&self, other: ElementId) -> bool {
        self.part_of.contains(&other)
    }

    pub fn depends_on(&self) -> &AHashSet<ElementId> {
        &self.depends_on
    }

    pub fn classes_instantiated(&self, ontology: usize) -> &AHashSet<ClassId> {
        &self.instantiated[ontology]
    }

    /// Most-specific instantiated classes for the given ontology.
    pub fn msci(&self, ontology: usize) -> &AHashSet<ClassId> {
        &self.msci[ontology]
    }
}

/// A relationship node with its per-(dimension, linking predicate) element
/// sets. Relationship identity is the node itself, not its equivalence
/// class.
#[derive(Debug)]
pub struct Relationship {
    node: NodeId,
    dimensions: AHashMap<String, AHashMap<String, BTreeSet<ElementId>>>,
}

impl Relationship {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            dimensions: AHashMap::new(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    fn add_dimension(&mut self, name: &str, predicate: &str, elements: BTreeSet<ElementId>) {
        self.dimensions
            .entry(name.to_string())
            .or_default()
            .insert(predicate.to_string(), elements);
    }

    /// Element set for a (dimension, predicate) pair; absent combinations
    /// are empty sets, never faults.
    pub fn dimension(&self, name: &str, predicate: &str) -> &BTreeSet<ElementId> {
        self.dimensions
            .get(name)
            .and_then(|by_predicate| by_predicate.get(predicate))
            .unwrap_or(&EMPTY_ELEMENTS)
    }
}

/// One configured dimension, resolved against the schema: the expanded
/// linking predicate set and the preorder strategy.
#[derive(Debug)]
struct DimensionRuntime {
    name: String,
    top_classes: Vec<String>,
    predicates: Vec<String>,
    preorder: Preorder,
    depends_on_similarity: bool,
}

/// Ordering verdict for one unordered relationship pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub left: NodeId,
    pub verdict: OrderResult,
    pub right: NodeId,
}

pub struct RelationshipModel {
    elements: Vec<RelationshipElement>,
    relationships: AHashMap<NodeId, Relationship>,
    dimensions: Vec<DimensionRuntime>,
    ontologies: Vec<DimensionOntology>,
    do_related_enabled: bool,
}

impl RelationshipModel {
    /// Builds relationships and their elements from the relation graph.
    /// `ontologies` must be index-aligned with `config.dimensions`.
    pub fn build(
        graph: &RelationGraph,
        schema: &LinkingSchema,
        ontologies: Vec<DimensionOntology>,
        config: &Config,
        interner: &mut Interner,
    ) -> Self {
        debug_assert_eq!(ontologies.len(), config.dimensions.len());

        let dimensions: Vec<DimensionRuntime> = config
            .dimensions
            .iter()
            .enumerate()
            .map(|(index, dimension)| DimensionRuntime {
                name: dimension.name.clone(),
                top_classes: dimension.top_classes.clone(),
                predicates: schema
                    .descendants_expansion(&dimension.top_linking_predicates)
                    .into_iter()
                    .collect(),
                preorder: match dimension.preorder {
                    PreorderKind::PartOf => Preorder::PartOf,
                    PreorderKind::Msci => Preorder::Msci { ontology: index },
                },
                depends_on_similarity: dimension.depends_on_similarity,
            })
            .collect();

        let ontology_count = ontologies.len();
        let mut elements: Vec<RelationshipElement> = Vec::new();
        let mut element_by_node: AHashMap<NodeId, ElementId> = AHashMap::new();
        let mut relationships: AHashMap<NodeId, Relationship> = AHashMap::new();

        info!("building relationships and their elements");
        for relationship_class in &config.relationship_classes {
            let class_id = interner.intern(relationship_class);
            let mut nodes: Vec<NodeId> = graph.nodes_typed_by(class_id).into_iter().collect();
            nodes.sort();
            info!(
                class = %relationship_class,
                count = nodes.len(),
                "collecting typed relationships"
            );

            for relationship_node in nodes {
                if relationships.contains_key(&relationship_node) {
                    continue;
                }
                let mut relationship = Relationship::new(relationship_node);

                for dimension in &dimensions {
                    for predicate in &dimension.predicates {
                        let mut members = BTreeSet::new();
                        for top_class in &dimension.top_classes {
                            let top_class_id = interner.intern(top_class);
                            for node in
                                graph.linked_nodes_typed_by(relationship_node, predicate, top_class_id)
                            {
                                members.insert(element_for_node(
                                    &mut elements,
                                    &mut element_by_node,
                                    graph,
                                    node,
                                    ontology_count,
                                ));
                            }
                        }
                        relationship.add_dimension(&dimension.name, predicate, members);
                    }
                }

                relationships.insert(relationship_node, relationship);
            }
        }

        info!("translating part-of links to element adjacency");
        for (from, to) in graph.part_of_edges() {
            let e1 = element_for_node(&mut elements, &mut element_by_node, graph, from, ontology_count);
            let e2 = element_for_node(&mut elements, &mut element_by_node, graph, to, ontology_count);
            elements[e1.index()].part_of.insert(e2);
        }

        info!("translating depends-on links to element adjacency");
        for (from, to) in graph.depends_on_edges() {
            let e1 = element_for_node(&mut elements, &mut element_by_node, graph, from, ontology_count);
            let e2 = element_for_node(&mut elements, &mut element_by_node, graph, to, ontology_count);
            elements[e1.index()].depends_on.insert(e2);
        }

        info!(elements = elements.len(), "assigning instantiated classes");
        for element in &mut elements {
            // Type adjacency is equivalence-expanded, so any representative
            // node yields the same set.
            let types = match element.nodes.iter().next() {
                Some(&node) => graph.type_adjacency(node),
                None => AHashSet::new(),
            };
            for (index, ontology) in ontologies.iter().enumerate() {
                let instantiated = ontology.classes_from_nodes(&types);
                element.msci[index] = ontology.min(&instantiated);
                element.instantiated[index] = instantiated;
            }
        }

        Self {
            elements,
            relationships,
            dimensions,
            ontologies,
            do_related_enabled: config.do_related_enabled(),
        }
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn contains_relationship(&self, node: NodeId) -> bool {
        self.relationships.contains_key(&node)
    }

    pub fn relationship(&self, node: NodeId) -> Option<&Relationship> {
        self.relationships.get(&node)
    }

    pub fn element(&self, id: ElementId) -> Option<&RelationshipElement> {
        self.elements.get(id.index())
    }

    fn context(&self) -> CompareContext<'_> {
        CompareContext {
            elements: &self.elements,
            ontologies: &self.ontologies,
        }
    }

    /// Combined verdict for one relationship pair: narrow the running
    /// flags through every (dimension, predicate) preorder verdict with
    /// early exit once the intersection is empty, then try the depends-on
    /// fallback.
    pub fn compare(&self, rel1: &Relationship, rel2: &Relationship) -> OrderResult {
        let ctx = self.context();
        let mut flags = OrderResult::Equal.flags();

        'dimensions: for dimension in &self.dimensions {
            for predicate in &dimension.predicates {
                let verdict = dimension.preorder.compare(
                    &ctx,
                    rel1.dimension(&dimension.name, predicate),
                    rel2.dimension(&dimension.name, predicate),
                );
                flags = flags.intersect(verdict.flags());
                if flags.is_empty() {
                    break 'dimensions;
                }
            }
        }

        let result = flags.category();
        if result == OrderResult::Incomparable {
            if let Some(fallback) = self.depends_on_fallback(rel1, rel2) {
                return fallback;
            }
        }
        result
    }

    /// Explain mode: same combination, but every (dimension, predicate)
    /// verdict is evaluated and reported, with no early exit.
    pub fn compare_verbose(&self, rel1: &Relationship, rel2: &Relationship) -> OrderResult {
        let ctx = self.context();
        let mut flags = OrderResult::Equal.flags();

        for dimension in &self.dimensions {
            for predicate in &dimension.predicates {
                let verdict = dimension.preorder.compare(
                    &ctx,
                    rel1.dimension(&dimension.name, predicate),
                    rel2.dimension(&dimension.name, predicate),
                );
                info!(
                    dimension = %dimension.name,
                    predicate = %predicate,
                    verdict = %verdict,
                    "dimension verdict"
                );
                flags = flags.intersect(verdict.flags());
            }
        }

        let mut result = flags.category();
        if result == OrderResult::Incomparable {
            if let Some(fallback) = self.depends_on_fallback(rel1, rel2) {
                result = fallback;
            }
        }
        info!(verdict = %result, "final verdict");
        result
    }

    /// Diagnostic comparison of two relationship nodes; unknown nodes are
    /// reported, not fatal.
    pub fn explain(&self, rel1: NodeId, rel2: NodeId) -> Result<OrderResult, ModelError> {
        let first = self
            .relationships
            .get(&rel1)
            .ok_or_else(|| ModelError::UnknownRelationship(format!("node {}", rel1.raw())))?;
        let second = self
            .relationships
            .get(&rel2)
            .ok_or_else(|| ModelError::UnknownRelationship(format!("node {}", rel2.raw())))?;
        Ok(self.compare_verbose(first, second))
    }

    /// All-pairs reconciliation over the immutable model. Comparisons are
    /// independent and run on the rayon pool; INCOMPARABLE pairs are
    /// dropped.
    pub fn reconcile(&self) -> Vec<ReconciliationResult> {
        let mut nodes: Vec<NodeId> = self.relationships.keys().copied().collect();
        nodes.sort();

        let mut pairs = Vec::with_capacity(nodes.len() * nodes.len().saturating_sub(1) / 2);
        for (i, &left) in nodes.iter().enumerate() {
            for &right in &nodes[i + 1..] {
                pairs.push((left, right));
            }
        }
        info!(
            relationships = nodes.len(),
            pairs = pairs.len(),
            "reconciling relationship pairs"
        );

        pairs
            .into_par_iter()
            .filter_map(|(left, right)| {
                let verdict = self.compare(&self.relationships[&left], &self.relationships[&right]);
                (verdict != OrderResult::Incomparable).then_some(ReconciliationResult {
                    left,
                    verdict,
                    right,
                })
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Depends-on fallback (rule 4)
    // ------------------------------------------------------------------

    /// For each dimension with dependency similarity enabled: some *other*
    /// dimension must be non-empty and fully equivalent, and the
    /// depends-on unions must match in either direction. The two checks
    /// scan all dimensions independently (any-match), not as one paired
    /// (excluded, other) walk.
    fn depends_on_fallback(&self, rel1: &Relationship, rel2: &Relationship) -> Option<OrderResult> {
        if !self.do_related_enabled {
            return None;
        }
        for (index, dimension) in self.dimensions.iter().enumerate() {
            if !dimension.depends_on_similarity {
                continue;
            }
            if !self.other_dimension_nonempty_equivalent(rel1, rel2, index) {
                continue;
            }
            if self.depends_on_equivalent(rel1, rel2, index)
                || self.depends_on_equivalent(rel2, rel1, index)
            {
                return Some(OrderResult::DoRelated);
            }
        }
        None
    }

    /// True if some dimension other than `excluded` is non-empty for rel1
    /// and equivalent for every linking predicate between rel1 and rel2.
    fn other_dimension_nonempty_equivalent(
        &self,
        rel1: &Relationship,
        rel2: &Relationship,
        excluded: usize,
    ) -> bool {
        self.dimensions.iter().enumerate().any(|(index, dimension)| {
            index != excluded
                && self.dimension_nonempty(rel1, dimension)
                && self.all_equivalent(rel1, rel2, dimension)
        })
    }

    fn dimension_nonempty(&self, relationship: &Relationship, dimension: &DimensionRuntime) -> bool {
        dimension
            .predicates
            .iter()
            .any(|predicate| !relationship.dimension(&dimension.name, predicate).is_empty())
    }

    fn all_equivalent(
        &self,
        rel1: &Relationship,
        rel2: &Relationship,
        dimension: &DimensionRuntime,
    ) -> bool {
        let ctx = self.context();
        dimension.predicates.iter().all(|predicate| {
            dimension
                .preorder
                .compare(
                    &ctx,
                    rel1.dimension(&dimension.name, predicate),
                    rel2.dimension(&dimension.name, predicate),
                )
                .flags()
                .is_equivalent()
        })
    }

    /// Depends-on equivalence of the excluded dimension: the union of
    /// depends-on adjacency over rel1's elements must be set-equal to
    /// rel2's union for the same dimension/predicate, or equivalent under
    /// another dimension's preorder against that dimension's element set.
    fn depends_on_equivalent(
        &self,
        rel1: &Relationship,
        rel2: &Relationship,
        do_index: usize,
    ) -> bool {
        let ctx = self.context();
        let do_dimension = &self.dimensions[do_index];

        for (other_index, other) in self.dimensions.iter().enumerate() {
            if other_index == do_index {
                for predicate in &do_dimension.predicates {
                    let union1 =
                        self.depends_on_union(rel1.dimension(&do_dimension.name, predicate));
                    if !union1.is_empty()
                        && union1 == self.depends_on_union(rel2.dimension(&other.name, predicate))
                    {
                        return true;
                    }
                }
            } else {
                for predicate in &do_dimension.predicates {
                    let union1 =
                        self.depends_on_union(rel1.dimension(&do_dimension.name, predicate));
                    if union1.is_empty() {
                        continue;
                    }
                    for other_predicate in &other.predicates {
                        let verdict = other.preorder.compare(
                            &ctx,
                            &union1,
                            rel2.dimension(&other.name, other_predicate),
                        );
                        if verdict.flags().is_equivalent() {
                            return true;
                        }
                    }
                }
            }
        }

        false
    }

    fn depends_on_union(&self, element_ids: &BTreeSet<ElementId>) -> BTreeSet<ElementId> {
        let mut union = BTreeSet::new();
        for &id in element_ids {
            union.extend(self.elements[id.index()].depends_on.iter().copied());
        }
        union
    }
}

/// Element index for a node, creating the element (and the mapping for
/// every equivalence partner) on first use.
fn element_for_node(
    elements: &mut Vec<RelationshipElement>,
    element_by_node: &mut AHashMap<NodeId, ElementId>,
    graph: &RelationGraph,
    node: NodeId,
    ontology_count: usize,
) -> ElementId {
    if let Some(&id) = element_by_node.get(&node) {
        return id;
    }

    let mut nodes = graph.equivalent_nodes(node);
    nodes.insert(node);
    let id = ElementId::new(elements.len() as u32);
    for &member in &nodes {
        element_by_node.insert(member, id);
    }
    elements.push(RelationshipElement::new(id, nodes, ontology_count));
    id
}
