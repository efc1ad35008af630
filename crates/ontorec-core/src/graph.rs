//! Relation graph: the in-memory multi-relation view of the knowledge base.
//!
//! Holds five adjacency families over interned node ids (equivalence,
//! hierarchy, type, part-of, depends-on) plus one adjacency per linking
//! predicate. Raw edge lists come from the query layer; this module only
//! closes and expands them:
//!
//! - equivalence (`owl:sameAs`) is closed under symmetry and transitivity,
//! - type (`rdf:type`) is expanded so equivalent instances share one type
//!   set, itself closed under equivalence + hierarchy expansion,
//! - part-of merges the inverse direction of the has-part predicates,
//! - linking adjacencies are completed with declared inverses and unioned
//!   into their predicate ancestors.

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};
use tracing::info;

use crate::error::ModelError;
use crate::interner::{Interner, NodeId};
use crate::schema::LinkingSchema;
use crate::source::{
    predicate_pair_pattern, TripleSource, SAMEAS_PATTERN, SUBCLASSOF_PATTERN, TYPE_PATTERN,
};

type Adjacency = AHashMap<NodeId, AHashSet<NodeId>>;

#[derive(Debug, Default)]
pub struct RelationGraph {
    equivalence: Adjacency,
    hierarchy: Adjacency,
    types: Adjacency,
    part_of: Adjacency,
    depends_on: Adjacency,
    linking: AHashMap<String, Adjacency>,
}

impl RelationGraph {
    /// Builds the graph from the query layer: ingests the raw edge lists,
    /// then runs the closure/expansion passes in dependency order
    /// (equivalence before types, linking inverses before ancestors).
    pub fn build(
        interner: &mut Interner,
        source: &dyn TripleSource,
        schema: &LinkingSchema,
        part_of_predicates: &[String],
        has_part_predicates: &[String],
        depends_on_predicates: &[String],
    ) -> Result<Self, ModelError> {
        let mut graph = Self::default();

        info!("querying owl:sameAs edges");
        let edges = source.select_pairs(SAMEAS_PATTERN)?;
        ingest_pairs(&mut graph.equivalence, interner, &edges);
        info!(nodes = graph.equivalence.len(), "closing equivalence adjacency");
        graph.close_equivalence();

        info!("querying rdfs:subClassOf edges");
        let edges = source.select_pairs(SUBCLASSOF_PATTERN)?;
        ingest_pairs(&mut graph.hierarchy, interner, &edges);

        info!("querying rdf:type edges");
        let edges = source.select_pairs(TYPE_PATTERN)?;
        ingest_pairs(&mut graph.types, interner, &edges);
        info!(nodes = graph.types.len(), "expanding type adjacency");
        graph.expand_types();

        info!("building part-of adjacency");
        for predicate in part_of_predicates {
            let edges = source.select_pairs(&predicate_pair_pattern(predicate))?;
            ingest_pairs(&mut graph.part_of, interner, &edges);
        }
        for predicate in has_part_predicates {
            // has-part is the inverse of part-of: record the reversed edge.
            let edges = source.select_pairs(&predicate_pair_pattern(predicate))?;
            let reversed: Vec<(String, String)> =
                edges.into_iter().map(|(a, b)| (b, a)).collect();
            ingest_pairs(&mut graph.part_of, interner, &reversed);
        }

        info!("building depends-on adjacency");
        for predicate in depends_on_predicates {
            let edges = source.select_pairs(&predicate_pair_pattern(predicate))?;
            ingest_pairs(&mut graph.depends_on, interner, &edges);
        }

        for predicate in schema.predicate_uris() {
            info!(predicate = %predicate, "querying linking predicate edges");
            let edges = source.select_pairs(&predicate_pair_pattern(&predicate))?;
            let adjacency = graph.linking.entry(predicate).or_default();
            ingest_pairs(adjacency, interner, &edges);
        }
        info!("completing linking adjacencies with inverses and ancestors");
        graph.complete_linking(schema);

        Ok(graph)
    }

    /// Symmetric closure, then connected components over the unprocessed
    /// nodes; every component member receives the component minus itself.
    fn close_equivalence(&mut self) {
        let mut reversed = Vec::new();
        for (&node, neighbors) in &self.equivalence {
            for &neighbor in neighbors {
                reversed.push((neighbor, node));
            }
        }
        for (node, neighbor) in reversed {
            self.equivalence.entry(node).or_default().insert(neighbor);
        }

        let mut remaining: AHashSet<NodeId> = self.equivalence.keys().copied().collect();
        while let Some(&seed) = remaining.iter().next() {
            let component = self.equivalence_component(seed);
            for &node in &component {
                let mut adjacency = component.clone();
                adjacency.remove(&node);
                self.equivalence.insert(node, adjacency);
                remaining.remove(&node);
            }
        }
    }

    /// BFS over the symmetric adjacency, including the seed.
    fn equivalence_component(&self, seed: NodeId) -> AHashSet<NodeId> {
        let mut component: AHashSet<NodeId> = [seed].into_iter().collect();
        let mut queue = VecDeque::from([seed]);

        while let Some(node) = queue.pop_front() {
            if let Some(neighbors) = self.equivalence.get(&node) {
                for &neighbor in neighbors {
                    if component.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        component
    }

    /// Unions each node's type set with those of its equivalence partners,
    /// closes the result under equivalence + hierarchy expansion, and
    /// assigns it to the node and every partner. Partners already assigned
    /// are skipped on the next iteration.
    fn expand_types(&mut self) {
        let mut remaining: AHashSet<NodeId> = self.types.keys().copied().collect();

        while let Some(&node) = remaining.iter().next() {
            remaining.remove(&node);

            let mut expansion = self.types.get(&node).cloned().unwrap_or_default();
            if let Some(partners) = self.equivalence.get(&node) {
                for partner in partners {
                    if let Some(types) = self.types.get(partner) {
                        expansion.extend(types.iter().copied());
                    }
                }
            }
            let expansion = expand_fixed_point(&self.equivalence, &self.hierarchy, &expansion);

            self.types.insert(node, expansion.clone());
            if let Some(partners) = self.equivalence.get(&node).cloned() {
                for partner in partners {
                    remaining.remove(&partner);
                    self.types.insert(partner, expansion.clone());
                }
            }
        }
    }

    fn complete_linking(&mut self, schema: &LinkingSchema) {
        for predicate in schema.predicate_uris() {
            let inverses = schema.inverses(&predicate);
            if inverses.is_empty() {
                continue;
            }
            let edges = self.linking_edges(&predicate);
            for inverse in inverses {
                let adjacency = self.linking.entry(inverse).or_default();
                for &(from, to) in &edges {
                    adjacency.entry(to).or_default().insert(from);
                }
            }
        }

        for predicate in schema.predicate_uris() {
            let ancestors = schema.ancestors(&predicate);
            if ancestors.is_empty() {
                continue;
            }
            let edges = self.linking_edges(&predicate);
            for ancestor in ancestors {
                let adjacency = self.linking.entry(ancestor).or_default();
                for &(from, to) in &edges {
                    adjacency.entry(from).or_default().insert(to);
                }
            }
        }
    }

    fn linking_edges(&self, predicate: &str) -> Vec<(NodeId, NodeId)> {
        let Some(adjacency) = self.linking.get(predicate) else {
            return Vec::new();
        };
        adjacency
            .iter()
            .flat_map(|(&from, targets)| targets.iter().map(move |&to| (from, to)))
            .collect()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All nodes equivalent to `node`, excluding `node` itself.
    pub fn equivalent_nodes(&self, node: NodeId) -> AHashSet<NodeId> {
        self.equivalence.get(&node).cloned().unwrap_or_default()
    }

    /// Fixed-point expansion of `seed` following equivalence and hierarchy
    /// edges until no new node is added. Includes the seed nodes.
    pub fn expand_equivalence_hierarchy(&self, seed: &AHashSet<NodeId>) -> AHashSet<NodeId> {
        expand_fixed_point(&self.equivalence, &self.hierarchy, seed)
    }

    /// Nodes whose expanded type adjacency contains `class_id`.
    pub fn nodes_typed_by(&self, class_id: NodeId) -> AHashSet<NodeId> {
        self.types
            .iter()
            .filter(|(_, types)| types.contains(&class_id))
            .map(|(&node, _)| node)
            .collect()
    }

    /// Nodes reachable from `node` via `predicate` and typed by `class_id`.
    /// Equivalence is not applied to the seed or the returned nodes.
    pub fn linked_nodes_typed_by(
        &self,
        node: NodeId,
        predicate: &str,
        class_id: NodeId,
    ) -> AHashSet<NodeId> {
        let mut found = AHashSet::new();
        if let Some(targets) = self.linking.get(predicate).and_then(|adj| adj.get(&node)) {
            for &target in targets {
                if self
                    .types
                    .get(&target)
                    .is_some_and(|types| types.contains(&class_id))
                {
                    found.insert(target);
                }
            }
        }
        found
    }

    pub fn part_of_edges(&self) -> Vec<(NodeId, NodeId)> {
        edge_list(&self.part_of)
    }

    pub fn depends_on_edges(&self) -> Vec<(NodeId, NodeId)> {
        edge_list(&self.depends_on)
    }

    /// Expanded type set of `node` (empty when the node has no type edge).
    pub fn type_adjacency(&self, node: NodeId) -> AHashSet<NodeId> {
        self.types.get(&node).cloned().unwrap_or_default()
    }
}

fn ingest_pairs(adjacency: &mut Adjacency, interner: &mut Interner, edges: &[(String, String)]) {
    for (from, to) in edges {
        let from = interner.intern(from);
        let to = interner.intern(to);
        adjacency.entry(to).or_default();
        adjacency.entry(from).or_default().insert(to);
    }
}

fn edge_list(adjacency: &Adjacency) -> Vec<(NodeId, NodeId)> {
    let mut edges: Vec<(NodeId, NodeId)> = adjacency
        .iter()
        .flat_map(|(&from, targets)| targets.iter().map(move |&to| (from, to)))
        .collect();
    edges.sort();
    edges
}

fn expand_fixed_point(
    equivalence: &Adjacency,
    hierarchy: &Adjacency,
    seed: &AHashSet<NodeId>,
) -> AHashSet<NodeId> {
    let mut expanded = seed.clone();
    let mut frontier: Vec<NodeId> = seed.iter().copied().collect();

    while let Some(node) = frontier.pop() {
        for adjacency in [equivalence, hierarchy] {
            if let Some(neighbors) = adjacency.get(&node) {
                for &neighbor in neighbors {
                    if expanded.insert(neighbor) {
                        frontier.push(neighbor);
                    }
                }
            }
        }
    }

    expanded
}
