//! Relationship reconciliation core.
//!
//! Builds an in-memory multi-relation graph over interned node ids, closed
//! under `owl:sameAs` equivalence and `rdfs:subClassOf` hierarchy semantics,
//! groups classes into per-dimension ontologies, and orders every pair of
//! relationship entities through a small preorder algebra. The output is a
//! set of ordering verdicts consumable as RDF triples.
//!
//! The core never talks to the network: edge lists and class URIs arrive
//! through the [`source::TripleSource`] seam, implemented by the
//! `ontorec-sparql` crate (or by [`source::MemorySource`] in tests).
//!
//! ## Module organization
//!
//! - `interner`: URI <-> dense node id cache
//! - `config`: JSON configuration surface and validation
//! - `source`: query-layer seam (`TripleSource`)
//! - `schema`: linking-predicate hierarchy loaded from a schema document
//! - `graph`: equivalence/hierarchy/type/part-of/depends-on adjacencies
//! - `dimension`: namespace-scoped class ontologies with MSCI reduction
//! - `preorder`: ordering verdicts and the two comparison strategies
//! - `relationships`: relationship model and pairwise reconciliation

pub mod config;
pub mod dimension;
pub mod error;
pub mod graph;
pub mod interner;
pub mod preorder;
pub mod relationships;
pub mod schema;
pub mod source;

pub use config::{Config, DimensionConfig, PreorderKind};
pub use dimension::{ClassId, DimensionOntology};
pub use error::ModelError;
pub use graph::RelationGraph;
pub use interner::{Interner, NodeId};
pub use preorder::{OrderFlags, OrderResult, Preorder};
pub use relationships::{
    ElementId, ReconciliationResult, Relationship, RelationshipElement, RelationshipModel,
};
pub use schema::LinkingSchema;
pub use source::{MemorySource, TripleSource};
