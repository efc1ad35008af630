//! SPARQL query layer for the reconciliation core.
//!
//! [`SparqlClient`] implements `ontorec_core::TripleSource` against a live
//! endpoint speaking the SPARQL 1.1 JSON results format. The client owns
//! everything the core deliberately does not: query assembly around the
//! graph-pattern fragments, the HTTP surface, the count-consistency check,
//! and the retry policy for endpoints that drop or truncate responses
//! under load.

mod batch;
mod client;

pub use batch::{discover_classes, select_terms_batch};
pub use client::{SparqlClient, SparqlError};
