//! Workspace smoke test: configuration parsing through reconciliation
//! against an in-memory knowledge base.

use std::collections::BTreeSet;

use ontorec_core::source::TYPE_PATTERN;
use ontorec_core::{
    Config, DimensionOntology, Interner, LinkingSchema, MemorySource, ModelError, OrderResult,
    RelationGraph, RelationshipModel,
};

const EX: &str = "http://ex.org/";

fn ex(local: &str) -> String {
    format!("{EX}{local}")
}

fn config_json() -> serde_json::Value {
    serde_json::json!({
        "server-address": "http://localhost:8890/sparql",
        "url-json-conf-attribute": "format",
        "url-json-conf-value": "application/json",
        "url-default-graph-attribute": "default-graph-uri",
        "url-default-graph-value": "http://ex.org/graph",
        "url-query-attribute": "query",
        "timeout": 30,
        "part-of-predicates": [ex("partOf")],
        "has-part-predicates": [],
        "depends-on-predicates": [],
        "relationship-classes": [ex("Relationship")],
        "dimensions": [{
            "name": "agents",
            "top-classes": [ex("Agent")],
            "top-linking-predicates": [ex("hasAgent")],
            "preorder": "part-of",
            "namespace-base-uris": [],
            "depends-on-similarity": false
        }],
        "output-equal-predicate": ex("equal"),
        "output-equiv-predicate": ex("equiv"),
        "output-leq-predicate": ex("leq"),
        "output-geq-predicate": ex("geq"),
        "output-do-related-predicate": ex("doRelated")
    })
}

#[test]
fn pipeline_produces_ordered_verdicts() {
    let config = Config::from_json(&config_json().to_string()).unwrap();

    let source = MemorySource::new()
        .with_pairs(
            TYPE_PATTERN,
            [
                (ex("r1"), ex("Relationship")),
                (ex("r2"), ex("Relationship")),
                (ex("a"), ex("Agent")),
                (ex("b"), ex("Agent")),
            ],
        )
        .with_predicate_pairs(&ex("partOf"), [(ex("b"), ex("a"))])
        .with_predicate_pairs(&ex("hasAgent"), [(ex("r1"), ex("a")), (ex("r2"), ex("b"))]);

    let schema = LinkingSchema::from_document("", [ex("hasAgent")]);
    let mut interner = Interner::new();
    let graph = RelationGraph::build(
        &mut interner,
        &source,
        &schema,
        &config.part_of_predicates,
        &config.has_part_predicates,
        &config.depends_on_predicates,
    )
    .unwrap();

    let ontologies = vec![DimensionOntology::build(
        &[],
        &BTreeSet::new(),
        &mut interner,
        &graph,
    )];
    let model = RelationshipModel::build(&graph, &schema, ontologies, &config, &mut interner);
    assert_eq!(model.relationship_count(), 2);

    let results = model.reconcile();
    assert_eq!(results.len(), 1);
    // r2's agent b is part of r1's agent a, so r1 >= r2.
    let r1 = interner.get(&ex("r1")).unwrap();
    let r2 = interner.get(&ex("r2")).unwrap();
    assert_eq!(results[0].left, r1.min(r2));
    assert_eq!(results[0].right, r1.max(r2));
    let expected = if results[0].left == r1 {
        OrderResult::Geq
    } else {
        OrderResult::Leq
    };
    assert_eq!(results[0].verdict, expected);
}

#[test]
fn configuration_violations_are_collected() {
    let mut value = config_json();
    let obj = value.as_object_mut().unwrap();
    obj.remove("server-address");
    obj.remove("output-leq-predicate");

    let err = Config::from_json(&value.to_string()).unwrap_err();
    match err {
        ModelError::InvalidConfig { problems } => assert_eq!(problems.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
}
