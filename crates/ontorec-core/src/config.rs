//! JSON configuration surface.
//!
//! The configuration is validated structurally before deserialization so
//! that every violation is reported at once, then mapped onto typed
//! structs. Field names follow the kebab-case of the JSON document.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ModelError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    // SPARQL endpoint surface, consumed by the query layer.
    pub server_address: String,
    pub url_json_conf_attribute: String,
    pub url_json_conf_value: String,
    pub url_default_graph_attribute: String,
    pub url_default_graph_value: String,
    pub url_query_attribute: String,
    /// HTTP timeout, seconds.
    pub timeout: u64,

    // Global predicate lists for the relation graph.
    pub part_of_predicates: Vec<String>,
    pub has_part_predicates: Vec<String>,
    pub depends_on_predicates: Vec<String>,

    /// Classes whose instances are the relationship entities to reconcile.
    pub relationship_classes: Vec<String>,

    pub dimensions: Vec<DimensionConfig>,

    // Predicates used when serializing verdicts.
    pub output_equal_predicate: String,
    pub output_equiv_predicate: String,
    pub output_leq_predicate: String,
    pub output_geq_predicate: String,
    pub output_do_related_predicate: String,
}

/// One comparison axis: which predicates link a relationship to its
/// members, which classes those members must instantiate, how member sets
/// are ordered, and whether the depends-on fallback applies.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DimensionConfig {
    pub name: String,
    pub top_classes: Vec<String>,
    pub top_linking_predicates: Vec<String>,
    pub preorder: PreorderKind,
    /// URI prefixes delimiting the dimension ontology namespace.
    pub namespace_base_uris: Vec<String>,
    pub depends_on_similarity: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreorderKind {
    PartOf,
    Msci,
}

const REQUIRED_FIELDS: &[&str] = &[
    "server-address",
    "url-json-conf-attribute",
    "url-json-conf-value",
    "url-default-graph-attribute",
    "url-default-graph-value",
    "url-query-attribute",
    "timeout",
    "part-of-predicates",
    "has-part-predicates",
    "depends-on-predicates",
    "relationship-classes",
    "dimensions",
    "output-equal-predicate",
    "output-equiv-predicate",
    "output-leq-predicate",
    "output-geq-predicate",
    "output-do-related-predicate",
];

const REQUIRED_DIMENSION_FIELDS: &[&str] = &[
    "name",
    "top-classes",
    "top-linking-predicates",
    "preorder",
    "namespace-base-uris",
    "depends-on-similarity",
];

impl Config {
    pub fn from_path(path: &std::path::Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parses and validates a configuration document. All structural
    /// violations are collected into one `InvalidConfig` error.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let value: Value = serde_json::from_str(text).map_err(|e| ModelError::InvalidConfig {
            problems: vec![format!("not valid JSON: {e}")],
        })?;

        let problems = validate(&value);
        if !problems.is_empty() {
            return Err(ModelError::InvalidConfig { problems });
        }

        serde_json::from_value(value).map_err(|e| ModelError::InvalidConfig {
            problems: vec![e.to_string()],
        })
    }

    pub fn do_related_enabled(&self) -> bool {
        self.dimensions.iter().any(|d| d.depends_on_similarity)
    }
}

fn validate(value: &Value) -> Vec<String> {
    let mut problems = Vec::new();

    for field in REQUIRED_FIELDS {
        if value.get(field).is_none() {
            problems.push(format!("missing field: {field}"));
        }
    }

    if let Some(dimensions) = value.get("dimensions").and_then(Value::as_array) {
        for (i, dimension) in dimensions.iter().enumerate() {
            for field in REQUIRED_DIMENSION_FIELDS {
                if dimension.get(field).is_none() {
                    problems.push(format!("missing field: dimension {} / {field}", i + 1));
                } else if *field == "preorder"
                    && !matches!(
                        dimension.get(field).and_then(Value::as_str),
                        Some("part-of") | Some("msci")
                    )
                {
                    problems.push(format!("invalid preorder in dimension {}", i + 1));
                }
            }
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config_json() -> serde_json::Value {
        serde_json::json!({
            "server-address": "http://localhost:8890/sparql",
            "url-json-conf-attribute": "format",
            "url-json-conf-value": "application/json",
            "url-default-graph-attribute": "default-graph-uri",
            "url-default-graph-value": "http://example.org/graph",
            "url-query-attribute": "query",
            "timeout": 30,
            "part-of-predicates": ["http://example.org/partOf"],
            "has-part-predicates": ["http://example.org/hasPart"],
            "depends-on-predicates": ["http://example.org/dependsOn"],
            "relationship-classes": ["http://example.org/Relationship"],
            "dimensions": [{
                "name": "agents",
                "top-classes": ["http://example.org/Agent"],
                "top-linking-predicates": ["http://example.org/hasAgent"],
                "preorder": "part-of",
                "namespace-base-uris": [],
                "depends-on-similarity": false
            }],
            "output-equal-predicate": "http://example.org/equal",
            "output-equiv-predicate": "http://example.org/equiv",
            "output-leq-predicate": "http://example.org/leq",
            "output-geq-predicate": "http://example.org/geq",
            "output-do-related-predicate": "http://example.org/doRelated"
        })
    }

    #[test]
    fn valid_configuration_parses() {
        let config = Config::from_json(&valid_config_json().to_string()).unwrap();
        assert_eq!(config.dimensions.len(), 1);
        assert_eq!(config.dimensions[0].preorder, PreorderKind::PartOf);
        assert!(!config.do_related_enabled());
    }

    #[test]
    fn all_violations_are_reported() {
        let mut value = valid_config_json();
        let obj = value.as_object_mut().unwrap();
        obj.remove("server-address");
        obj.remove("timeout");
        obj["dimensions"][0].as_object_mut().unwrap().remove("name");
        obj["dimensions"][0]["preorder"] = serde_json::json!("bogus");

        let err = Config::from_json(&value.to_string()).unwrap_err();
        match err {
            ModelError::InvalidConfig { problems } => {
                assert_eq!(problems.len(), 4);
                assert!(problems.contains(&"missing field: server-address".to_string()));
                assert!(problems.contains(&"missing field: timeout".to_string()));
                assert!(problems.contains(&"missing field: dimension 1 / name".to_string()));
                assert!(problems.contains(&"invalid preorder in dimension 1".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn msci_preorder_is_accepted() {
        let mut value = valid_config_json();
        value["dimensions"][0]["preorder"] = serde_json::json!("msci");
        let config = Config::from_json(&value.to_string()).unwrap();
        assert_eq!(config.dimensions[0].preorder, PreorderKind::Msci);
    }
}
