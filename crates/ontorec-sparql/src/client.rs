//! Blocking SPARQL client with count-consistency retries.

use std::collections::HashMap;
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use ontorec_core::{Config, TripleSource};

const PREFIXES: &str = "PREFIX owl: <http://www.w3.org/2002/07/owl#> \
                        PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> \
                        PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#> ";

const RETRY_DELAY: Duration = Duration::from_secs(2);

const DEFAULT_PAGE_SIZE: usize = 10_000;

#[derive(Debug, Error)]
pub enum SparqlError {
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed endpoint response: {0}")]
    Malformed(String),
}

/// SPARQL 1.1 JSON results format, reduced to what the client reads.
#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, Binding>>,
}

#[derive(Debug, Deserialize)]
struct Binding {
    value: String,
}

/// Blocking client for one SPARQL endpoint.
///
/// Endpoints under load can truncate result sets without an error status,
/// so every select is paired with a count query and re-issued until the
/// row count matches. HTTP failures never abort a run: a 404 (endpoint
/// still warming up) and any other non-success status are logged and the
/// request is retried.
pub struct SparqlClient {
    endpoint: String,
    client: reqwest::blocking::Client,
    base_params: Vec<(String, String)>,
    query_attribute: String,
    page_size: usize,
}

impl SparqlClient {
    pub fn from_config(config: &Config) -> Result<Self, SparqlError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            endpoint: config.server_address.clone(),
            client,
            base_params: vec![
                (
                    config.url_json_conf_attribute.clone(),
                    config.url_json_conf_value.clone(),
                ),
                (
                    config.url_default_graph_attribute.clone(),
                    config.url_default_graph_value.clone(),
                ),
            ],
            query_attribute: config.url_query_attribute.clone(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Rows fetched per page. Endpoints commonly cap result sets, so the
    /// page size should stay at or below the endpoint's own limit.
    pub fn with_page_size(mut self, rows: usize) -> Self {
        self.page_size = rows.max(1);
        self
    }

    /// Runs one query, retrying until the endpoint answers with a success
    /// status and a parseable body.
    fn execute(&self, query: &str) -> Result<SparqlResponse, SparqlError> {
        let mut params = self.base_params.clone();
        params.push((self.query_attribute.clone(), query.to_string()));

        loop {
            let response = match self.client.get(&self.endpoint).query(&params).send() {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, "endpoint request failed, retrying");
                    thread::sleep(RETRY_DELAY);
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                warn!("endpoint returned 404, retrying");
                thread::sleep(RETRY_DELAY);
                continue;
            }
            if !status.is_success() {
                error!(status = %status, "endpoint returned an error status, retrying");
                thread::sleep(RETRY_DELAY);
                continue;
            }

            let body = match response.text() {
                Ok(body) => body,
                Err(e) => {
                    error!(error = %e, "failed to read endpoint response, retrying");
                    thread::sleep(RETRY_DELAY);
                    continue;
                }
            };
            return serde_json::from_str(&body)
                .map_err(|e| SparqlError::Malformed(e.to_string()));
        }
    }

    /// Expected row count for a distinct select over `pattern`.
    fn select_count(&self, vars: &str, pattern: &str) -> Result<usize, SparqlError> {
        let response = self.execute(&count_query(vars, pattern))?;
        let binding = response
            .results
            .bindings
            .first()
            .and_then(|row| row.get("count"))
            .ok_or_else(|| SparqlError::Malformed("count query returned no binding".into()))?;
        binding
            .value
            .parse()
            .map_err(|_| SparqlError::Malformed(format!("non-numeric count: {}", binding.value)))
    }

    /// One page of distinct rows, ordered for stable pagination.
    fn select_page(
        &self,
        vars: &str,
        pattern: &str,
        offset: usize,
    ) -> Result<Vec<HashMap<String, Binding>>, SparqlError> {
        let response = self.execute(&select_query(vars, pattern, self.page_size, offset))?;
        Ok(response.results.bindings)
    }

    /// Distinct rows for `pattern`, paged with LIMIT/OFFSET and
    /// re-retrieved in full until the row count agrees with a fresh count
    /// query.
    fn consistent_select(
        &self,
        vars: &str,
        pattern: &str,
    ) -> Result<Vec<HashMap<String, Binding>>, SparqlError> {
        loop {
            let expected = self.select_count(vars, pattern)?;
            let mut rows = Vec::with_capacity(expected);
            let mut offset = 0;
            loop {
                let page = self.select_page(vars, pattern, offset)?;
                let fetched = page.len();
                rows.extend(page);
                if fetched < self.page_size {
                    break;
                }
                offset += self.page_size;
            }
            if rows.len() == expected {
                debug!(pattern, rows = rows.len(), "select complete");
                return Ok(rows);
            }
            warn!(
                pattern,
                expected,
                received = rows.len(),
                "inconsistent result count, re-querying"
            );
            thread::sleep(RETRY_DELAY);
        }
    }
}

impl TripleSource for SparqlClient {
    fn select_terms(&self, pattern: &str) -> anyhow::Result<HashSet<String>> {
        let rows = self.consistent_select("?e", pattern)?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| row.remove("e").map(|binding| binding.value))
            .collect())
    }

    fn select_pairs(&self, pattern: &str) -> anyhow::Result<Vec<(String, String)>> {
        let rows = self.consistent_select("?e1 ?e2", pattern)?;
        let mut pairs = Vec::with_capacity(rows.len());
        for mut row in rows {
            match (row.remove("e1"), row.remove("e2")) {
                (Some(e1), Some(e2)) => pairs.push((e1.value, e2.value)),
                _ => warn!(pattern, "row missing a binding, skipped"),
            }
        }
        Ok(pairs)
    }
}

fn select_query(vars: &str, pattern: &str, limit: usize, offset: usize) -> String {
    format!(
        "{PREFIXES}SELECT DISTINCT {vars} WHERE {{ {pattern}}} ORDER BY {vars} LIMIT {limit} OFFSET {offset}"
    )
}

fn count_query(vars: &str, pattern: &str) -> String {
    format!(
        "{PREFIXES}SELECT (COUNT(*) AS ?count) WHERE {{ SELECT DISTINCT {vars} WHERE {{ {pattern}}} }}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_query_wraps_and_pages_the_pattern() {
        let query = select_query("?e1 ?e2", "?e1 owl:sameAs ?e2 . ", 500, 1000);
        assert!(query.starts_with("PREFIX owl:"));
        assert!(query.contains("SELECT DISTINCT ?e1 ?e2 WHERE { ?e1 owl:sameAs ?e2 . }"));
        assert!(query.ends_with("ORDER BY ?e1 ?e2 LIMIT 500 OFFSET 1000"));
    }

    #[test]
    fn count_query_uses_a_distinct_subselect() {
        let query = count_query("?e", "?e rdf:type owl:Class . ");
        assert!(query.contains("SELECT (COUNT(*) AS ?count)"));
        assert!(query.contains("SELECT DISTINCT ?e WHERE { ?e rdf:type owl:Class . }"));
    }

    #[test]
    fn json_results_format_parses() {
        let body = r#"{
            "head": {"vars": ["e1", "e2"]},
            "results": {"bindings": [
                {"e1": {"type": "uri", "value": "http://ex.org/a"},
                 "e2": {"type": "uri", "value": "http://ex.org/b"}}
            ]}
        }"#;
        let response: SparqlResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.results.bindings.len(), 1);
        assert_eq!(response.results.bindings[0]["e1"].value, "http://ex.org/a");
    }
}
