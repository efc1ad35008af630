//! Turtle serialization of reconciliation verdicts.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::warn;

use ontorec_core::{Config, Interner, OrderResult, ReconciliationResult};

/// Streams verdict triples as Turtle, one line per verdict.
pub struct TtlWriter<W: Write> {
    out: W,
}

impl TtlWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(TtlWriter::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> TtlWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Writes one verdict as triples. Symmetric verdicts (EQUAL,
    /// EQUIVALENT, DO_RELATED) are emitted in both directions; LEQ and
    /// GEQ are mirrored through the complementary predicate. Node ids
    /// that no longer resolve are logged and skipped.
    pub fn write_verdict(
        &mut self,
        interner: &Interner,
        config: &Config,
        result: &ReconciliationResult,
    ) -> io::Result<()> {
        let (Some(left), Some(right)) = (
            interner.resolve(result.left),
            interner.resolve(result.right),
        ) else {
            warn!(?result, "unresolvable node id, verdict skipped");
            return Ok(());
        };
        match result.verdict {
            OrderResult::Equal => self.symmetric(left, &config.output_equal_predicate, right),
            OrderResult::Equivalent => self.symmetric(left, &config.output_equiv_predicate, right),
            OrderResult::DoRelated => {
                self.symmetric(left, &config.output_do_related_predicate, right)
            }
            OrderResult::Leq => {
                self.triple(left, &config.output_leq_predicate, right)?;
                self.triple(right, &config.output_geq_predicate, left)
            }
            OrderResult::Geq => {
                self.triple(left, &config.output_geq_predicate, right)?;
                self.triple(right, &config.output_leq_predicate, left)
            }
            OrderResult::Incomparable => Ok(()),
        }
    }

    fn symmetric(&mut self, left: &str, predicate: &str, right: &str) -> io::Result<()> {
        self.triple(left, predicate, right)?;
        self.triple(right, predicate, left)
    }

    fn triple(&mut self, subject: &str, predicate: &str, object: &str) -> io::Result<()> {
        writeln!(self.out, "<{subject}> <{predicate}> <{object}> .")
    }

    pub fn finish(mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "server-address": "http://localhost:8890/sparql",
        "url-json-conf-attribute": "format",
        "url-json-conf-value": "application/json",
        "url-default-graph-attribute": "default-graph-uri",
        "url-default-graph-value": "http://example.org/graph",
        "url-query-attribute": "query",
        "timeout": 30,
        "part-of-predicates": [],
        "has-part-predicates": [],
        "depends-on-predicates": [],
        "relationship-classes": ["http://example.org/Relationship"],
        "dimensions": [],
        "output-equal-predicate": "http://example.org/equal",
        "output-equiv-predicate": "http://example.org/equiv",
        "output-leq-predicate": "http://example.org/leq",
        "output-geq-predicate": "http://example.org/geq",
        "output-do-related-predicate": "http://example.org/doRelated"
    }"#;

    fn rendered(verdict: OrderResult) -> String {
        let config = Config::from_json(CONFIG).unwrap();
        let mut interner = Interner::new();
        let left = interner.intern("http://example.org/r1");
        let right = interner.intern("http://example.org/r2");

        let mut writer = TtlWriter::new(Vec::new());
        writer
            .write_verdict(
                &interner,
                &config,
                &ReconciliationResult {
                    left,
                    verdict,
                    right,
                },
            )
            .unwrap();
        String::from_utf8(writer.out).unwrap()
    }

    #[test]
    fn directional_verdicts_are_mirrored_through_the_complement() {
        assert_eq!(
            rendered(OrderResult::Leq),
            "<http://example.org/r1> <http://example.org/leq> <http://example.org/r2> .\n\
             <http://example.org/r2> <http://example.org/geq> <http://example.org/r1> .\n"
        );
        assert_eq!(
            rendered(OrderResult::Geq),
            "<http://example.org/r1> <http://example.org/geq> <http://example.org/r2> .\n\
             <http://example.org/r2> <http://example.org/leq> <http://example.org/r1> .\n"
        );
    }

    #[test]
    fn symmetric_verdicts_are_written_both_ways() {
        assert_eq!(
            rendered(OrderResult::DoRelated),
            "<http://example.org/r1> <http://example.org/doRelated> <http://example.org/r2> .\n\
             <http://example.org/r2> <http://example.org/doRelated> <http://example.org/r1> .\n"
        );
    }

    #[test]
    fn incomparable_is_never_serialized() {
        assert!(rendered(OrderResult::Incomparable).is_empty());
    }

    #[test]
    fn writes_to_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verdicts.ttl");
        let config = Config::from_json(CONFIG).unwrap();
        let mut interner = Interner::new();
        let left = interner.intern("http://example.org/r1");
        let right = interner.intern("http://example.org/r2");

        let mut writer = TtlWriter::create(&path).unwrap();
        writer
            .write_verdict(
                &interner,
                &config,
                &ReconciliationResult {
                    left,
                    verdict: OrderResult::Equal,
                    right,
                },
            )
            .unwrap();
        writer.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<http://example.org/equal>"));
    }
}
