//! Ordering verdicts and the two comparison strategies.
//!
//! A verdict between two element sets is one of `Equal`, `Equivalent`,
//! `Leq`, `Geq`, `Incomparable`, or the fallback `DoRelated` (outside the
//! ordering lattice, assigned only by the reconciliation fallback rule).
//!
//! Verdicts are combined across dimensions through `OrderFlags`, a small
//! explicit set over three named order properties; combination is set
//! intersection. The truth table:
//!
//! | verdict      | leq | geq | equal |
//! |--------------|-----|-----|-------|
//! | Equal        |  x  |  x  |   x   |
//! | Equivalent   |  x  |  x  |       |
//! | Leq          |  x  |     |       |
//! | Geq          |     |  x  |       |
//! | Incomparable |     |     |       |

use std::collections::BTreeSet;
use std::fmt;

use crate::dimension::DimensionOntology;
use crate::relationships::{ElementId, RelationshipElement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderResult {
    Equal,
    Equivalent,
    Leq,
    Geq,
    Incomparable,
    /// Related through shared dependencies rather than a direct ordering.
    DoRelated,
}

impl OrderResult {
    pub const fn flags(self) -> OrderFlags {
        match self {
            OrderResult::Equal => OrderFlags {
                leq: true,
                geq: true,
                equal: true,
            },
            OrderResult::Equivalent => OrderFlags {
                leq: true,
                geq: true,
                equal: false,
            },
            OrderResult::Leq => OrderFlags {
                leq: true,
                geq: false,
                equal: false,
            },
            OrderResult::Geq => OrderFlags {
                leq: false,
                geq: true,
                equal: false,
            },
            // DoRelated sits outside the lattice; it carries no order
            // properties, like Incomparable.
            OrderResult::Incomparable | OrderResult::DoRelated => OrderFlags::EMPTY,
        }
    }
}

impl fmt::Display for OrderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderResult::Equal => "EQUAL",
            OrderResult::Equivalent => "EQUIVALENT",
            OrderResult::Leq => "LEQ",
            OrderResult::Geq => "GEQ",
            OrderResult::Incomparable => "INCOMPARABLE",
            OrderResult::DoRelated => "DO_RELATED",
        };
        f.write_str(name)
    }
}

/// Set of order properties carried by a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderFlags {
    pub leq: bool,
    pub geq: bool,
    pub equal: bool,
}

impl OrderFlags {
    pub const EMPTY: Self = Self {
        leq: false,
        geq: false,
        equal: false,
    };

    pub const ALL: Self = Self {
        leq: true,
        geq: true,
        equal: true,
    };

    pub const fn intersect(self, other: Self) -> Self {
        Self {
            leq: self.leq && other.leq,
            geq: self.geq && other.geq,
            equal: self.equal && other.equal,
        }
    }

    pub const fn union(self, other: Self) -> Self {
        Self {
            leq: self.leq || other.leq,
            geq: self.geq || other.geq,
            equal: self.equal || other.equal,
        }
    }

    pub const fn is_empty(self) -> bool {
        !self.leq && !self.geq && !self.equal
    }

    /// At least equivalent: both directions of the order hold.
    pub const fn is_equivalent(self) -> bool {
        self.leq && self.geq
    }

    /// Verdict category of an intersected flag set.
    pub const fn category(self) -> OrderResult {
        match (self.leq, self.geq, self.equal) {
            (true, true, true) => OrderResult::Equal,
            (true, true, false) => OrderResult::Equivalent,
            (true, false, _) => OrderResult::Leq,
            (false, true, _) => OrderResult::Geq,
            (false, false, _) => OrderResult::Incomparable,
        }
    }
}

/// Element data needed by a comparison: the element arena and the built
/// dimension ontologies, both immutable by comparison time.
#[derive(Clone, Copy)]
pub struct CompareContext<'a> {
    pub elements: &'a [RelationshipElement],
    pub ontologies: &'a [DimensionOntology],
}

/// A preorder on sets of relationship elements. The closed set of
/// strategies: structural containment via part-of, or subsumption of the
/// most-specific instantiated classes against one dimension ontology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preorder {
    PartOf,
    Msci {
        /// Index of the dimension ontology in the context.
        ontology: usize,
    },
}

impl Preorder {
    /// Preorder verdict between two element sets. Set equality short-cuts
    /// to `Equal`; otherwise the verdict follows from `less_or_equal` in
    /// both directions.
    pub fn compare(
        &self,
        ctx: &CompareContext<'_>,
        set1: &BTreeSet<ElementId>,
        set2: &BTreeSet<ElementId>,
    ) -> OrderResult {
        if set1 == set2 {
            return OrderResult::Equal;
        }
        match (
            self.less_or_equal(ctx, set1, set2),
            self.less_or_equal(ctx, set2, set1),
        ) {
            (true, true) => OrderResult::Equivalent,
            (true, false) => OrderResult::Leq,
            (false, true) => OrderResult::Geq,
            (false, false) => OrderResult::Incomparable,
        }
    }

    /// An empty target set is a universal upper bound; an empty source set
    /// (against a non-empty target) is never less-or-equal.
    fn less_or_equal(
        &self,
        ctx: &CompareContext<'_>,
        set1: &BTreeSet<ElementId>,
        set2: &BTreeSet<ElementId>,
    ) -> bool {
        if set2.is_empty() {
            return true;
        }
        if set1.is_empty() {
            return false;
        }
        match *self {
            Preorder::PartOf => set1.iter().all(|&e1| {
                set2.contains(&e1)
                    || set2.iter().any(|&e2| ctx.elements[e1.index()].is_part_of(e2))
            }),
            Preorder::Msci { ontology } => {
                let dimension_ontology = &ctx.ontologies[ontology];
                set1.iter().all(|&e1| {
                    if set2.contains(&e1) {
                        return true;
                    }
                    let msci1 = ctx.elements[e1.index()].msci(ontology);
                    !msci1.is_empty()
                        && msci1.iter().all(|&c1| {
                            set2.iter().any(|&e2| {
                                ctx.elements[e2.index()]
                                    .msci(ontology)
                                    .iter()
                                    .any(|&c2| dimension_ontology.is_subsumed(c1, c2))
                            })
                        })
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_round_trip_through_categories() {
        for verdict in [
            OrderResult::Equal,
            OrderResult::Equivalent,
            OrderResult::Leq,
            OrderResult::Geq,
            OrderResult::Incomparable,
        ] {
            assert_eq!(verdict.flags().category(), verdict);
        }
        // DoRelated carries no flags and is never rebuilt from them.
        assert_eq!(OrderResult::DoRelated.flags(), OrderFlags::EMPTY);
    }

    #[test]
    fn intersection_narrows_the_running_verdict() {
        // EQUAL narrowed by LEQ is LEQ, not EQUAL.
        let narrowed = OrderResult::Equal.flags().intersect(OrderResult::Leq.flags());
        assert_eq!(narrowed.category(), OrderResult::Leq);
        // LEQ against GEQ has an empty intersection.
        let crossed = OrderResult::Leq.flags().intersect(OrderResult::Geq.flags());
        assert!(crossed.is_empty());
        assert_eq!(crossed.category(), OrderResult::Incomparable);
        // EQUIVALENT keeps both directions but never restores equality.
        let equiv = OrderResult::Equivalent
            .flags()
            .intersect(OrderResult::Equal.flags());
        assert_eq!(equiv.category(), OrderResult::Equivalent);
    }

    #[test]
    fn intersection_is_commutative() {
        let cases = [
            OrderResult::Equal,
            OrderResult::Equivalent,
            OrderResult::Leq,
            OrderResult::Geq,
            OrderResult::Incomparable,
        ];
        for a in cases {
            for b in cases {
                assert_eq!(
                    a.flags().intersect(b.flags()),
                    b.flags().intersect(a.flags())
                );
            }
        }
    }

    #[test]
    fn union_restores_properties() {
        let joined = OrderResult::Leq.flags().union(OrderResult::Geq.flags());
        assert!(joined.is_equivalent());
        assert_eq!(OrderFlags::EMPTY.union(OrderFlags::ALL), OrderFlags::ALL);
    }
}
