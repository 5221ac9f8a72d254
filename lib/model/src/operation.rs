use spargebra::algebra::GraphPattern;
use spargebra::term::TriplePattern;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A handle to a query operation.
///
/// Operations are compared by identity and not by structure. Two structurally equal patterns
/// that were created independently are different operations, while clones of the same
/// [Operation] are equal.
#[derive(Clone)]
pub struct Operation(Arc<GraphPattern>);

impl Operation {
    pub fn new(pattern: GraphPattern) -> Self {
        Self(Arc::new(pattern))
    }

    /// Creates an operation that consists of a single triple pattern.
    pub fn from_triple_pattern(pattern: TriplePattern) -> Self {
        Self::new(GraphPattern::Bgp {
            patterns: vec![pattern],
        })
    }

    pub fn pattern(&self) -> &GraphPattern {
        &self.0
    }

    /// Returns the triple pattern if this operation is a basic graph pattern with exactly one
    /// pattern.
    pub fn triple_pattern(&self) -> Option<&TriplePattern> {
        match self.0.as_ref() {
            GraphPattern::Bgp { patterns } if patterns.len() == 1 => patterns.first(),
            _ => None,
        }
    }

    /// A short name of the operation kind, used when rendering join orders.
    pub fn label(&self) -> &'static str {
        match self.0.as_ref() {
            GraphPattern::Bgp { patterns } if patterns.len() == 1 => "pattern",
            GraphPattern::Bgp { .. } => "bgp",
            GraphPattern::Join { .. } => "join",
            GraphPattern::Union { .. } => "union",
            GraphPattern::Path { .. } => "path",
            _ => "operation",
        }
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Operation {}

impl Hash for Operation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl Debug for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Operation({})", self.0)
    }
}
