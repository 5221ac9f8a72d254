use std::fmt::{Display, Formatter};

/// Whether a [Cardinality] is known precisely or only approximately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CardinalityType {
    Estimate,
    Exact,
}

/// The (estimated) number of results of an operation.
///
/// An unknown cardinality is represented as an infinite estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct Cardinality {
    /// Whether `value` is exact.
    pub kind: CardinalityType,
    /// The number of results. May be [f64::INFINITY].
    pub value: f64,
    /// The dataset this cardinality was computed for, if any.
    pub dataset: Option<String>,
}

impl Cardinality {
    pub fn estimate(value: f64) -> Self {
        Self {
            kind: CardinalityType::Estimate,
            value,
            dataset: None,
        }
    }

    pub fn exact(value: f64) -> Self {
        Self {
            kind: CardinalityType::Exact,
            value,
            dataset: None,
        }
    }

    /// An estimate with an infinite value.
    pub fn unknown() -> Self {
        Self::estimate(f64::INFINITY)
    }

    #[must_use]
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn is_exact(&self) -> bool {
        self.kind == CardinalityType::Exact
    }
}

impl Display for Cardinality {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            CardinalityType::Estimate => write!(f, "~{}", self.value),
            CardinalityType::Exact => write!(f, "{}", self.value),
        }
    }
}
