/// The estimated costs of executing a join with a particular actor.
///
/// Lower is better for all coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JoinCoefficients {
    pub iterations: f64,
    pub persisted_items: f64,
    pub blocking_items: f64,
    pub request_time: f64,
}

/// Why an actor cannot handle a join action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TestFailureReason {
    #[error("cannot run due to adaptive join being disabled")]
    AdaptiveJoinDisabled,
    #[error("can only wrap the topmost join")]
    OnlyTopmostJoin,
    #[error("can only wrap a single set of join entries once")]
    AlreadyWrapped,
    #[error("has no evaluation conditions enabled")]
    NoEvaluationConditions,
    #[error("cannot restart even once")]
    CannotRestart,
    #[error("requires at least two join entries")]
    TooFewEntries,
    #[error("can only handle inner joins")]
    UnsupportedJoinType,
}

/// The result of a failed test of an actor.
///
/// A failed test is not an error. The join is simply handled by another actor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{actor} {reason}")]
pub struct TestFailure {
    pub actor: String,
    pub reason: TestFailureReason,
}

impl TestFailure {
    pub fn new(actor: impl Into<String>, reason: TestFailureReason) -> Self {
        Self {
            actor: actor.into(),
            reason,
        }
    }
}
