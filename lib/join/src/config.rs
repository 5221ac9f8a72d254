use std::time::Duration;

/// Bounds the number of times an adaptive join may swap its join plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartBudget {
    /// Swap at most once.
    Once,
    /// Swap at most the given number of times.
    Limited(usize),
    #[default]
    Unlimited,
}

impl RestartBudget {
    /// Returns whether another restart is allowed after `restarts` restarts.
    pub fn allows(self, restarts: usize) -> bool {
        match self {
            RestartBudget::Once => restarts < 1,
            RestartBudget::Limited(limit) => restarts < limit,
            RestartBudget::Unlimited => true,
        }
    }
}

/// Decides whether a sub-optimal join plan is worth restarting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RestartCondition {
    /// Restart if the join has produced fewer rows than `restart_threshold` times its estimated
    /// output.
    ProducedBelowThreshold {
        /// A fraction in `[0, 1]` of the estimated join output.
        restart_threshold: f64,
    },
    /// Restart if the cardinality of an entry changed considerably, both in absolute terms and
    /// relative to its previous value. The amount of produced rows is ignored.
    CardinalityChange {
        cardinality_threshold: f64,
        cardinality_threshold_multiplier: f64,
    },
}

impl RestartCondition {
    /// Returns whether a cardinality change from `old` to `new` is large enough to trigger
    /// a re-evaluation of the join order.
    ///
    /// Always true for [RestartCondition::ProducedBelowThreshold].
    pub fn cardinality_change_meets_threshold(self, old: f64, new: f64) -> bool {
        let RestartCondition::CardinalityChange {
            cardinality_threshold,
            cardinality_threshold_multiplier,
        } = self
        else {
            return true;
        };

        if old == new || (old - new).abs() <= cardinality_threshold {
            return false;
        }

        let smaller = old.min(new);
        let larger = old.max(new);
        let divisor = if smaller == 0.0 { 1.0 } else { smaller };
        (larger / divisor).abs() > cardinality_threshold_multiplier
    }

    /// Returns whether the condition can ever permit a restart.
    pub fn can_restart(self) -> bool {
        match self {
            RestartCondition::ProducedBelowThreshold { restart_threshold } => restart_threshold > 0.0,
            RestartCondition::CardinalityChange { .. } => true,
        }
    }
}

impl Default for RestartCondition {
    fn default() -> Self {
        RestartCondition::ProducedBelowThreshold {
            restart_threshold: 0.5,
        }
    }
}

/// The configuration of an [AdaptiveJoinActor](crate::AdaptiveJoinActor).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdaptiveJoinConfig {
    /// Re-evaluate the join order whenever the metadata of an entry is updated.
    pub evaluation_after_metadata_update: bool,
    /// Re-evaluate the join order periodically.
    pub evaluation_interval: Option<Duration>,
    pub restart_budget: RestartBudget,
    pub restart_condition: RestartCondition,
    /// Swap the join plan once after this timeout, regardless of metadata.
    pub swap_timeout: Option<Duration>,
    /// Wrap nested joins as well, instead of only the topmost join.
    pub wrap_all_joins: bool,
}

impl AdaptiveJoinConfig {
    #[must_use]
    pub fn with_evaluation_after_metadata_update(mut self, enabled: bool) -> Self {
        self.evaluation_after_metadata_update = enabled;
        self
    }

    /// Sets the evaluation interval. A zero interval disables periodic evaluation.
    #[must_use]
    pub fn with_evaluation_interval(mut self, interval: Option<Duration>) -> Self {
        self.evaluation_interval = interval.filter(|interval| !interval.is_zero());
        self
    }

    #[must_use]
    pub fn with_restart_budget(mut self, budget: RestartBudget) -> Self {
        self.restart_budget = budget;
        self
    }

    #[must_use]
    pub fn with_restart_condition(mut self, condition: RestartCondition) -> Self {
        self.restart_condition = condition;
        self
    }

    /// Sets the swap timeout. A zero timeout disables the timeout.
    #[must_use]
    pub fn with_swap_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.swap_timeout = timeout.filter(|timeout| !timeout.is_zero());
        self
    }

    #[must_use]
    pub fn with_wrap_all_joins(mut self, enabled: bool) -> Self {
        self.wrap_all_joins = enabled;
        self
    }

    /// Returns whether the join order is re-evaluated at runtime.
    pub fn evaluates_join_order(&self) -> bool {
        self.evaluation_after_metadata_update || self.evaluation_interval.is_some()
    }

    /// Returns whether anything can trigger a swap.
    pub fn has_evaluation_trigger(&self) -> bool {
        self.evaluates_join_order() || self.swap_timeout.is_some()
    }
}
