//! Adaptive execution of n-ary inner joins.
//!
//! The [AdaptiveJoinActor] executes a join and keeps watching the metadata of its entries. If
//! the recommended join order changes while the join is running, the running join plan can be
//! swapped for a new one without producing rows twice (see [RestartableBindingsStream]).

mod actor;
mod config;
mod evaluation;
mod hash;
mod ledger;
mod order;
mod outcome;
mod restart_stream;
mod selectivity;
mod sort;

pub use actor::{AdaptiveJoinActor, AdaptiveJoinMediators, AdaptiveJoinOutput};
pub use config::{AdaptiveJoinConfig, RestartBudget, RestartCondition};
pub use hash::{hash_bindings, DefaultBindingsHash};
pub use ledger::FingerprintLedger;
pub use order::{orders_differ, render_join_order, JoinOrderEvaluator};
pub use outcome::{JoinCoefficients, TestFailure, TestFailureReason};
pub use restart_stream::{CreateSourceFn, RestartableBindingsStream, SwapHandle};
pub use selectivity::FixedJoinSelectivity;
pub use sort::CardinalityJoinEntriesSort;
