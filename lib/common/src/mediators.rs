use crate::context::ActionContext;
use crate::error::JoinResult;
use crate::join_entry::{JoinEntry, JoinEntryWithMetadata, LogicalJoinType};
use crate::metadata::MetadataSourceRef;
use crate::stream::SendableBindingsStream;
use async_trait::async_trait;
use rdf_adaptive_model::{Bindings, Variable};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A request to join a set of entries.
#[derive(Debug, Clone)]
pub struct JoinAction {
    pub join_type: LogicalJoinType,
    pub entries: Vec<JoinEntry>,
    pub context: ActionContext,
}

/// The result of executing a join.
pub struct JoinOutput {
    pub bindings_stream: SendableBindingsStream,
    pub metadata: MetadataSourceRef,
}

impl Debug for JoinOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinOutput").finish_non_exhaustive()
    }
}

/// Executes joins.
///
/// Implementations may recursively call other join mediators, including adaptive ones, with the
/// context of the action.
#[async_trait]
pub trait JoinMediator: Send + Sync {
    async fn mediate(&self, action: JoinAction) -> JoinResult<JoinOutput>;
}

/// Orders join entries for execution. The first entry is joined first.
#[async_trait]
pub trait JoinEntriesSortMediator: Send + Sync {
    async fn sort_entries(
        &self,
        context: &ActionContext,
        entries: Vec<JoinEntryWithMetadata>,
    ) -> JoinResult<Vec<JoinEntryWithMetadata>>;
}

/// A fingerprint of a [Bindings].
pub type Fingerprint = u64;

/// Computes the [Fingerprint] of a [Bindings] over the given variables.
pub type HashFunction = Arc<dyn Fn(&Bindings, &[Variable]) -> Fingerprint + Send + Sync>;

/// Provides functions for hashing bindings.
#[async_trait]
pub trait HashBindingsMediator: Send + Sync {
    /// Returns a hash function. If `allow_hash_collisions` is false, the caller relies on
    /// distinct bindings having distinct fingerprints.
    async fn hash_function(
        &self,
        context: &ActionContext,
        allow_hash_collisions: bool,
    ) -> JoinResult<HashFunction>;
}

/// Estimates the fraction of the summed input cardinalities that a join produces.
#[async_trait]
pub trait JoinSelectivityMediator: Send + Sync {
    async fn selectivity(&self, context: &ActionContext, entries: &[JoinEntry])
        -> JoinResult<f64>;
}
