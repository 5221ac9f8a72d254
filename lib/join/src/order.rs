use rdf_adaptive_common::mediators::JoinEntriesSortMediator;
use rdf_adaptive_common::{ActionContext, JoinEntry, JoinEntryWithMetadata, JoinResult};
use rdf_adaptive_model::CardinalityType;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Computes recommended join orders based on the current metadata of the join entries.
///
/// The order itself is decided by the [JoinEntriesSortMediator].
#[derive(Clone)]
pub struct JoinOrderEvaluator {
    sort_mediator: Arc<dyn JoinEntriesSortMediator>,
}

impl JoinOrderEvaluator {
    pub fn new(sort_mediator: Arc<dyn JoinEntriesSortMediator>) -> Self {
        Self { sort_mediator }
    }

    /// Fetches the current metadata of all `entries` and returns them in the recommended order.
    pub async fn sorted_entries(
        &self,
        entries: &[JoinEntry],
        context: &ActionContext,
    ) -> JoinResult<Vec<JoinEntryWithMetadata>> {
        let entries_with_metadata = fetch_metadata(entries).await?;
        self.sort(entries_with_metadata, context).await
    }

    /// Returns `entries_with_metadata` in the recommended order.
    pub async fn sort(
        &self,
        entries_with_metadata: Vec<JoinEntryWithMetadata>,
        context: &ActionContext,
    ) -> JoinResult<Vec<JoinEntryWithMetadata>> {
        self.sort_mediator
            .sort_entries(context, entries_with_metadata)
            .await
    }
}

/// Fetches the current metadata of all `entries`, keeping their order.
pub async fn fetch_metadata(entries: &[JoinEntry]) -> JoinResult<Vec<JoinEntryWithMetadata>> {
    let mut entries_with_metadata = Vec::with_capacity(entries.len());
    for entry in entries {
        let metadata = entry.output.metadata.metadata().await?;
        entries_with_metadata.push(JoinEntryWithMetadata::new(entry.clone(), metadata));
    }
    Ok(entries_with_metadata)
}

impl Debug for JoinOrderEvaluator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinOrderEvaluator").finish_non_exhaustive()
    }
}

/// Returns whether two join orders differ at any position.
///
/// Operations are compared by identity.
pub fn orders_differ(current: &[JoinEntryWithMetadata], updated: &[JoinEntryWithMetadata]) -> bool {
    current.len() != updated.len()
        || current
            .iter()
            .zip(updated)
            .any(|(lhs, rhs)| lhs.operation != rhs.operation)
}

/// Renders each entry of a join order as `<operation label>:<cardinality>`.
pub fn render_join_order(order: &[JoinEntryWithMetadata]) -> Vec<String> {
    order
        .iter()
        .map(|entry| {
            let cardinality = &entry.metadata.cardinality;
            let prefix = match cardinality.kind {
                CardinalityType::Estimate => "~",
                CardinalityType::Exact => "",
            };
            format!("{}:{prefix}{}", entry.operation.label(), cardinality.value)
        })
        .collect()
}
