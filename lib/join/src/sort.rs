use async_trait::async_trait;
use rdf_adaptive_common::mediators::JoinEntriesSortMediator;
use rdf_adaptive_common::{ActionContext, JoinEntryWithMetadata, JoinResult};

/// Orders join entries by ascending cardinality.
///
/// The sort is stable, entries with equal cardinalities keep their relative order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CardinalityJoinEntriesSort;

#[async_trait]
impl JoinEntriesSortMediator for CardinalityJoinEntriesSort {
    async fn sort_entries(
        &self,
        _context: &ActionContext,
        mut entries: Vec<JoinEntryWithMetadata>,
    ) -> JoinResult<Vec<JoinEntryWithMetadata>> {
        entries.sort_by(|lhs, rhs| {
            lhs.metadata
                .cardinality
                .value
                .total_cmp(&rhs.metadata.cardinality.value)
        });
        Ok(entries)
    }
}
