mod cardinality_void;
mod predicate_count;
mod void_description;

pub use cardinality_void::CardinalityVoidAccumulator;
pub use predicate_count::PredicateCountAccumulator;
pub use void_description::VoidDescriptionAccumulator;

use crate::dataset::DatasetRef;
use crate::error::{CardinalityError, CardinalityResult};
use crate::predicate_count::PredicateCounts;
use crate::void::VoidDescription;
use rdf_adaptive_common::{ActionContext, KeysQueryOperation};
use rdf_adaptive_model::{Cardinality, Operation};
use std::fmt::Debug;
use std::sync::Arc;

/// The metadata that the sources of a query operation report about it.
#[derive(Clone, Debug)]
pub struct SourceMetadata {
    pub cardinality: Cardinality,
    pub datasets: Vec<DatasetRef>,
    pub void_descriptions: Vec<VoidDescription>,
    pub predicate_counts: PredicateCounts,
}

impl SourceMetadata {
    pub fn new(cardinality: Cardinality) -> Self {
        Self {
            cardinality,
            datasets: Vec::new(),
            void_descriptions: Vec::new(),
            predicate_counts: PredicateCounts::new(),
        }
    }

    #[must_use]
    pub fn with_datasets(mut self, datasets: Vec<DatasetRef>) -> Self {
        self.datasets = datasets;
        self
    }

    #[must_use]
    pub fn with_void_descriptions(mut self, descriptions: Vec<VoidDescription>) -> Self {
        self.void_descriptions = descriptions;
        self
    }

    #[must_use]
    pub fn with_predicate_counts(mut self, counts: PredicateCounts) -> Self {
        self.predicate_counts = counts;
        self
    }
}

impl Default for SourceMetadata {
    fn default() -> Self {
        Self::new(Cardinality::exact(0.0))
    }
}

/// Merges the metadata of the sources of a query operation, one source at a time.
///
/// Every accumulator only touches the parts of [SourceMetadata] it is responsible for and
/// carries over the rest of the accumulated metadata.
pub trait MetadataAccumulator: Debug + Send + Sync {
    /// The metadata before any source has reported.
    fn initialize(&self) -> SourceMetadata {
        SourceMetadata::default()
    }

    /// Merges `appending` into `accumulated`.
    fn append(
        &self,
        accumulated: &SourceMetadata,
        appending: &SourceMetadata,
        context: &ActionContext,
    ) -> CardinalityResult<SourceMetadata>;
}

/// Runs several accumulators in sequence. Each accumulator sees the result of its predecessor
/// as the accumulated metadata, so later accumulators have the last word on the cardinality.
#[derive(Debug, Clone, Default)]
pub struct AccumulatorChain {
    accumulators: Vec<Arc<dyn MetadataAccumulator>>,
}

impl AccumulatorChain {
    pub fn new(accumulators: Vec<Arc<dyn MetadataAccumulator>>) -> Self {
        Self { accumulators }
    }
}

impl MetadataAccumulator for AccumulatorChain {
    fn append(
        &self,
        accumulated: &SourceMetadata,
        appending: &SourceMetadata,
        context: &ActionContext,
    ) -> CardinalityResult<SourceMetadata> {
        let mut result = accumulated.clone();
        for accumulator in &self.accumulators {
            result = accumulator.append(&result, appending, context)?;
        }
        Ok(result)
    }
}

fn current_operation(context: &ActionContext) -> CardinalityResult<&Operation> {
    context
        .get(KeysQueryOperation::OPERATION)
        .ok_or(CardinalityError::MissingContextEntry(
            KeysQueryOperation::OPERATION.name(),
        ))
}
