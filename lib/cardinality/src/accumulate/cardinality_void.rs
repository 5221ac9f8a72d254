use crate::accumulate::{current_operation, MetadataAccumulator, SourceMetadata};
use crate::dataset::DatasetRef;
use crate::error::CardinalityResult;
use rdf_adaptive_common::ActionContext;
use rdf_adaptive_model::{Cardinality, CardinalityType, Operation, TriplePattern, Variable};
use std::sync::Arc;

/// Sums the cardinality estimates of all datasets the sources have announced so far.
///
/// Datasets are identified by their URI. A dataset that is announced again replaces the
/// earlier announcement instead of being counted twice.
#[derive(Debug, Clone, Copy, Default)]
pub struct CardinalityVoidAccumulator {
    predicate_based_estimation: bool,
}

impl CardinalityVoidAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// If enabled, a triple pattern is estimated as `?s <predicate> ?o` and other operations are
    /// not estimated at all.
    #[must_use]
    pub fn with_predicate_based_estimation(mut self, enabled: bool) -> Self {
        self.predicate_based_estimation = enabled;
        self
    }

    fn estimate(&self, operation: &Operation, datasets: &[DatasetRef]) -> Option<Cardinality> {
        let rewritten;
        let operation = if self.predicate_based_estimation {
            let pattern = operation.triple_pattern()?;
            rewritten = Operation::from_triple_pattern(TriplePattern {
                subject: Variable::new_unchecked("s").into(),
                predicate: pattern.predicate.clone(),
                object: Variable::new_unchecked("o").into(),
            });
            &rewritten
        } else {
            operation
        };

        let mut datasets = datasets.iter();
        let first = datasets.next()?;
        let mut cardinality = first.cardinality(operation).with_dataset(first.uri());
        for dataset in datasets {
            cardinality.value += dataset.cardinality(operation).value;
            cardinality.kind = CardinalityType::Estimate;
            cardinality.dataset = None;
        }
        Some(cardinality)
    }
}

fn merge_datasets(accumulated: &[DatasetRef], appending: &[DatasetRef]) -> Vec<DatasetRef> {
    let mut merged: Vec<DatasetRef> = Vec::with_capacity(accumulated.len() + appending.len());
    for dataset in accumulated.iter().chain(appending) {
        match merged
            .iter_mut()
            .find(|existing| existing.uri() == dataset.uri())
        {
            Some(existing) => *existing = Arc::clone(dataset),
            None => merged.push(Arc::clone(dataset)),
        }
    }
    merged
}

impl MetadataAccumulator for CardinalityVoidAccumulator {
    fn append(
        &self,
        accumulated: &SourceMetadata,
        appending: &SourceMetadata,
        context: &ActionContext,
    ) -> CardinalityResult<SourceMetadata> {
        let operation = current_operation(context)?;
        let datasets = merge_datasets(&accumulated.datasets, &appending.datasets);

        let mut metadata = accumulated.clone();
        if let Some(cardinality) = self.estimate(operation, &datasets) {
            metadata.cardinality = cardinality;
        }
        metadata.datasets = datasets;
        Ok(metadata)
    }
}
