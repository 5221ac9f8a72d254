use crate::accumulate::{current_operation, MetadataAccumulator, SourceMetadata};
use crate::error::CardinalityResult;
use crate::prefix::longest_matching_key;
use crate::void::statistic;
use rdf_adaptive_common::ActionContext;
use rdf_adaptive_model::{Cardinality, NamedNodePattern, TermPattern};

/// Estimates a triple pattern with a bound predicate as the number of triples with that
/// predicate in the dataset the pattern most likely targets.
///
/// The dataset is the one with the longest common prefix with the dataset of the accumulated
/// cardinality or, failing that, with the subject of the pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredicateCountAccumulator;

impl MetadataAccumulator for PredicateCountAccumulator {
    fn append(
        &self,
        accumulated: &SourceMetadata,
        appending: &SourceMetadata,
        context: &ActionContext,
    ) -> CardinalityResult<SourceMetadata> {
        let mut metadata = accumulated.clone();
        if accumulated.predicate_counts.is_empty() && appending.predicate_counts.is_empty() {
            return Ok(metadata);
        }

        for (dataset, counts) in &appending.predicate_counts {
            metadata
                .predicate_counts
                .insert(dataset.clone(), counts.clone());
        }

        let operation = current_operation(context)?;
        let Some(pattern) = operation.triple_pattern() else {
            return Ok(metadata);
        };
        let NamedNodePattern::NamedNode(predicate) = &pattern.predicate else {
            return Ok(metadata);
        };

        let datasets = || metadata.predicate_counts.keys().map(String::as_str);
        let dataset = metadata
            .cardinality
            .dataset
            .as_deref()
            .and_then(|dataset| longest_matching_key(dataset, datasets()))
            .or_else(|| match &pattern.subject {
                TermPattern::NamedNode(subject) => {
                    longest_matching_key(subject.as_str(), datasets())
                }
                _ => None,
            })
            .map(ToOwned::to_owned);
        let Some(dataset) = dataset else {
            return Ok(metadata);
        };

        let count = metadata
            .predicate_counts
            .get(&dataset)
            .and_then(|counts| counts.get(predicate.as_str()))
            .copied()
            .filter(|count| *count > 0)
            .map(statistic);
        if let Some(count) = count {
            if count != metadata.cardinality.value {
                metadata.cardinality = Cardinality::estimate(count).with_dataset(dataset);
            }
        }
        Ok(metadata)
    }
}
