use crate::accumulate::{current_operation, MetadataAccumulator, SourceMetadata};
use crate::error::CardinalityResult;
use crate::prefix::common_prefix_length;
use crate::void::{statistic, VoidDescription};
use rdf_adaptive_common::{ActionContext, KeysQueryOperation};
use rdf_adaptive_model::{Cardinality, NamedNodePattern};

/// Collects the VoID descriptions of all sources and estimates a triple pattern with a bound
/// predicate as the number of triples with that predicate in the datasets of the sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidDescriptionAccumulator;

/// Returns the description whose uri space shares the longest prefix with `source`.
///
/// An exact match wins immediately. Otherwise later descriptions win ties.
fn description_for_source<'a>(
    source: &str,
    descriptions: &'a [VoidDescription],
) -> Option<&'a VoidDescription> {
    let mut best = None;
    let mut best_length = 0;
    for description in descriptions {
        let target = description.match_target();
        if target == source {
            return Some(description);
        }
        let length = common_prefix_length(source, target);
        if length > 0 && length >= best_length {
            best = Some(description);
            best_length = length;
        }
    }
    best
}

impl MetadataAccumulator for VoidDescriptionAccumulator {
    fn append(
        &self,
        accumulated: &SourceMetadata,
        appending: &SourceMetadata,
        context: &ActionContext,
    ) -> CardinalityResult<SourceMetadata> {
        let mut metadata = accumulated.clone();
        for description in &appending.void_descriptions {
            match metadata
                .void_descriptions
                .iter_mut()
                .find(|existing| existing.dataset == description.dataset)
            {
                Some(existing) => *existing = description.clone(),
                None => metadata.void_descriptions.push(description.clone()),
            }
        }
        if metadata.void_descriptions.is_empty() {
            return Ok(metadata);
        }

        let operation = current_operation(context)?;
        let Some(pattern) = operation.triple_pattern() else {
            return Ok(metadata);
        };
        let NamedNodePattern::NamedNode(predicate) = &pattern.predicate else {
            return Ok(metadata);
        };
        let Some(sources) = context.get(KeysQueryOperation::SOURCE_IDS) else {
            return Ok(metadata);
        };

        let mut count = 0_u64;
        let mut datasets = Vec::new();
        for source in sources {
            let Some(description) = description_for_source(source, &metadata.void_descriptions)
            else {
                continue;
            };
            let triples = description
                .property_partition(predicate.as_str())
                .and_then(|partition| partition.triples)
                .filter(|triples| *triples > 0);
            if let Some(triples) = triples {
                count = count.saturating_add(triples);
                datasets.push(description.dataset.clone());
            }
        }

        if count > 0 {
            let mut cardinality = Cardinality::estimate(statistic(count));
            if let [dataset] = datasets.as_slice() {
                cardinality = cardinality.with_dataset(dataset.as_str());
            }
            metadata.cardinality = cardinality;
        }
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::void::PropertyPartition;
    use rdf_adaptive_model::{NamedNode, Operation, TriplePattern, Variable};

    const KNOWS: &str = "http://xmlns.com/foaf/0.1/knows";

    fn description(dataset: &str, uri_space: Option<&str>, knows: u64) -> VoidDescription {
        let mut description = VoidDescription::new(dataset);
        description.uri_space = uri_space.map(ToOwned::to_owned);
        description.property_partitions.insert(
            KNOWS.to_owned(),
            PropertyPartition {
                triples: Some(knows),
                ..PropertyPartition::default()
            },
        );
        description
    }

    fn context(predicate: &str, sources: &[&str]) -> ActionContext {
        let pattern = TriplePattern {
            subject: Variable::new_unchecked("s").into(),
            predicate: NamedNode::new_unchecked(predicate).into(),
            object: Variable::new_unchecked("o").into(),
        };
        ActionContext::new()
            .set(
                KeysQueryOperation::OPERATION,
                Operation::from_triple_pattern(pattern),
            )
            .set(
                KeysQueryOperation::SOURCE_IDS,
                sources.iter().map(|source| (*source).to_owned()).collect(),
            )
    }

    #[test]
    fn longest_match_per_source() {
        let descriptions = [
            description("http://a.example/void", None, 10),
            description("http://a.example/void2", Some("http://a.example/people/"), 20),
        ];

        assert_eq!(
            description_for_source("http://a.example/people/alice", &descriptions)
                .map(|description| description.dataset.as_str()),
            Some("http://a.example/void2")
        );
        assert_eq!(
            description_for_source("http://a.example/void", &descriptions)
                .map(|description| description.dataset.as_str()),
            Some("http://a.example/void")
        );
        assert!(description_for_source("urn:x", &descriptions).is_none());
    }

    #[test]
    fn single_dataset_labels_cardinality() {
        let appending = SourceMetadata::default()
            .with_void_descriptions(vec![description("http://a.example/void", None, 10)]);

        let result = VoidDescriptionAccumulator
            .append(
                &SourceMetadata::default(),
                &appending,
                &context(KNOWS, &["http://a.example/data"]),
            )
            .unwrap();

        assert_eq!(result.void_descriptions.len(), 1);
        assert_eq!(
            result.cardinality,
            Cardinality::estimate(10.0).with_dataset("http://a.example/void")
        );
    }

    #[test]
    fn counts_of_several_sources_are_summed() {
        let accumulated = SourceMetadata::default()
            .with_void_descriptions(vec![description("http://a.example/void", None, 10)]);
        let appending = SourceMetadata::default()
            .with_void_descriptions(vec![description("http://b.example/void", None, 5)]);

        let result = VoidDescriptionAccumulator
            .append(
                &accumulated,
                &appending,
                &context(KNOWS, &["http://a.example/data", "http://b.example/data"]),
            )
            .unwrap();

        assert_eq!(result.void_descriptions.len(), 2);
        assert_eq!(result.cardinality, Cardinality::estimate(15.0));
    }

    #[test]
    fn reannounced_description_replaces_previous_one() {
        let accumulated = SourceMetadata::default()
            .with_void_descriptions(vec![description("http://a.example/void", None, 10)]);
        let appending = SourceMetadata::default()
            .with_void_descriptions(vec![description("http://a.example/void", None, 12)]);

        let result = VoidDescriptionAccumulator
            .append(
                &accumulated,
                &appending,
                &context(KNOWS, &["http://a.example/data"]),
            )
            .unwrap();

        assert_eq!(result.void_descriptions.len(), 1);
        assert_eq!(
            result.cardinality,
            Cardinality::estimate(12.0).with_dataset("http://a.example/void")
        );
    }

    #[test]
    fn huge_statistics_saturate() {
        let appending = SourceMetadata::default().with_void_descriptions(vec![
            description("http://a.example/void", None, u64::MAX),
            description("http://b.example/void", None, 5),
        ]);

        let result = VoidDescriptionAccumulator
            .append(
                &SourceMetadata::default(),
                &appending,
                &context(KNOWS, &["http://a.example/data", "http://b.example/data"]),
            )
            .unwrap();

        assert_eq!(result.cardinality, Cardinality::estimate(statistic(u64::MAX)));
    }

    #[test]
    fn unknown_predicate_keeps_cardinality() {
        let appending = SourceMetadata::default()
            .with_void_descriptions(vec![description("http://a.example/void", None, 10)]);

        let result = VoidDescriptionAccumulator
            .append(
                &SourceMetadata::new(Cardinality::exact(3.0)),
                &appending,
                &context("http://xmlns.com/foaf/0.1/name", &["http://a.example/data"]),
            )
            .unwrap();

        assert_eq!(result.cardinality, Cardinality::exact(3.0));
    }
}
