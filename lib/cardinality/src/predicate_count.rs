use crate::accumulate::SourceMetadata;
use crate::error::{CardinalityError, CardinalityResult};
use async_trait::async_trait;
use itertools::Itertools;
use rdf_adaptive_common::{ActionContext, KeysQueryOperation};
use rdf_adaptive_model::vocab::{rdf, void};
use rdf_adaptive_model::{Cardinality, Graph, NamedNodePattern, SubjectRef, TermRef};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// The number of triples per predicate, keyed by dataset IRI and then by predicate IRI.
pub type PredicateCounts = BTreeMap<String, BTreeMap<String, u64>>;

/// Retrieves the RDF document at a URL.
#[async_trait]
pub trait DereferenceRdf: Send + Sync {
    async fn dereference(&self, url: &str, context: &ActionContext) -> CardinalityResult<Graph>;
}

/// Extracts the predicate counts of `void:propertyPartition`s from the metadata of a source.
///
/// Datasets that the metadata links to with `void:inDataset` are dereferenced and their counts
/// are added to the counts of the metadata itself.
#[derive(Clone)]
pub struct PredicateCountExtractor {
    dereference: Arc<dyn DereferenceRdf>,
}

impl PredicateCountExtractor {
    pub fn new(dereference: Arc<dyn DereferenceRdf>) -> Self {
        Self { dereference }
    }

    /// Extracts the predicate counts for the operation in `context`.
    ///
    /// Counts are only extracted for triple patterns with a bound predicate. The cardinality of
    /// the result is a placeholder estimate of `1` that accumulators replace.
    pub async fn extract(
        &self,
        metadata: &Graph,
        context: &ActionContext,
    ) -> CardinalityResult<SourceMetadata> {
        let operation = context.get(KeysQueryOperation::OPERATION).ok_or(
            CardinalityError::MissingContextEntry(KeysQueryOperation::OPERATION.name()),
        )?;
        let result = SourceMetadata::new(Cardinality::estimate(1.0));
        let bound_predicate = operation
            .triple_pattern()
            .is_some_and(|pattern| matches!(pattern.predicate, NamedNodePattern::NamedNode(_)));
        if !bound_predicate {
            return Ok(result);
        }

        let mut counts = predicate_counts(metadata);
        for url in dataset_links(metadata) {
            debug!(url = %url, "Dereferencing linked dataset description");
            let linked = self.dereference.dereference(&url, context).await?;
            for (dataset, linked_counts) in predicate_counts(&linked) {
                let dataset_counts = counts.entry(dataset).or_default();
                for (predicate, count) in linked_counts {
                    *dataset_counts.entry(predicate).or_default() += count;
                }
            }
        }

        Ok(result.with_predicate_counts(counts))
    }
}

/// Sums the `void:triples` of the property partitions of every `void:Dataset` in `graph`.
pub fn predicate_counts(graph: &Graph) -> PredicateCounts {
    let mut counts = PredicateCounts::new();
    for subject in graph.subjects_for_predicate_object(rdf::TYPE, void::DATASET) {
        let SubjectRef::NamedNode(dataset) = subject else {
            continue;
        };
        for partition in graph.objects_for_subject_predicate(dataset, void::PROPERTY_PARTITION) {
            let partition = match partition {
                TermRef::NamedNode(node) => SubjectRef::from(node),
                TermRef::BlankNode(node) => SubjectRef::from(node),
                _ => continue,
            };
            let property = graph.object_for_subject_predicate(partition, void::PROPERTY);
            let triples = graph.object_for_subject_predicate(partition, void::TRIPLES);
            let (Some(TermRef::NamedNode(property)), Some(TermRef::Literal(triples))) =
                (property, triples)
            else {
                continue;
            };
            let Ok(triples) = triples.value().trim().parse::<u64>() else {
                continue;
            };
            *counts
                .entry(dataset.as_str().to_owned())
                .or_default()
                .entry(property.as_str().to_owned())
                .or_default() += triples;
        }
    }
    counts
}

/// The distinct IRIs that resources in `graph` name as their `void:inDataset`.
fn dataset_links(graph: &Graph) -> Vec<String> {
    graph
        .triples_for_predicate(void::IN_DATASET)
        .filter_map(|triple| match triple.object {
            TermRef::NamedNode(dataset) => Some(dataset.as_str().to_owned()),
            _ => None,
        })
        .sorted()
        .dedup()
        .collect()
}
