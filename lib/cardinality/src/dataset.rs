use crate::estimator::TriplePatternCardinalityEstimator;
use crate::void::{ClassPartition, PropertyPartition, VoidDescription};
use rdf_adaptive_model::{Cardinality, GraphPattern, NamedNodePattern, Operation, TriplePattern};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A dataset that can estimate the cardinality of operations evaluated against it.
pub trait Dataset: Debug + Send + Sync {
    /// Uniquely identifies the dataset.
    fn uri(&self) -> &str;

    /// The source the dataset was discovered in.
    fn source(&self) -> &str;

    /// Estimates the number of results of `operation` in this dataset.
    ///
    /// Operations the dataset knows nothing about have an infinite estimate.
    fn cardinality(&self, operation: &Operation) -> Cardinality;
}

pub type DatasetRef = Arc<dyn Dataset>;

/// A [Dataset] that estimates single triple patterns from its VoID description.
#[derive(Debug, Clone)]
pub struct VoidDataset {
    description: VoidDescription,
    source: String,
    estimator: Arc<dyn TriplePatternCardinalityEstimator>,
}

impl VoidDataset {
    pub fn new(
        description: VoidDescription,
        source: impl Into<String>,
        estimator: Arc<dyn TriplePatternCardinalityEstimator>,
    ) -> Self {
        Self {
            description,
            source: source.into(),
            estimator,
        }
    }

    pub fn description(&self) -> &VoidDescription {
        &self.description
    }
}

impl Dataset for VoidDataset {
    fn uri(&self) -> &str {
        &self.description.dataset
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn cardinality(&self, operation: &Operation) -> Cardinality {
        operation
            .triple_pattern()
            .and_then(|pattern| self.estimator.estimate(&self.description, pattern))
            .map_or_else(Cardinality::unknown, Cardinality::estimate)
    }
}

/// The graph a quad pattern is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraphTarget<'a> {
    Default,
    Named(&'a str),
    /// `GRAPH ?g { ... }`
    AnyNamed,
}

/// Splits a single-pattern operation into its graph and its triple pattern.
fn quad_pattern(operation: &Operation) -> Option<(GraphTarget<'_>, &TriplePattern)> {
    if let Some(pattern) = operation.triple_pattern() {
        return Some((GraphTarget::Default, pattern));
    }
    let GraphPattern::Graph { name, inner } = operation.pattern() else {
        return None;
    };
    let GraphPattern::Bgp { patterns } = inner.as_ref() else {
        return None;
    };
    let [pattern] = patterns.as_slice() else {
        return None;
    };
    let graph = match name {
        NamedNodePattern::NamedNode(graph) => GraphTarget::Named(graph.as_str()),
        NamedNodePattern::Variable(_) => GraphTarget::AnyNamed,
    };
    Some((graph, pattern))
}

/// A [Dataset] with one VoID description per named graph.
///
/// Patterns inside `GRAPH <g>` are estimated from the description of `<g>`, patterns inside
/// `GRAPH ?g` from the statistics of all graphs combined. Patterns against the default graph
/// use the combined statistics if the default graph is the union of all graphs. Otherwise,
/// the default graph is considered empty.
#[derive(Debug, Clone)]
pub struct GraphVoidDataset {
    uri: String,
    source: String,
    /// Keyed by graph IRI.
    graphs: BTreeMap<String, VoidDescription>,
    /// The statistics of all graphs combined.
    union: VoidDescription,
    union_default_graph: bool,
    estimator: Arc<dyn TriplePatternCardinalityEstimator>,
}

impl GraphVoidDataset {
    pub fn new(
        uri: impl Into<String>,
        source: impl Into<String>,
        graphs: BTreeMap<String, VoidDescription>,
        estimator: Arc<dyn TriplePatternCardinalityEstimator>,
    ) -> Self {
        let uri = uri.into();
        let union = union_description(&uri, graphs.values());
        Self {
            uri,
            source: source.into(),
            graphs,
            union,
            union_default_graph: false,
            estimator,
        }
    }

    /// Uses the IRI of each description as the name of its graph.
    pub fn from_descriptions(
        uri: impl Into<String>,
        source: impl Into<String>,
        descriptions: impl IntoIterator<Item = VoidDescription>,
        estimator: Arc<dyn TriplePatternCardinalityEstimator>,
    ) -> Self {
        let graphs = descriptions
            .into_iter()
            .map(|description| (description.dataset.clone(), description))
            .collect();
        Self::new(uri, source, graphs, estimator)
    }

    #[must_use]
    pub fn with_union_default_graph(mut self, union_default_graph: bool) -> Self {
        self.union_default_graph = union_default_graph;
        self
    }

    pub fn graph(&self, graph: &str) -> Option<&VoidDescription> {
        self.graphs.get(graph)
    }

    fn description_for(&self, graph: GraphTarget<'_>) -> Option<&VoidDescription> {
        match graph {
            GraphTarget::Named(graph) => self.graphs.get(graph),
            GraphTarget::AnyNamed => Some(&self.union),
            GraphTarget::Default => self.union_default_graph.then_some(&self.union),
        }
    }
}

impl Dataset for GraphVoidDataset {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn cardinality(&self, operation: &Operation) -> Cardinality {
        let Some((graph, pattern)) = quad_pattern(operation) else {
            return Cardinality::unknown();
        };
        let Some(description) = self.description_for(graph) else {
            // Nothing is known to be in this graph
            return Cardinality::estimate(0.0);
        };
        self.estimator
            .estimate(description, pattern)
            .map_or_else(Cardinality::unknown, Cardinality::estimate)
    }
}

fn add(lhs: Option<u64>, rhs: Option<u64>) -> Option<u64> {
    match (lhs, rhs) {
        (Some(lhs), Some(rhs)) => Some(lhs.saturating_add(rhs)),
        (lhs, rhs) => lhs.or(rhs),
    }
}

fn add_property_partitions(
    target: &mut BTreeMap<String, PropertyPartition>,
    partitions: &BTreeMap<String, PropertyPartition>,
) {
    for (predicate, partition) in partitions {
        let merged = target.entry(predicate.clone()).or_default();
        merged.triples = add(merged.triples, partition.triples);
        merged.distinct_subjects = add(merged.distinct_subjects, partition.distinct_subjects);
        merged.distinct_objects = add(merged.distinct_objects, partition.distinct_objects);
    }
}

/// Sums the statistics of `descriptions` into a description of `dataset`.
fn union_description<'a>(
    dataset: &str,
    descriptions: impl IntoIterator<Item = &'a VoidDescription>,
) -> VoidDescription {
    let mut union = VoidDescription::new(dataset);
    for description in descriptions {
        union.triples = add(union.triples, description.triples);
        union.entities = add(union.entities, description.entities);
        union.distinct_subjects = add(union.distinct_subjects, description.distinct_subjects);
        union.distinct_objects = add(union.distinct_objects, description.distinct_objects);
        add_property_partitions(&mut union.property_partitions, &description.property_partitions);
        for (class, partition) in &description.class_partitions {
            let merged: &mut ClassPartition = union.class_partitions.entry(class.clone()).or_default();
            merged.entities = add(merged.entities, partition.entities);
            add_property_partitions(&mut merged.property_partitions, &partition.property_partitions);
        }
    }
    union
}
