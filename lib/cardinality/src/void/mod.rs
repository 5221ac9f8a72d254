mod extract;

pub use extract::VoidDescriptionExtractor;
use std::collections::BTreeMap;

/// Statistics of the triples with a single predicate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyPartition {
    pub triples: Option<u64>,
    pub distinct_subjects: Option<u64>,
    pub distinct_objects: Option<u64>,
}

/// Statistics of the entities of a single class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassPartition {
    pub entities: Option<u64>,
    /// Property partitions restricted to the entities of the class, keyed by predicate IRI.
    pub property_partitions: BTreeMap<String, PropertyPartition>,
}

/// The statistics a [VoID](https://www.w3.org/TR/void/) description publishes for a dataset.
///
/// Statistics that the description does not state are `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoidDescription {
    /// The IRI of the dataset.
    pub dataset: String,
    pub sparql_endpoint: Option<String>,
    /// The common prefix of the entity IRIs of the dataset.
    pub uri_space: Option<String>,
    pub triples: Option<u64>,
    pub entities: Option<u64>,
    pub classes: Option<u64>,
    pub properties: Option<u64>,
    pub distinct_subjects: Option<u64>,
    pub distinct_objects: Option<u64>,
    /// Keyed by predicate IRI.
    pub property_partitions: BTreeMap<String, PropertyPartition>,
    /// Keyed by class IRI.
    pub class_partitions: BTreeMap<String, ClassPartition>,
}

impl VoidDescription {
    /// Creates a description of `dataset` without any statistics.
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            sparql_endpoint: None,
            uri_space: None,
            triples: None,
            entities: None,
            classes: None,
            properties: None,
            distinct_subjects: None,
            distinct_objects: None,
            property_partitions: BTreeMap::new(),
            class_partitions: BTreeMap::new(),
        }
    }

    pub fn property_partition(&self, predicate: &str) -> Option<&PropertyPartition> {
        self.property_partitions.get(predicate)
    }

    pub fn class_partition(&self, class: &str) -> Option<&ClassPartition> {
        self.class_partitions.get(class)
    }

    /// The IRI that resources of this dataset are matched against.
    pub fn match_target(&self) -> &str {
        self.uri_space.as_deref().unwrap_or(&self.dataset)
    }
}

#[expect(clippy::cast_precision_loss, reason = "Dataset statistics stay far below 2^52")]
pub(crate) fn statistic(value: u64) -> f64 {
    value as f64
}
