//! Cardinality estimates for the entries of adaptive joins.
//!
//! Sources describe their datasets with [VoID](https://www.w3.org/TR/void/) statistics or plain
//! predicate counts. This crate extracts these descriptions, estimates triple patterns from them
//! and accumulates the estimates of all sources of a join entry into a single cardinality. An
//! [AccumulatingMetadataSource] exposes the result as the metadata of a join entry and
//! invalidates it whenever another source changes the estimate.

mod accumulate;
mod dataset;
mod error;
mod estimator;
mod predicate_count;
mod prefix;
mod source;
mod void;

pub use accumulate::{
    AccumulatorChain, CardinalityVoidAccumulator, MetadataAccumulator, PredicateCountAccumulator,
    SourceMetadata, VoidDescriptionAccumulator,
};
pub use dataset::{Dataset, DatasetRef, GraphVoidDataset, VoidDataset};
pub use error::{CardinalityError, CardinalityResult};
pub use estimator::{PredicateCountEstimator, TriplePatternCardinalityEstimator, VoidFormulaEstimator};
pub use predicate_count::{predicate_counts, DereferenceRdf, PredicateCountExtractor, PredicateCounts};
pub use prefix::{common_prefix_length, longest_matching_key};
pub use source::AccumulatingMetadataSource;
pub use void::{ClassPartition, PropertyPartition, VoidDescription, VoidDescriptionExtractor};
