use crate::accumulate::{MetadataAccumulator, SourceMetadata};
use crate::error::CardinalityResult;
use async_trait::async_trait;
use rdf_adaptive_common::metadata::{Metadata, MetadataCell, MetadataSource};
use rdf_adaptive_common::{ActionContext, JoinResult};
use rdf_adaptive_model::{Cardinality, Variable};
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// The metadata of a join entry whose sources report their metadata incrementally.
///
/// Every time the accumulated cardinality changes, the previous metadata snapshot is
/// invalidated, so adaptive joins over the entry can re-evaluate their join order.
///
/// ```
/// use rdf_adaptive_cardinality::*;
/// use rdf_adaptive_common::metadata::MetadataSource;
/// use rdf_adaptive_common::{ActionContext, KeysQueryOperation};
/// use rdf_adaptive_model::{Cardinality, NamedNode, Operation, TriplePattern, Variable};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let pattern = TriplePattern {
///     subject: Variable::new("s")?.into(),
///     predicate: NamedNode::new("http://xmlns.com/foaf/0.1/knows")?.into(),
///     object: Variable::new("o")?.into(),
/// };
/// let context = ActionContext::new()
///     .set(KeysQueryOperation::OPERATION, Operation::from_triple_pattern(pattern));
/// let source = AccumulatingMetadataSource::new(
///     Arc::new(CardinalityVoidAccumulator::new()),
///     context,
///     Vec::new(),
/// );
/// let before = source.metadata().await?;
///
/// let mut description = VoidDescription::new("http://example.com/void");
/// description.property_partitions.insert(
///     "http://xmlns.com/foaf/0.1/knows".to_owned(),
///     PropertyPartition { triples: Some(42), ..PropertyPartition::default() },
/// );
/// let dataset = VoidDataset::new(description, "http://example.com/", Arc::new(VoidFormulaEstimator));
/// source.append(&SourceMetadata::default().with_datasets(vec![Arc::new(dataset)]))?;
///
/// assert!(!before.state.is_valid());
/// assert_eq!(source.metadata().await?.cardinality.value, 42.0);
/// Result::<_, Box<dyn std::error::Error>>::Ok(())
/// # }).unwrap();
/// ```
pub struct AccumulatingMetadataSource {
    accumulator: Arc<dyn MetadataAccumulator>,
    context: ActionContext,
    accumulated: Mutex<SourceMetadata>,
    cell: MetadataCell,
}

impl AccumulatingMetadataSource {
    pub fn new(
        accumulator: Arc<dyn MetadataAccumulator>,
        context: ActionContext,
        variables: Vec<Variable>,
    ) -> Self {
        let accumulated = accumulator.initialize();
        let cell = MetadataCell::new(Metadata::new(accumulated.cardinality.clone(), variables));
        Self {
            accumulator,
            context,
            accumulated: Mutex::new(accumulated),
            cell,
        }
    }

    /// Merges the metadata of another source and returns the accumulated cardinality.
    pub fn append(&self, appending: &SourceMetadata) -> CardinalityResult<Cardinality> {
        let changed = {
            let mut accumulated = self
                .accumulated
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let updated = self
                .accumulator
                .append(&accumulated, appending, &self.context)?;
            let changed = (updated.cardinality != accumulated.cardinality)
                .then(|| updated.cardinality.clone());
            *accumulated = updated;
            changed
        };

        match changed {
            Some(cardinality) => {
                debug!(%cardinality, "Accumulated cardinality changed");
                self.cell.update_cardinality(cardinality.clone());
                Ok(cardinality)
            }
            None => Ok(self.cell.current().cardinality),
        }
    }

    pub fn accumulated(&self) -> SourceMetadata {
        self.accumulated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Debug for AccumulatingMetadataSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccumulatingMetadataSource")
            .field("accumulator", &self.accumulator)
            .field("cardinality", &self.cell.current().cardinality)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MetadataSource for AccumulatingMetadataSource {
    async fn metadata(&self) -> JoinResult<Metadata> {
        self.cell.metadata().await
    }
}
