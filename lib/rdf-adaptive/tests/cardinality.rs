#![cfg(test)]

mod support;

use futures::{StreamExt, TryStreamExt};
use oxrdfio::RdfFormat;
use rdf_adaptive::cardinality::{
    AccumulatingMetadataSource, CardinalityVoidAccumulator, DatasetRef, SourceMetadata,
    VoidDataset, VoidDescription, VoidDescriptionExtractor, VoidFormulaEstimator,
};
use rdf_adaptive::common::mediators::JoinAction;
use rdf_adaptive::common::metadata::MetadataSourceRef;
use rdf_adaptive::common::{ActionContext, KeysQueryOperation, LogicalJoinType};
use rdf_adaptive::join::{AdaptiveJoinActor, AdaptiveJoinConfig, AdaptiveJoinMediators};
use rdf_adaptive::model::{Cardinality, NamedNode, Operation, TriplePattern, Variable};
use std::sync::Arc;
use support::{
    entry, knows, knows_lives_in, lives_in, settle, sort_rows, wait_for_swaps, NestedLoopJoin,
};

const DESCRIPTIONS: &str = r#"
@prefix void: <http://rdfs.org/ns/void#> .

<http://a.example/.well-known/void> a void:Dataset ;
    void:triples 11 ;
    void:propertyPartition [ void:property <http://example.com/knows> ; void:triples 1 ] ,
        [ void:property <http://example.com/livesIn> ; void:triples 10 ] .

<http://b.example/.well-known/void> a void:Dataset ;
    void:triples 50 ;
    void:propertyPartition [ void:property <http://example.com/knows> ; void:triples 50 ] .
"#;

fn descriptions() -> Vec<VoidDescription> {
    VoidDescriptionExtractor::new()
        .with_infer_uri_space(true)
        .parse(RdfFormat::Turtle, DESCRIPTIONS.as_bytes())
        .unwrap()
}

fn dataset(description: VoidDescription) -> DatasetRef {
    let source = description.uri_space.clone().unwrap_or_default();
    Arc::new(VoidDataset::new(
        description,
        source,
        Arc::new(VoidFormulaEstimator),
    ))
}

fn pattern(subject: &str, predicate: &str, object: &str) -> Operation {
    Operation::from_triple_pattern(TriplePattern {
        subject: Variable::new_unchecked(subject).into(),
        predicate: NamedNode::new_unchecked(predicate).into(),
        object: Variable::new_unchecked(object).into(),
    })
}

fn accumulating_source(operation: &Operation) -> Arc<AccumulatingMetadataSource> {
    let context = ActionContext::new().set(KeysQueryOperation::OPERATION, operation.clone());
    Arc::new(AccumulatingMetadataSource::new(
        Arc::new(CardinalityVoidAccumulator::new()),
        context,
        Vec::new(),
    ))
}

#[test]
fn extracted_descriptions_estimate_patterns() {
    let [a, b] = <[VoidDescription; 2]>::try_from(descriptions()).unwrap();
    assert_eq!(a.uri_space.as_deref(), Some("http://a.example/"));
    assert_eq!(b.uri_space.as_deref(), Some("http://b.example/"));

    let source = accumulating_source(&pattern("a", "http://example.com/knows", "b"));
    let cardinality = source
        .append(&SourceMetadata::default().with_datasets(vec![dataset(a), dataset(b)]))
        .unwrap();

    assert_eq!(cardinality, Cardinality::estimate(51.0));
}

#[tokio::test]
async fn appended_dataset_swaps_join_plan() {
    let [a, b] = <[VoidDescription; 2]>::try_from(descriptions()).unwrap();
    let knows_operation = pattern("a", "http://example.com/knows", "b");
    let lives_in_operation = pattern("b", "http://example.com/livesIn", "c");
    let knows_source = accumulating_source(&knows_operation);
    let lives_in_source = accumulating_source(&lives_in_operation);

    // Both sources start out with the statistics of the first dataset
    let a = dataset(a);
    knows_source
        .append(&SourceMetadata::default().with_datasets(vec![Arc::clone(&a)]))
        .unwrap();
    lives_in_source
        .append(&SourceMetadata::default().with_datasets(vec![a]))
        .unwrap();

    let entries = vec![
        entry(
            knows_operation,
            knows(),
            Arc::clone(&knows_source) as MetadataSourceRef,
        ),
        entry(
            lives_in_operation,
            lives_in(),
            Arc::clone(&lives_in_source) as MetadataSourceRef,
        ),
    ];
    let join = Arc::new(NestedLoopJoin::default());
    let actor = AdaptiveJoinActor::new(
        "restart",
        AdaptiveJoinConfig::default().with_evaluation_after_metadata_update(true),
        AdaptiveJoinMediators::with_defaults(Arc::clone(&join) as _),
    );
    let mut output = actor
        .get_restartable_output(JoinAction {
            join_type: LogicalJoinType::Inner,
            entries: entries.clone(),
            context: ActionContext::new(),
        })
        .await
        .unwrap();
    settle().await;

    let mut rows = Vec::new();
    for _ in 0..2 {
        rows.push(output.bindings_stream.next().await.unwrap().unwrap());
    }

    // The second dataset makes `?a knows ?b` the larger entry
    let cardinality = knows_source
        .append(&SourceMetadata::default().with_datasets(vec![dataset(b)]))
        .unwrap();
    assert_eq!(cardinality, Cardinality::estimate(51.0));
    wait_for_swaps(&output.bindings_stream, 1).await;

    rows.extend(output.bindings_stream.try_collect::<Vec<_>>().await.unwrap());
    sort_rows(&mut rows);

    assert_eq!(rows, knows_lives_in());
    assert_eq!(join.executions(), 2);
    assert!(entries
        .iter()
        .all(|entry| entry.output.bindings_stream.is_destroyed()));
}
