#![cfg(test)]

mod support;

use futures::{StreamExt, TryStreamExt};
use rdf_adaptive::common::mediators::{JoinAction, JoinMediator};
use rdf_adaptive::common::metadata::{Metadata, MetadataCell, MetadataSourceRef};
use rdf_adaptive::common::{ActionContext, JoinEntry, KeysRdfJoin, LogicalJoinType};
use rdf_adaptive::join::{
    AdaptiveJoinActor, AdaptiveJoinConfig, AdaptiveJoinMediators, AdaptiveJoinOutput,
    RestartBudget, RestartCondition,
};
use rdf_adaptive::model::{Bindings, Cardinality};
use std::sync::Arc;
use std::time::Duration;
use support::{
    entry, knows, knows_lives_in, lives_in, pattern, settle, sort_rows, wait_for_swaps,
    NestedLoopJoin,
};

struct Fixture {
    join: Arc<NestedLoopJoin>,
    knows: Arc<MetadataCell>,
    lives_in: Arc<MetadataCell>,
    entries: Vec<JoinEntry>,
}

impl Fixture {
    /// Two entries with the cardinalities 1 (`?a knows ?b`) and 10 (`?b lives in ?c`).
    fn new() -> Self {
        let knows_metadata = Arc::new(MetadataCell::new(Metadata::new(
            Cardinality::estimate(1.0),
            Vec::new(),
        )));
        let lives_in_metadata = Arc::new(MetadataCell::new(Metadata::new(
            Cardinality::estimate(10.0),
            Vec::new(),
        )));
        let entries = vec![
            entry(
                pattern("a", "b"),
                knows(),
                Arc::clone(&knows_metadata) as MetadataSourceRef,
            ),
            entry(
                pattern("b", "c"),
                lives_in(),
                Arc::clone(&lives_in_metadata) as MetadataSourceRef,
            ),
        ];
        Self {
            join: Arc::new(NestedLoopJoin::default()),
            knows: knows_metadata,
            lives_in: lives_in_metadata,
            entries,
        }
    }

    fn actor(&self, config: AdaptiveJoinConfig) -> AdaptiveJoinActor {
        AdaptiveJoinActor::new(
            "restart",
            config,
            AdaptiveJoinMediators::with_defaults(Arc::clone(&self.join) as _),
        )
    }

    fn action(&self, context: ActionContext) -> JoinAction {
        JoinAction {
            join_type: LogicalJoinType::Inner,
            entries: self.entries.clone(),
            context,
        }
    }

    async fn execute(&self, config: AdaptiveJoinConfig) -> AdaptiveJoinOutput {
        let output = self
            .actor(config)
            .get_restartable_output(self.action(ActionContext::new()))
            .await
            .unwrap();
        settle().await;
        output
    }

    fn originals_destroyed(&self) -> bool {
        self.entries
            .iter()
            .all(|entry| entry.output.bindings_stream.is_destroyed())
    }
}

fn metadata_triggered() -> AdaptiveJoinConfig {
    AdaptiveJoinConfig::default().with_evaluation_after_metadata_update(true)
}

async fn take(output: &mut AdaptiveJoinOutput, count: usize) -> Vec<Bindings> {
    let mut rows = Vec::new();
    for _ in 0..count {
        rows.push(output.bindings_stream.next().await.unwrap().unwrap());
    }
    rows
}

async fn finish(mut output: AdaptiveJoinOutput, mut rows: Vec<Bindings>) -> Vec<Bindings> {
    while let Some(bindings) = output.bindings_stream.try_next().await.unwrap() {
        rows.push(bindings);
    }
    sort_rows(&mut rows);
    rows
}

#[tokio::test]
async fn swap_after_cardinality_update_produces_every_row_once() {
    let fixture = Fixture::new();
    let mut output = fixture.execute(metadata_triggered()).await;
    let rows = take(&mut output, 2).await;

    // Now `?b lives in ?c` is the smaller entry
    fixture.knows.update_cardinality(Cardinality::estimate(20.0));
    wait_for_swaps(&output.bindings_stream, 1).await;

    let rows = finish(output, rows).await;
    assert_eq!(rows, knows_lives_in());
    assert_eq!(fixture.join.executions(), 2);
    assert!(fixture.originals_destroyed());
}

#[tokio::test]
async fn restart_limit_blocks_second_swap() {
    let fixture = Fixture::new();
    let config = metadata_triggered().with_restart_budget(RestartBudget::Limited(1));
    let mut output = fixture.execute(config).await;
    let rows = take(&mut output, 1).await;

    fixture.knows.update_cardinality(Cardinality::estimate(20.0));
    wait_for_swaps(&output.bindings_stream, 1).await;
    let mut rows = [rows, take(&mut output, 1).await].concat();
    fixture
        .lives_in
        .update_cardinality(Cardinality::estimate(100.0));
    settle().await;
    rows.extend(take(&mut output, 1).await);

    assert_eq!(output.bindings_stream.swap_count(), 1);
    let rows = finish(output, rows).await;
    assert_eq!(rows, knows_lives_in());
    assert_eq!(fixture.join.executions(), 2);
}

#[tokio::test]
async fn no_swap_above_restart_threshold() {
    let fixture = Fixture::new();
    // 30 rows are expected after the update, the threshold is 3 rows
    let config = metadata_triggered().with_restart_condition(
        RestartCondition::ProducedBelowThreshold {
            restart_threshold: 0.1,
        },
    );
    let mut output = fixture.execute(config).await;
    let rows = take(&mut output, 4).await;

    fixture.knows.update_cardinality(Cardinality::estimate(20.0));
    settle().await;

    assert_eq!(output.bindings_stream.swap_count(), 0);
    let rows = finish(output, rows).await;
    assert_eq!(rows, knows_lives_in());
    assert_eq!(fixture.join.executions(), 1);
}

#[tokio::test]
async fn cardinality_change_swaps_once() {
    let fixture = Fixture::new();
    let config = metadata_triggered()
        .with_restart_budget(RestartBudget::Once)
        .with_restart_condition(RestartCondition::CardinalityChange {
            cardinality_threshold: 10.0,
            cardinality_threshold_multiplier: 10.0,
        });
    let mut output = fixture.execute(config).await;
    let rows = take(&mut output, 3).await;

    // Too small to count as a change
    fixture.knows.update_cardinality(Cardinality::estimate(5.0));
    settle().await;
    assert_eq!(output.bindings_stream.swap_count(), 0);

    fixture.knows.update_cardinality(Cardinality::estimate(500.0));
    wait_for_swaps(&output.bindings_stream, 1).await;

    let rows = finish(output, rows).await;
    assert_eq!(rows, knows_lives_in());
    assert_eq!(fixture.join.executions(), 2);
}

#[tokio::test(start_paused = true)]
async fn swap_timeout_restarts_join() {
    let fixture = Fixture::new();
    let config = AdaptiveJoinConfig::default().with_swap_timeout(Some(Duration::from_secs(1)));
    let mut output = fixture.execute(config).await;
    let rows = take(&mut output, 2).await;

    tokio::time::advance(Duration::from_secs(2)).await;

    let rows = finish(output, rows).await;
    assert_eq!(rows, knows_lives_in());
    assert_eq!(fixture.join.executions(), 2);
}

#[tokio::test]
async fn dropping_output_destroys_originals() {
    let fixture = Fixture::new();
    let mut output = fixture.execute(metadata_triggered()).await;
    take(&mut output, 1).await;
    assert!(!fixture.originals_destroyed());

    drop(output);

    assert!(fixture.originals_destroyed());
    // Destroying again is a no-op
    assert!(!fixture.entries[0].output.bindings_stream.destroy());
}

#[tokio::test]
async fn output_debug_shows_stream_state() {
    let fixture = Fixture::new();
    let output = fixture.execute(metadata_triggered()).await;

    let rendered = format!("{output:?}");

    assert!(rendered.starts_with("AdaptiveJoinOutput"));
    assert!(rendered.contains("swap_count: 0"));
}

#[tokio::test]
async fn mediate_runs_adaptive_join() {
    let fixture = Fixture::new();
    let actor = fixture.actor(metadata_triggered());

    let output = actor
        .mediate(fixture.action(ActionContext::new()))
        .await
        .unwrap();
    let mut rows = output.bindings_stream.try_collect::<Vec<_>>().await.unwrap();
    sort_rows(&mut rows);

    assert_eq!(rows, knows_lives_in());
    assert!(fixture.originals_destroyed());
}

#[tokio::test]
async fn mediate_delegates_for_wrapped_entries() {
    let fixture = Fixture::new();
    let actor = fixture.actor(metadata_triggered());
    let wrapped = fixture
        .entries
        .iter()
        .map(|entry| entry.operation.clone())
        .collect::<Vec<_>>();

    let output = actor
        .mediate(fixture.action(ActionContext::new().set(KeysRdfJoin::WRAPPED_OPERATIONS, wrapped)))
        .await
        .unwrap();
    let mut rows = output.bindings_stream.try_collect::<Vec<_>>().await.unwrap();
    sort_rows(&mut rows);

    assert_eq!(rows, knows_lives_in());
    assert_eq!(fixture.join.executions(), 1);
    assert!(!fixture.originals_destroyed());
}

#[tokio::test]
async fn update_before_evaluation_starts_is_not_lost() {
    let fixture = Fixture::new();
    let output = fixture
        .actor(metadata_triggered())
        .get_restartable_output(fixture.action(ActionContext::new()))
        .await
        .unwrap();

    // The evaluation task has not run yet
    fixture.knows.update_cardinality(Cardinality::estimate(20.0));
    wait_for_swaps(&output.bindings_stream, 1).await;

    let rows = finish(output, Vec::new()).await;
    assert_eq!(rows, knows_lives_in());
    assert_eq!(fixture.join.executions(), 2);
}

#[tokio::test(start_paused = true)]
async fn timeout_swap_does_not_use_restart_budget() {
    let fixture = Fixture::new();
    let config = metadata_triggered()
        .with_restart_budget(RestartBudget::Once)
        .with_swap_timeout(Some(Duration::from_secs(1)));
    let mut output = fixture.execute(config).await;
    let rows = take(&mut output, 2).await;

    tokio::time::advance(Duration::from_secs(2)).await;
    let mut rows = [rows, take(&mut output, 1).await].concat();
    assert_eq!(output.bindings_stream.swap_count(), 1);

    fixture.knows.update_cardinality(Cardinality::estimate(20.0));
    wait_for_swaps(&output.bindings_stream, 2).await;
    rows.extend(take(&mut output, 1).await);

    let rows = finish(output, rows).await;
    assert_eq!(rows, knows_lives_in());
    assert_eq!(fixture.join.executions(), 3);
}

#[tokio::test(start_paused = true)]
async fn interval_evaluation_swaps_on_tick() {
    let fixture = Fixture::new();
    let config = AdaptiveJoinConfig::default()
        .with_evaluation_after_metadata_update(false)
        .with_evaluation_interval(Some(Duration::from_secs(1)));
    let mut output = fixture.execute(config).await;
    let rows = take(&mut output, 2).await;

    fixture.knows.update_cardinality(Cardinality::estimate(20.0));
    settle().await;
    assert_eq!(output.bindings_stream.swap_count(), 0);

    tokio::time::advance(Duration::from_millis(1100)).await;
    wait_for_swaps(&output.bindings_stream, 1).await;

    let rows = finish(output, rows).await;
    assert_eq!(rows, knows_lives_in());
    assert_eq!(fixture.join.executions(), 2);
}
