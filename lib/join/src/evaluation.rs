use crate::config::{AdaptiveJoinConfig, RestartCondition};
use crate::order::{orders_differ, render_join_order, JoinOrderEvaluator};
use crate::restart_stream::SwapHandle;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use rdf_adaptive_common::metadata::{Metadata, MetadataSourceRef, MetadataValidationState};
use rdf_adaptive_common::{ActionContext, JoinEntry, JoinEntryWithMetadata, JoinError, JoinResult};
use std::sync::Arc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

type MetadataWatcher = BoxFuture<'static, (usize, JoinResult<Metadata>)>;

/// Waits until `state` is invalidated and fetches the updated metadata of entry `index`.
fn watch(index: usize, source: MetadataSourceRef, state: &MetadataValidationState) -> MetadataWatcher {
    let invalidated = state.invalidated();
    async move {
        invalidated.await;
        (index, source.metadata().await)
    }
    .boxed()
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Re-evaluates the join order of a running adaptive join and swaps the join plan of its
/// output stream if that is worthwhile.
pub(crate) struct EvaluationLoop {
    pub(crate) config: AdaptiveJoinConfig,
    pub(crate) entries: Vec<JoinEntry>,
    pub(crate) context: ActionContext,
    pub(crate) evaluator: JoinOrderEvaluator,
    pub(crate) selectivity: f64,
    pub(crate) current_order: Vec<JoinEntryWithMetadata>,
    pub(crate) handle: SwapHandle,
}

struct LoopState {
    /// Whether `current_order` has changed since the last swap.
    order_updated: bool,
    /// The last known metadata of each entry.
    metadata: Vec<Option<Metadata>>,
    /// The last cardinality change that met the configured threshold.
    last_change: Option<(f64, f64)>,
    /// Swaps triggered by this loop. Timeout swaps of the stream are not counted.
    restarts: usize,
}

/// Watches the metadata snapshots that the current join order is based on.
pub(crate) struct EntryWatchers {
    state: LoopState,
    watchers: FuturesUnordered<MetadataWatcher>,
}

impl EvaluationLoop {
    /// Registers invalidation listeners on `snapshots`, the metadata of each entry in the order
    /// of `self.entries`.
    ///
    /// Must be called before the join output is handed out. Invalidations that happen
    /// afterward, even before [EvaluationLoop::run] is first polled, are not lost.
    pub(crate) fn watch_entries(&self, snapshots: Vec<Metadata>) -> EntryWatchers {
        let watchers = snapshots
            .iter()
            .enumerate()
            .map(|(index, metadata)| {
                watch(
                    index,
                    Arc::clone(&self.entries[index].output.metadata),
                    &metadata.state,
                )
            })
            .collect();
        EntryWatchers {
            state: LoopState {
                order_updated: false,
                metadata: snapshots.into_iter().map(Some).collect(),
                last_change: None,
                restarts: 0,
            },
            watchers,
        }
    }

    pub(crate) async fn run(mut self, watchers: EntryWatchers) {
        let EntryWatchers {
            mut state,
            mut watchers,
        } = watchers;

        let mut interval = self.config.evaluation_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            if self.handle.is_ended() || !self.config.restart_budget.allows(state.restarts) {
                break;
            }

            tokio::select! {
                Some((index, result)) = watchers.next() => match result {
                    Ok(metadata) => {
                        if let Some(watcher) = self.on_metadata_update(&mut state, index, metadata).await {
                            watchers.push(watcher);
                        }
                    }
                    Err(error) => self.fail_entry(index, error),
                },
                () = tick(&mut interval), if interval.is_some() => {
                    if state.order_updated {
                        self.attempt_restart(&mut state);
                    }
                },
                else => break,
            }
        }
    }

    /// Handles updated `metadata` of entry `index` and returns the watcher for its next update.
    async fn on_metadata_update(
        &mut self,
        state: &mut LoopState,
        index: usize,
        metadata: Metadata,
    ) -> Option<MetadataWatcher> {
        let previous = state.metadata[index].replace(metadata.clone());
        let watcher = match &previous {
            Some(previous) if previous.state.same_state(&metadata.state) => None,
            _ => Some(watch(
                index,
                Arc::clone(&self.entries[index].output.metadata),
                &metadata.state,
            )),
        };

        if let Some(previous) = &previous {
            if !self.config.restart_condition.cardinality_change_meets_threshold(
                previous.cardinality.value,
                metadata.cardinality.value,
            ) {
                return watcher;
            }
            state.last_change = Some((previous.cardinality.value, metadata.cardinality.value));
        }

        if !state.order_updated {
            match self.evaluator.sorted_entries(&self.entries, &self.context).await {
                Ok(updated_order) => {
                    if orders_differ(&self.current_order, &updated_order) {
                        debug!(
                            current_join_order = ?render_join_order(&self.current_order),
                            updated_join_order = ?render_join_order(&updated_order),
                            "Current join order is sub-optimal"
                        );
                        self.current_order = updated_order;
                        state.order_updated = true;
                        if self.config.evaluation_after_metadata_update {
                            self.attempt_restart(state);
                        }
                    }
                }
                Err(error) => self.fail_entry(index, error),
            }
        }

        watcher
    }

    fn fail_entry(&self, index: usize, error: JoinError) {
        self.entries[index]
            .output
            .bindings_stream
            .destroy_with_error(error);
    }

    /// The estimated number of rows the join produces, based on the last known cardinalities.
    fn expected_bindings(&self, state: &LoopState) -> f64 {
        let total = state
            .metadata
            .iter()
            .flatten()
            .map(|metadata| metadata.cardinality.value)
            .sum::<f64>();
        (total * self.selectivity).ceil()
    }

    fn attempt_restart(&self, state: &mut LoopState) {
        if !self.config.restart_budget.allows(state.restarts) {
            return;
        }

        match self.config.restart_condition {
            RestartCondition::ProducedBelowThreshold { restart_threshold } => {
                let expected_bindings = self.expected_bindings(state);
                let threshold = (restart_threshold * expected_bindings).ceil();
                let produced_bindings = self.handle.total_bindings_produced();

                #[expect(clippy::cast_precision_loss, reason = "Row counts stay far below 2^52")]
                let produced = produced_bindings as f64;
                if produced < threshold {
                    warn!(
                        expected_bindings,
                        produced_bindings,
                        restart_threshold = threshold,
                        "Swapping join order"
                    );
                    self.swap(state);
                } else {
                    warn!(
                        expected_bindings,
                        produced_bindings,
                        restart_threshold = threshold,
                        "Skipping join order swap"
                    );
                }
            }
            RestartCondition::CardinalityChange { .. } => {
                if self.swap(state) {
                    if let Some((old_cardinality, new_cardinality)) = state.last_change {
                        debug!(
                            old_cardinality,
                            new_cardinality,
                            "Swapped source order due to cardinality estimate change"
                        );
                    }
                }
            }
        }
    }

    fn swap(&self, state: &mut LoopState) -> bool {
        let swapped = self.handle.swap_source();
        if swapped {
            state.order_updated = false;
            state.restarts += 1;
        }
        swapped
    }
}
