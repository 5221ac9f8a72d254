use crate::config::{AdaptiveJoinConfig, RestartBudget, RestartCondition};
use crate::evaluation::EvaluationLoop;
use crate::hash::DefaultBindingsHash;
use crate::order::{fetch_metadata, JoinOrderEvaluator};
use crate::outcome::{JoinCoefficients, TestFailure, TestFailureReason};
use crate::restart_stream::{CreateSourceFn, RestartableBindingsStream};
use crate::selectivity::FixedJoinSelectivity;
use crate::sort::CardinalityJoinEntriesSort;
use async_trait::async_trait;
use futures::FutureExt;
use rdf_adaptive_common::mediators::{
    HashBindingsMediator, JoinAction, JoinEntriesSortMediator, JoinMediator, JoinOutput,
    JoinSelectivityMediator,
};
use rdf_adaptive_common::metadata::MetadataSourceRef;
use rdf_adaptive_common::{ActionContext, JoinEntry, JoinResult, KeysRdfJoin, LogicalJoinType};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// The collaborators of an [AdaptiveJoinActor].
#[derive(Clone)]
pub struct AdaptiveJoinMediators {
    /// Executes the wrapped join. May dispatch back to the adaptive join actor.
    pub join: Arc<dyn JoinMediator>,
    pub join_entries_sort: Arc<dyn JoinEntriesSortMediator>,
    pub hash_bindings: Arc<dyn HashBindingsMediator>,
    pub join_selectivity: Arc<dyn JoinSelectivityMediator>,
}

impl AdaptiveJoinMediators {
    /// Uses `join` for executing joins and the default implementations for everything else.
    ///
    /// Entries are ordered by ascending cardinality and the join output is estimated as the sum
    /// of the entry cardinalities.
    pub fn with_defaults(join: Arc<dyn JoinMediator>) -> Self {
        Self {
            join,
            join_entries_sort: Arc::new(CardinalityJoinEntriesSort),
            hash_bindings: Arc::new(DefaultBindingsHash),
            join_selectivity: Arc::new(FixedJoinSelectivity::default()),
        }
    }
}

/// The output of an [AdaptiveJoinActor] before it is type-erased into a [JoinOutput].
pub struct AdaptiveJoinOutput {
    pub bindings_stream: RestartableBindingsStream,
    /// The metadata of the first executed join plan.
    pub metadata: MetadataSourceRef,
}

impl Debug for AdaptiveJoinOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveJoinOutput")
            .field("bindings_stream", &self.bindings_stream)
            .finish_non_exhaustive()
    }
}

/// An inner join actor that can restart its join plan while the join is being executed.
///
/// The actor executes the join once with the entries ordered according to their metadata at
/// the time of the call. Afterward, it watches the metadata of the entries and, depending on
/// the [AdaptiveJoinConfig], swaps the running join plan for a freshly executed one if the
/// recommended join order changes. Rows that the abandoned plans have already produced are not
/// produced again.
///
/// The entry streams are cloned for every execution. The original entry streams are destroyed
/// once the output stream ends or is dropped.
pub struct AdaptiveJoinActor {
    name: String,
    config: AdaptiveJoinConfig,
    mediators: AdaptiveJoinMediators,
    evaluator: JoinOrderEvaluator,
}

impl AdaptiveJoinActor {
    pub fn new(
        name: impl Into<String>,
        config: AdaptiveJoinConfig,
        mediators: AdaptiveJoinMediators,
    ) -> Self {
        let evaluator = JoinOrderEvaluator::new(Arc::clone(&mediators.join_entries_sort));
        Self {
            name: name.into(),
            config,
            mediators,
            evaluator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &AdaptiveJoinConfig {
        &self.config
    }

    /// Checks whether this actor can handle `action`.
    ///
    /// # Errors
    ///
    /// Returns a [TestFailure] if the actor cannot handle the action. In this case, the join
    /// must be executed by another actor.
    pub fn test(&self, action: &JoinAction) -> Result<JoinCoefficients, TestFailure> {
        let fail = |reason| Err(TestFailure::new(self.name.as_str(), reason));

        if action.context.has(KeysRdfJoin::SKIP_ADAPTIVE_JOIN) {
            return fail(TestFailureReason::AdaptiveJoinDisabled);
        }
        if let Some(wrapped) = action.context.get(KeysRdfJoin::WRAPPED_OPERATIONS) {
            if !self.config.wrap_all_joins {
                return fail(TestFailureReason::OnlyTopmostJoin);
            }
            if action
                .entries
                .iter()
                .any(|entry| wrapped.contains(&entry.operation))
            {
                return fail(TestFailureReason::AlreadyWrapped);
            }
        }
        if !self.config.has_evaluation_trigger() {
            return fail(TestFailureReason::NoEvaluationConditions);
        }
        if self.config.restart_budget == RestartBudget::Limited(0)
            || !self.config.restart_condition.can_restart()
        {
            return fail(TestFailureReason::CannotRestart);
        }
        if action.join_type != LogicalJoinType::Inner {
            return fail(TestFailureReason::UnsupportedJoinType);
        }
        if action.entries.len() < 2 {
            return fail(TestFailureReason::TooFewEntries);
        }

        // The wrapper itself does not add any costs
        Ok(JoinCoefficients::default())
    }

    /// Executes the join and returns the output as a [JoinOutput].
    pub async fn get_output(&self, action: JoinAction) -> JoinResult<JoinOutput> {
        let output = self.get_restartable_output(action).await?;
        Ok(JoinOutput {
            bindings_stream: Box::pin(output.bindings_stream),
            metadata: output.metadata,
        })
    }

    /// Executes the join and returns the restartable output stream.
    pub async fn get_restartable_output(
        &self,
        action: JoinAction,
    ) -> JoinResult<AdaptiveJoinOutput> {
        let JoinAction {
            join_type,
            entries,
            context,
        } = action;
        let context = self.sub_context(&entries, &context);

        let entries_with_metadata = fetch_metadata(&entries).await?;
        let snapshots = entries_with_metadata
            .iter()
            .map(|entry| entry.metadata.clone())
            .collect::<Vec<_>>();
        let current_order = self.evaluator.sort(entries_with_metadata, &context).await?;
        let selectivity = self
            .mediators
            .join_selectivity
            .selectivity(&context, &entries)
            .await?;

        let first_output =
            execute_join(self.mediators.join.as_ref(), join_type, &entries, &context).await?;
        let hash_function = self
            .mediators
            .hash_bindings
            .hash_function(&context, false)
            .await?;

        let create_source: CreateSourceFn = {
            let join = Arc::clone(&self.mediators.join);
            let entries = entries.clone();
            let context = context.clone();
            Arc::new(move || {
                let join = Arc::clone(&join);
                let entries = entries.clone();
                let context = context.clone();
                async move {
                    execute_join(join.as_ref(), join_type, &entries, &context)
                        .await
                        .map(|output| output.bindings_stream)
                }
                .boxed()
            })
        };

        let mut bindings_stream = RestartableBindingsStream::new(
            first_output.bindings_stream,
            create_source,
            hash_function,
        );
        if let Some(timeout) = self.config.swap_timeout {
            bindings_stream = bindings_stream.with_timeout(timeout);
        }

        let evaluation = self.config.evaluates_join_order().then(|| {
            let evaluation = EvaluationLoop {
                config: self.config.clone(),
                entries: entries.clone(),
                context,
                evaluator: self.evaluator.clone(),
                selectivity,
                current_order,
                handle: bindings_stream.handle(),
            };
            let watchers = evaluation.watch_entries(snapshots);
            tokio::spawn(evaluation.run(watchers))
        });

        let originals = entries
            .into_iter()
            .map(|entry| entry.output.bindings_stream)
            .collect::<Vec<_>>();
        let bindings_stream = bindings_stream.with_on_end(move || {
            if let Some(evaluation) = evaluation {
                evaluation.abort();
            }
            for original in originals {
                original.destroy();
            }
        });

        Ok(AdaptiveJoinOutput {
            bindings_stream,
            metadata: first_output.metadata,
        })
    }

    /// The context for all joins that this actor executes.
    fn sub_context(&self, entries: &[JoinEntry], context: &ActionContext) -> ActionContext {
        let mut wrapped = entries
            .iter()
            .map(|entry| entry.operation.clone())
            .collect::<Vec<_>>();
        if let Some(previous) = context.get(KeysRdfJoin::WRAPPED_OPERATIONS) {
            wrapped.extend(previous.iter().cloned());
        }
        let context = context.set(KeysRdfJoin::WRAPPED_OPERATIONS, wrapped);

        // Heuristic swaps are not coordinated across nesting levels
        match self.config.restart_condition {
            RestartCondition::CardinalityChange { .. } => {
                context.set(KeysRdfJoin::SKIP_ADAPTIVE_JOIN, true)
            }
            RestartCondition::ProducedBelowThreshold { .. } => context,
        }
    }
}

/// Executes the join over fresh readers of the entry streams.
async fn execute_join(
    join: &dyn JoinMediator,
    join_type: LogicalJoinType,
    entries: &[JoinEntry],
    context: &ActionContext,
) -> JoinResult<JoinOutput> {
    join.mediate(JoinAction {
        join_type,
        entries: entries.iter().map(JoinEntry::clone_entry).collect(),
        context: context.clone(),
    })
    .await
}

#[async_trait]
impl JoinMediator for AdaptiveJoinActor {
    /// Runs the adaptive join if the test passes. Otherwise, the action is passed on to the
    /// wrapped join mediator.
    async fn mediate(&self, action: JoinAction) -> JoinResult<JoinOutput> {
        match self.test(&action) {
            Ok(_) => self.get_output(action).await,
            Err(_) => self.mediators.join.mediate(action).await,
        }
    }
}

impl Debug for AdaptiveJoinActor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveJoinActor")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
