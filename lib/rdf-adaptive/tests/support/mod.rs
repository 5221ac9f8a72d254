#![allow(dead_code, reason = "Not every test uses every helper")]

use async_trait::async_trait;
use futures::TryStreamExt;
use rdf_adaptive::common::mediators::{JoinAction, JoinMediator, JoinOutput};
use rdf_adaptive::common::metadata::{Metadata, MetadataCell, MetadataSourceRef};
use rdf_adaptive::common::stream::bindings_stream_from_vec;
use rdf_adaptive::common::{ClonableBindingsStream, JoinEntry, JoinResult};
use rdf_adaptive::join::RestartableBindingsStream;
use rdf_adaptive::model::{
    Bindings, Cardinality, Literal, NamedNode, Operation, Term, TriplePattern, Variable,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Joins its entries with nested loops, ordered by ascending cardinality.
///
/// The first entry in this order is the outermost loop, so the order of the produced rows
/// depends on the metadata of the entries at the time of execution.
#[derive(Debug, Default)]
pub struct NestedLoopJoin {
    executions: AtomicUsize,
}

impl NestedLoopJoin {
    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JoinMediator for NestedLoopJoin {
    async fn mediate(&self, action: JoinAction) -> JoinResult<JoinOutput> {
        self.executions.fetch_add(1, Ordering::SeqCst);

        let mut inputs = Vec::new();
        for entry in &action.entries {
            let cardinality = entry.output.metadata.metadata().await?.cardinality.value;
            let rows = entry
                .output
                .bindings_stream
                .clone_stream()
                .try_collect::<Vec<_>>()
                .await?;
            inputs.push((cardinality, rows));
        }
        inputs.sort_by(|(lhs, _), (rhs, _)| lhs.total_cmp(rhs));

        let mut results = vec![Bindings::default()];
        for (_, rows) in inputs {
            results = results
                .iter()
                .flat_map(|left| rows.iter().filter_map(|right| left.merge(right)))
                .collect();
        }

        let metadata = Metadata::new(Cardinality::unknown(), Vec::new());
        Ok(JoinOutput {
            bindings_stream: bindings_stream_from_vec(results),
            metadata: Arc::new(MetadataCell::new(metadata)),
        })
    }
}

pub fn row(values: &[(&str, &str)]) -> Bindings {
    Bindings::new(values.iter().map(|(variable, value)| {
        (
            Variable::new_unchecked(*variable),
            Term::from(Literal::new_simple_literal(*value)),
        )
    }))
}

pub fn pattern(subject: &str, object: &str) -> Operation {
    Operation::from_triple_pattern(TriplePattern {
        subject: Variable::new_unchecked(subject).into(),
        predicate: NamedNode::new_unchecked("http://example.com/p").into(),
        object: Variable::new_unchecked(object).into(),
    })
}

pub fn entry(operation: Operation, rows: Vec<Bindings>, metadata: MetadataSourceRef) -> JoinEntry {
    JoinEntry::new(operation, ClonableBindingsStream::from_vec(rows), metadata)
}

/// `?a ?b` rows of the person-knows-person relation.
pub fn knows() -> Vec<Bindings> {
    vec![
        row(&[("a", "alice"), ("b", "bob")]),
        row(&[("a", "alice"), ("b", "carol")]),
        row(&[("a", "bob"), ("b", "carol")]),
        row(&[("a", "carol"), ("b", "alice")]),
    ]
}

/// `?b ?c` rows of the person-lives-in-city relation.
pub fn lives_in() -> Vec<Bindings> {
    vec![
        row(&[("b", "alice"), ("c", "vienna")]),
        row(&[("b", "bob"), ("c", "graz")]),
        row(&[("b", "carol"), ("c", "linz")]),
        row(&[("b", "carol"), ("c", "vienna")]),
    ]
}

/// The join of [knows] and [lives_in], sorted.
pub fn knows_lives_in() -> Vec<Bindings> {
    let mut expected = vec![
        row(&[("a", "alice"), ("b", "bob"), ("c", "graz")]),
        row(&[("a", "alice"), ("b", "carol"), ("c", "linz")]),
        row(&[("a", "alice"), ("b", "carol"), ("c", "vienna")]),
        row(&[("a", "bob"), ("b", "carol"), ("c", "linz")]),
        row(&[("a", "bob"), ("b", "carol"), ("c", "vienna")]),
        row(&[("a", "carol"), ("b", "alice"), ("c", "vienna")]),
    ];
    sort_rows(&mut expected);
    expected
}

pub fn sort_rows(rows: &mut [Bindings]) {
    rows.sort_by_key(ToString::to_string);
}

/// Gives spawned tasks the chance to run until they wait for something.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Waits until `stream` has swapped its source `count` times.
pub async fn wait_for_swaps(stream: &RestartableBindingsStream, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while stream.swap_count() < count {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}
