use crate::metadata::{Metadata, MetadataSourceRef};
use crate::stream::ClonableBindingsStream;
use rdf_adaptive_model::Operation;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// The logical type of a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalJoinType {
    Inner,
    Optional,
    Minus,
}

/// The output of a single join input.
#[derive(Clone)]
pub struct JoinEntryOutput {
    pub bindings_stream: ClonableBindingsStream,
    pub metadata: MetadataSourceRef,
}

impl Debug for JoinEntryOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinEntryOutput")
            .field("bindings_stream", &self.bindings_stream)
            .finish_non_exhaustive()
    }
}

/// One input of an n-ary join.
#[derive(Debug, Clone)]
pub struct JoinEntry {
    pub operation: Operation,
    pub output: JoinEntryOutput,
}

impl JoinEntry {
    pub fn new(
        operation: Operation,
        bindings_stream: ClonableBindingsStream,
        metadata: MetadataSourceRef,
    ) -> Self {
        Self {
            operation,
            output: JoinEntryOutput {
                bindings_stream,
                metadata,
            },
        }
    }

    /// Returns an entry for the same operation whose stream is a fresh reader of this entry's
    /// stream.
    ///
    /// The original stream stays readable. Dropping the returned entry only drops the reader.
    pub fn clone_entry(&self) -> Self {
        let reader = self.output.bindings_stream.clone_stream();
        Self::new(
            self.operation.clone(),
            ClonableBindingsStream::new(Box::pin(reader)),
            Arc::clone(&self.output.metadata),
        )
    }
}

/// A [JoinEntry] with a resolved metadata snapshot.
#[derive(Debug, Clone)]
pub struct JoinEntryWithMetadata {
    pub operation: Operation,
    pub output: JoinEntryOutput,
    pub metadata: Metadata,
}

impl JoinEntryWithMetadata {
    pub fn new(entry: JoinEntry, metadata: Metadata) -> Self {
        Self {
            operation: entry.operation,
            output: entry.output,
            metadata,
        }
    }
}
