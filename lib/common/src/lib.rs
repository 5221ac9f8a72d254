pub mod context;
pub mod error;
mod join_entry;
pub mod mediators;
pub mod metadata;
pub mod stream;

pub use context::{ActionContext, ContextKey, KeysQueryOperation, KeysRdfJoin};
pub use error::{JoinError, JoinResult};
pub use join_entry::{JoinEntry, JoinEntryOutput, JoinEntryWithMetadata, LogicalJoinType};
pub use stream::{ClonableBindingsStream, ClonedBindingsStream, SendableBindingsStream};
