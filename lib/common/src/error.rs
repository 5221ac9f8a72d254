use std::error::Error;
use std::sync::Arc;

/// An error that is raised while executing a join or one of its inputs.
///
/// The error is [Clone] as a single failing input must be reported to every reader of that
/// input.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum JoinError {
    /// A mediator could not handle the action.
    #[error("The {mediator} mediator failed: {message}")]
    Mediator {
        /// The name of the mediator.
        mediator: &'static str,
        /// The reason of the failure.
        message: String,
    },
    /// The metadata of a join entry could not be obtained.
    #[error("Could not obtain metadata: {0}")]
    Metadata(String),
    /// The join entries handed to an operation are unusable.
    #[error("Invalid join entries: {0}")]
    InvalidEntries(String),
    /// An error from an upstream producer of bindings.
    #[error(transparent)]
    External(Arc<dyn Error + Send + Sync + 'static>),
}

impl JoinError {
    /// Wraps an arbitrary error from an upstream producer.
    #[inline]
    pub fn external(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::External(Arc::from(error.into()))
    }

    /// Builds a [JoinError::Mediator] from a printable message.
    #[inline]
    pub fn mediator(mediator: &'static str, message: impl Into<String>) -> Self {
        Self::Mediator {
            mediator,
            message: message.into(),
        }
    }
}

pub type JoinResult<T> = Result<T, JoinError>;
