use oxrdfio::RdfParseError;
use rdf_adaptive_common::JoinError;

/// An error that is raised while collecting or accumulating dataset statistics.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CardinalityError {
    /// A dataset description could not be parsed.
    #[error(transparent)]
    Parse(#[from] RdfParseError),
    /// A linked dataset description could not be retrieved.
    #[error("Could not dereference {url}: {message}")]
    Dereference { url: String, message: String },
    /// The action context lacks an entry that is required for the estimation.
    #[error("The context entry {0} is required")]
    MissingContextEntry(&'static str),
}

impl From<CardinalityError> for JoinError {
    fn from(error: CardinalityError) -> Self {
        JoinError::external(error)
    }
}

pub type CardinalityResult<T> = Result<T, CardinalityError>;
