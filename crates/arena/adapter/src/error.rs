//! Adaptation errors.

use arena_container::ContainerError;
use thiserror::Error;

/// Errors from a [`NameSimilarity`](crate::NameSimilarity) primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimilarityError {
    #[error("similarity input must not be blank")]
    BlankInput,
}

/// Errors raised while materialising an adapted implementation.
///
/// None of these escape [`AdaptationEngine::adapt`](crate::AdaptationEngine::adapt):
/// a permutation that cannot be materialised is logged and skipped.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("container error: {0}")]
    Container(#[from] ContainerError),

    #[error("similarity error: {0}")]
    Similarity(#[from] SimilarityError),
}

pub type AdapterResult<T> = Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;
    use arena_types::ContainerId;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            SimilarityError::BlankInput.to_string(),
            "similarity input must not be blank"
        );
        let err = AdapterError::from(ContainerError::Disposed(ContainerId::from("c9")));
        assert!(err.to_string().starts_with("container error:"));
        assert!(err.to_string().contains("c9"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AdapterError>();
        assert_send_sync::<SimilarityError>();
    }
}
