//! Errors raised while building interface specifications.

use thiserror::Error;

/// Errors that can occur when constructing an [`InterfaceSpecification`](crate::InterfaceSpecification).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// The specification itself has no name.
    #[error("interface specification name must not be blank")]
    BlankSpecName,

    /// A method signature has no name.
    #[error("method #{index} of '{spec}' has a blank name")]
    BlankMethodName { spec: String, index: usize },

    /// Two methods share name and parameter types.
    #[error("duplicate method signature '{signature}' in '{spec}'")]
    DuplicateSignature { spec: String, signature: String },
}

/// Result alias for specification construction.
pub type SpecResult<T> = Result<T, SpecError>;
