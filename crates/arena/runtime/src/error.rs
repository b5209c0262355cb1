//! Arena errors.

use arena_container::ContainerError;
use arena_ssn::{ResolutionError, SsnError};
use thiserror::Error;

/// Errors that stop an arena evaluation before any candidate runs.
///
/// Failures of individual candidates are reported, not raised.
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Ssn(#[from] SsnError),

    #[error("container error: {0}")]
    Container(#[from] ContainerError),

    #[error("tracing initialisation failed: {0}")]
    Telemetry(String),
}

impl From<ResolutionError> for ArenaError {
    fn from(err: ResolutionError) -> Self {
        ArenaError::Ssn(err.into())
    }
}

/// Result alias for arena operations.
pub type ArenaResult<T> = Result<T, ArenaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err: ArenaError = ResolutionError::MissingOperation {
            sheet: "s".into(),
            row: 4,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "resolution error: sheet 's' row 4: missing operation"
        );

        let err = ArenaError::Telemetry("already set".into());
        assert_eq!(err.to_string(), "tracing initialisation failed: already set");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ArenaError>();
    }
}
