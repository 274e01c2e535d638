//! Shared error types for the engine crate.

use thiserror::Error;

use parrot_core::model::OutcomeError;

/// Errors emitted by speech recognizer backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecognizerError {
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("speech recognition unavailable: {0}")]
    Unavailable(String),
    #[error("recognizer stream closed")]
    Closed,
}

/// Errors emitted by `OutcomeReporter` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReporterError {
    #[error("outcome reporting is not configured")]
    Disabled,
    #[error("outcome report failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by the game session and runner.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GameError {
    #[error("game already started")]
    AlreadyStarted,
    #[error("game task was interrupted before finishing")]
    Interrupted,
    #[error(transparent)]
    Recognizer(#[from] RecognizerError),
    #[error(transparent)]
    Outcome(#[from] OutcomeError),
}
