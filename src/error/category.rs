//! Failure classification for connection handling.
//!
//! Every connection-level failure lands in exactly one class, and the class
//! alone decides what the controller does next.

use std::fmt;

/// What the controller should do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Transient: wait and reconnect.
    Retryable,

    /// Permanent: surface the error and stop after this single attempt.
    Fatal,

    /// Caller asked to stop. Not an error.
    Cancelled,
}

impl FailureClass {
    /// Returns a short label for the class suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::Retryable => "retryable",
            FailureClass::Fatal => "fatal",
            FailureClass::Cancelled => "cancelled",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureClass::Retryable)
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
