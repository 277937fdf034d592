//! Streaming-related error types.
//!
//! This module defines the failures that can end one connection to the
//! progress stream, and how each one is classified.

use std::fmt;

use super::category::FailureClass;
use crate::traits::HttpError;

/// HTTP statuses that will not improve by reconnecting.
pub const NON_RETRYABLE_STATUSES: [u16; 7] = [400, 401, 403, 404, 405, 422, 429];

/// Why a single stream connection ended without a terminal frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFailure {
    /// Server answered the stream request with a non-2xx status.
    HttpStatus { status: u16, message: String },

    /// The stream could not be opened.
    ConnectionFailed { message: String },

    /// The stream broke while reading.
    ReadFailed { message: String },

    /// The server closed the stream before a terminal status arrived.
    EndedEarly,

    /// The caller cancelled the connection.
    Cancelled,
}

impl StreamFailure {
    /// Classify this failure.
    ///
    /// Statuses in [`NON_RETRYABLE_STATUSES`] and any other 4xx are fatal;
    /// 5xx and all network-level failures are retryable.
    pub fn class(&self) -> FailureClass {
        match self {
            StreamFailure::HttpStatus { status, .. } => {
                if NON_RETRYABLE_STATUSES.contains(status) || (400..500).contains(status) {
                    FailureClass::Fatal
                } else {
                    FailureClass::Retryable
                }
            }
            StreamFailure::ConnectionFailed { .. }
            | StreamFailure::ReadFailed { .. }
            | StreamFailure::EndedEarly => FailureClass::Retryable,
            StreamFailure::Cancelled => FailureClass::Cancelled,
        }
    }

    /// Get a user-friendly error message.
    ///
    /// Never includes transport details; those belong in the log.
    pub fn user_message(&self) -> String {
        match self {
            StreamFailure::HttpStatus { status, .. } => match *status {
                400 => "Invalid request. The analysis stream could not be opened.".to_string(),
                401 => "Not authenticated. Please sign in again.".to_string(),
                403 => "Access denied. You don't have permission to view this analysis."
                    .to_string(),
                404 => "Analysis not found. It may have been deleted.".to_string(),
                405 => "Method not allowed by the analysis server.".to_string(),
                422 => "Invalid analysis request.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => "The analysis server is experiencing issues.".to_string(),
                _ => format!("The analysis server rejected the request (HTTP {}).", status),
            },
            StreamFailure::ConnectionFailed { .. } => {
                "Unable to connect to the analysis server.".to_string()
            }
            StreamFailure::ReadFailed { .. } | StreamFailure::EndedEarly => {
                "Connection to the analysis stream was lost.".to_string()
            }
            StreamFailure::Cancelled => "The stream was cancelled.".to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamFailure::HttpStatus { .. } => "E_STREAM_HTTP",
            StreamFailure::ConnectionFailed { .. } => "E_STREAM_CONN",
            StreamFailure::ReadFailed { .. } => "E_STREAM_READ",
            StreamFailure::EndedEarly => "E_STREAM_EOF",
            StreamFailure::Cancelled => "E_STREAM_CANCEL",
        }
    }

    /// Failure while opening the stream.
    pub fn from_open_error(err: HttpError) -> Self {
        match err {
            HttpError::HttpStatus { status, message } => {
                StreamFailure::HttpStatus { status, message }
            }
            HttpError::Cancelled => StreamFailure::Cancelled,
            other => StreamFailure::ConnectionFailed {
                message: other.to_string(),
            },
        }
    }

    /// Failure while reading an open stream.
    pub fn from_read_error(err: HttpError) -> Self {
        match err {
            HttpError::Cancelled => StreamFailure::Cancelled,
            other => StreamFailure::ReadFailed {
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for StreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamFailure::HttpStatus { status, message } => {
                write!(f, "HTTP {} on stream request: {}", status, message)
            }
            StreamFailure::ConnectionFailed { message } => {
                write!(f, "Stream connection failed: {}", message)
            }
            StreamFailure::ReadFailed { message } => write!(f, "Stream read failed: {}", message),
            StreamFailure::EndedEarly => write!(f, "Stream ended before a terminal status"),
            StreamFailure::Cancelled => write!(f, "Stream cancelled"),
        }
    }
}

impl std::error::Error for StreamFailure {}
