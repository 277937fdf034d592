//! Error types for the progress client.
//!
//! - [`FailureClass`] - what to do about a connection failure
//! - [`StreamFailure`] - why one stream connection ended
//! - [`ConfigError`] - invalid configuration
//!
//! Transport errors live with their trait ([`crate::traits::HttpError`],
//! [`crate::traits::JobStartError`]).
//!
//! | Failure | Class | Surfaced to the user |
//! |---------|-------|----------------------|
//! | HTTP 400/401/403/404/405/422/429, other 4xx | Fatal | Immediately, status-specific |
//! | HTTP 5xx | Retryable | Only after retries run out |
//! | Connection / read error, early EOF | Retryable | Only after retries run out |
//! | Cancellation | Cancelled | Never |

mod category;
mod config;
mod stream;

pub use category::FailureClass;
pub use config::ConfigError;
pub use stream::{StreamFailure, NON_RETRYABLE_STATUSES};
