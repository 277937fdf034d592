//! Trait abstractions for dependency injection and testability.
//!
//! The stream controller talks to the outside world only through these
//! traits, so tests can swap in the mocks from `adapters::mock`.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP operations (POST, streamed GET)
//! - [`JobLauncher`] - Starting an analysis job
//! - [`ProgressSink`] - Mirroring progress into a task registry

pub mod http;
pub mod job;
pub mod sink;

pub use http::{ByteStream, Headers, HttpClient, HttpError, Response};
pub use job::{JobLauncher, JobStartError, JobStartResponse, JobTarget};
pub use sink::{ProgressSink, TaskEntry, TaskUpdate};
