//! Mock implementations for testing.
//!
//! These stand in for the network-facing traits so the controller can be
//! driven without a server.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with scripted per-URL responses
//! - [`MockJobLauncher`] - Job launcher with a fixed outcome
//!
//! For the task registry, the in-memory [`crate::adapters::InMemoryTaskRegistry`]
//! doubles as a test fake.

pub mod http;
pub mod job;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use job::MockJobLauncher;
