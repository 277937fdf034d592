//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`HttpJobLauncher`] - Job-start endpoint client on top of any [`HttpClient`](crate::traits::HttpClient)
//! - [`InMemoryTaskRegistry`] - Process-local task registry
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - Scripted HTTP responses and byte streams
//! - [`mock::MockJobLauncher`] - Fixed job-start outcomes

pub mod http_launcher;
pub mod memory_registry;
pub mod mock;
pub mod reqwest_http;

pub use http_launcher::HttpJobLauncher;
pub use memory_registry::InMemoryTaskRegistry;
pub use mock::{MockHttpClient, MockJobLauncher, MockResponse};
pub use reqwest_http::ReqwestHttpClient;
