//! Analysis Progress - follows a long-running repository analysis over
//! Server-Sent Events.
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod sse;
pub mod traits;
