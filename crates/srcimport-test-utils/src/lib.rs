#![deny(unsafe_code)]

//! Shared test utilities for the srcimport workspace.
//!
//! Provides reusable fixtures, config builders, a mock HTTP origin, and
//! tracing helpers so that individual crate tests stay concise and
//! consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! srcimport-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod fixtures;
pub mod origin;
pub mod tracing_setup;
