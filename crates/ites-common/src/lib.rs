//! ITES Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities and error handling for the ITES integration harness.
//!
//! # Overview
//!
//! - **Error Handling**: [`CommonError`] and the [`Result`] alias
//! - **Checksums**: MD5 content fingerprints and their comparison
//! - **Logging**: `tracing` subscriber bootstrap shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use ites_common::checksum::{compute_md5, verify_md5};
//!
//! fn check(text: &str, expected: &str) -> ites_common::Result<()> {
//!     verify_md5(expected, &compute_md5(text.as_bytes()))
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

pub use error::{CommonError, Result};
