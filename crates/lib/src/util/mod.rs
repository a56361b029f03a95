//! Shared utilities.
//!
//! Test helpers for process-driven code.

#[cfg(test)]
pub mod testutil;
