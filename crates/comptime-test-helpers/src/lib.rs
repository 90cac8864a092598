//! Test utilities and fixtures for comptime
//!
//! This crate provides shared test helpers that can be used by
//! integration tests (tests/ directory) and benchmarks.

pub mod exports;
pub mod fixtures;
pub mod mocks;

pub use exports::{parse_exports, ParsedExports};
