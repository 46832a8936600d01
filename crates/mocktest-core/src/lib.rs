//! mocktest-core: Question banks, the session state machine, and scoring.
//!
//! This crate defines the data model, the importers, the session controller
//! that owns one test attempt, and the scoring and summary logic that the
//! rest of mocktest builds on.

pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod session;
pub mod statistics;
pub mod timing;
