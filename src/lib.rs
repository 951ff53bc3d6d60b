//! GAFFER — fantasy-football squad optimizer
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod rating;
pub mod rules;
pub mod solver;
pub mod optimizer;
pub mod transfers;
pub mod sources;
pub mod storage;
