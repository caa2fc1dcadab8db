//! Citybox — daily modou collection
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod api;
pub mod auth;
pub mod config;
pub mod engine;
pub mod logging;
pub mod storage;
pub mod transport;
pub mod types;
