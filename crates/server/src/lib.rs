//! Packhouse Server library.
//!
//! This crate provides the warehouse inventory service as a library,
//! allowing it to be tested and reused.
//!
//! # Architecture
//!
//! - [`engine`] - The transition engine: all stock mutations funnel through
//!   its check-then-commit path under row-level locking
//! - [`engine::availability`] - Pure availability calculator shared by
//!   validation and advisory display
//! - [`db`] - `PostgreSQL` repositories (stock ledger, catalog, transaction log)
//! - [`routes`] - JSON HTTP surface
//!
//! Callers never read-modify-write stock counters directly; the engine is the
//! only writer.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
