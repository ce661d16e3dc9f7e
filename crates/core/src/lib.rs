//! Packhouse Core - Shared types library.
//!
//! This crate provides common types used across all Packhouse components:
//! - `server` - Warehouse inventory service (stock ledger, transition engine)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, stock buckets, transition
//!   kinds, and base/combo item references

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
