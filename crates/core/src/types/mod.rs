//! Core types for Packhouse.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod item_ref;
pub mod transition;

pub use id::*;
pub use item_ref::ItemRef;
pub use transition::{ParseEnumError, StockBucket, TransitionType};
