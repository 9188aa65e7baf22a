//! CLI command implementations.
//!
//! - [`fetch`] - fetch one tile through the coordinator
//! - [`cache`] - inspect a tile store (get, stats)
//! - [`placeholder`] - write the "NO DATA" placeholder image

pub mod cache;
pub mod common;
pub mod fetch;
pub mod placeholder;
