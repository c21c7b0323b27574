//! Cache backend implementations.
//!
//! This module provides the concrete implementation of the `Cache` trait
//! defined in `helpdesk_core::cache`. Only the in-memory LRU cache exists,
//! which suits a single-instance deployment.

mod memory;

pub use memory::MemoryCache;
