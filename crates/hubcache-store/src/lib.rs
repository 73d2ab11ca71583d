//! hubcache-store: Content storage
//!
//! This crate provides the persistence side of the pull-through cache:
//! - The `ContentStore` trait
//! - A disk-backed, content-addressed cache
//! - LRU eviction

pub mod cache;
pub mod traits;

pub use cache::{CacheStats, ContentCache, StoredContent};
pub use traits::ContentStore;
