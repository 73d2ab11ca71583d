//! hubcache-core: request-path interpretation for the hub pull-through cache
//!
//! This crate provides the pure, synchronous pieces of hubcache:
//! - Hub path grammar (resolve / api / unknown)
//! - Request classification (cacheable content vs. metadata)
//! - Upstream URL construction
//! - Content-type lookup by extension
//! - Cache keys and content records
//! - Configuration types and error handling

pub mod classify;
pub mod config;
pub mod content_type;
pub mod error;
pub mod path;
pub mod record;
pub mod remote;

pub use classify::*;
pub use config::*;
pub use content_type::*;
pub use error::*;
pub use path::*;
pub use record::*;
pub use remote::*;
