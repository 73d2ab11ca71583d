//! hubcache-api: HTTP server
//!
//! This crate serves hub-shaped paths through the pull-through cache and
//! exposes cache status endpoints.

pub mod rest;

pub use rest::{create_router, AppState};
