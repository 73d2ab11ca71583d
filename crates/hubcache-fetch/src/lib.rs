//! hubcache-fetch: Upstream fetching
//!
//! This crate provides the fetch side of the pull-through cache:
//! - The `Fetcher` trait and an HTTP implementation
//! - A hub metadata client
//! - The single-flight pull-through executor

pub mod http;
pub mod hub;
pub mod pull_through;
pub mod traits;

#[cfg(test)]
mod testing;

pub use http::HttpFetcher;
pub use hub::HubClient;
pub use pull_through::{PullThrough, Served};
pub use traits::{FetchedBlob, Fetcher};
