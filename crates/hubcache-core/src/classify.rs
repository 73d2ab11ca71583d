//! Cacheability decision for request paths

use crate::path::{PathDescriptor, RequestKind};

/// How a request path may be served
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDecision {
    /// File content: fetch once, store, serve from cache afterwards
    Fetchable(PathDescriptor),
    /// Hub metadata: proxy, never store
    MetadataOnly,
    /// No recognized grammar
    Unsupported,
}

impl FetchDecision {
    /// Only fetchable content may become a stored record
    pub fn is_cacheable(&self) -> bool {
        matches!(self, FetchDecision::Fetchable(_))
    }
}

/// Classify a relative request path
pub fn classify(path: &str) -> FetchDecision {
    let descriptor = PathDescriptor::parse(path);
    match descriptor.request_kind {
        RequestKind::Resolve => FetchDecision::Fetchable(descriptor),
        RequestKind::Api => FetchDecision::MetadataOnly,
        RequestKind::Unknown => FetchDecision::Unsupported,
    }
}
