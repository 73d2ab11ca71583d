//! Upstream hub URL construction

use serde::{Deserialize, Serialize};

use crate::path::RepoType;

/// Where the upstream hub lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteHubDescriptor {
    /// Absolute base URL, trailing slash optional
    pub base_url: String,
}

impl RemoteHubDescriptor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Join `path` onto the base URL with exactly one `/` between them
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Upstream URL for a content path. The hub requires a repo-type
    /// segment, so paths without one get `models/`.
    ///
    /// Does not check that `path` is fetchable; classify first.
    pub fn resolve(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        let has_prefix = path
            .split_once('/')
            .is_some_and(|(head, _)| RepoType::from_plural(head).is_some());

        if has_prefix {
            self.url_for(path)
        } else {
            self.url_for(&format!("{}/{}", RepoType::Model.plural(), path))
        }
    }
}

/// See [`RemoteHubDescriptor::resolve`]
pub fn resolve(hub: &RemoteHubDescriptor, path: &str) -> String {
    hub.resolve(path)
}
