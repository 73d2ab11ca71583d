//! Hub path grammar
//!
//! Turns a relative request path into a [`PathDescriptor`]. Two shapes are
//! recognized, tried in order:
//!
//! - resolve: `[<models|datasets|spaces>/]<owner>/<name>/resolve/<revision>/<file...>`
//!   (the owner segment is optional)
//! - api: `api/<models|datasets|spaces>/<owner>/<name>` (owner optional)
//!
//! Anything else parses to [`RequestKind::Unknown`]. Parsing never fails.

use serde::{Deserialize, Serialize};

const RESOLVE_MARKER: &str = "resolve";
const API_MARKER: &str = "api";

/// Content family on the hub
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoType {
    #[default]
    Model,
    Dataset,
    Space,
}

impl RepoType {
    pub const ALL: [RepoType; 3] = [RepoType::Model, RepoType::Dataset, RepoType::Space];

    /// Singular name (`model`)
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoType::Model => "model",
            RepoType::Dataset => "dataset",
            RepoType::Space => "space",
        }
    }

    /// URL prefix form (`models`)
    pub fn plural(&self) -> &'static str {
        match self {
            RepoType::Model => "models",
            RepoType::Dataset => "datasets",
            RepoType::Space => "spaces",
        }
    }

    /// Match a path segment against the plural prefixes
    pub fn from_plural(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.plural() == segment)
    }
}

impl std::fmt::Display for RepoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a parsed path asks the hub for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Bytes of one file at one revision
    Resolve,
    /// Repository metadata
    Api,
    /// No recognized grammar
    Unknown,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestKind::Resolve => write!(f, "resolve"),
            RequestKind::Api => write!(f, "api"),
            RequestKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Structured form of a hub request path
///
/// Only meaningful when `request_kind` is not [`RequestKind::Unknown`]; for
/// unknown paths every string field is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathDescriptor {
    pub repo_type: RepoType,
    /// `<owner>/<name>` or `<name>`
    pub repo_id: String,
    /// Empty for api paths
    pub revision: String,
    /// File path inside the revision, may contain `/`. Empty for api paths
    pub relative_path: String,
    pub request_kind: RequestKind,
}

type Rule = fn(&[&str]) -> Option<PathDescriptor>;

/// Grammar rules in match order; the first hit wins.
const RULES: &[Rule] = &[parse_resolve, parse_api];

impl PathDescriptor {
    /// Parse a relative request path. Total: malformed input yields
    /// [`RequestKind::Unknown`].
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if segments.iter().any(|s| *s == "." || *s == "..") {
            return Self::unknown();
        }

        RULES
            .iter()
            .find_map(|rule| rule(&segments))
            .unwrap_or_else(Self::unknown)
    }

    fn unknown() -> Self {
        Self {
            repo_type: RepoType::default(),
            repo_id: String::new(),
            revision: String::new(),
            relative_path: String::new(),
            request_kind: RequestKind::Unknown,
        }
    }

    pub fn is_resolve(&self) -> bool {
        self.request_kind == RequestKind::Resolve
    }

    /// Last component of `relative_path`
    pub fn filename(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }
}

/// Canonical hub path, always with an explicit repo-type prefix.
impl std::fmt::Display for PathDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.request_kind {
            RequestKind::Resolve => write!(
                f,
                "{}/{}/{}/{}/{}",
                self.repo_type.plural(),
                self.repo_id,
                RESOLVE_MARKER,
                self.revision,
                self.relative_path
            ),
            RequestKind::Api => write!(
                f,
                "{}/{}/{}",
                API_MARKER,
                self.repo_type.plural(),
                self.repo_id
            ),
            RequestKind::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// Parse a relative request path, see [`PathDescriptor::parse`]
pub fn parse(path: &str) -> PathDescriptor {
    PathDescriptor::parse(path)
}

/// `owner/name` or `name`; never a grammar marker.
fn valid_repo_id(segments: &[&str]) -> bool {
    (1..=2).contains(&segments.len())
        && segments
            .iter()
            .all(|s| *s != API_MARKER && *s != RESOLVE_MARKER)
}

fn parse_resolve(segments: &[&str]) -> Option<PathDescriptor> {
    let marker = segments.iter().position(|s| *s == RESOLVE_MARKER)?;
    let (head, tail) = segments.split_at(marker);

    let (repo_type, id_segments) = match head.split_first() {
        Some((first, rest)) if !rest.is_empty() => match RepoType::from_plural(first) {
            Some(repo_type) => (repo_type, rest),
            None => (RepoType::Model, head),
        },
        // A lone prefix names a repo type, not a repo.
        Some((first, _)) if RepoType::from_plural(first).is_some() => return None,
        _ => (RepoType::Model, head),
    };
    if !valid_repo_id(id_segments) {
        return None;
    }

    // tail[0] is the marker itself
    let (revision, file) = tail[1..].split_first()?;
    if file.is_empty() {
        return None;
    }

    Some(PathDescriptor {
        repo_type,
        repo_id: id_segments.join("/"),
        revision: (*revision).to_string(),
        relative_path: file.join("/"),
        request_kind: RequestKind::Resolve,
    })
}

fn parse_api(segments: &[&str]) -> Option<PathDescriptor> {
    let (first, rest) = segments.split_first()?;
    if *first != API_MARKER {
        return None;
    }
    let (plural, rest) = rest.split_first()?;
    let repo_type = RepoType::from_plural(plural)?;

    // Trailing sub-endpoints (`revision/<rev>`, `tree/...`) are not part of the id.
    let id_segments = &rest[..rest.len().min(2)];
    if !valid_repo_id(id_segments) {
        return None;
    }

    Some(PathDescriptor {
        repo_type,
        repo_id: id_segments.join("/"),
        revision: String::new(),
        relative_path: String::new(),
        request_kind: RequestKind::Api,
    })
}
