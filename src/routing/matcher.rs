//! Route matching logic.
//!
//! # Responsibilities
//! - Match host header (exact match, case-insensitive)
//! - Match path patterns (`*` one segment, `**` any number of segments)
//! - Combine conditions with AND / OR semantics
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - Path matching is case-sensitive
//! - Empty condition = always matches (wildcard)
//! - No regex; patterns are pre-split into segments at startup

use axum::body::Body;
use axum::http::Request;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// Matches the Host header.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        let host = req
            .headers()
            .get("host")
            .and_then(|h| h.to_str().ok())
            .or_else(|| req.uri().host());

        host.map(|h| {
            let h = h.to_lowercase();
            // Ignore a port on the Host header.
            let bare = h.rsplit_once(':').map(|(name, _)| name).unwrap_or(&h);
            h == self.expected_host || bare == self.expected_host
        })
        .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*` or `{name}`
    Single,
    /// `**`
    Multi,
}

/// Matches the request path against an Ant-style pattern.
#[derive(Debug, Clone)]
pub struct PathPatternMatcher {
    pattern: String,
    segments: Vec<Segment>,
}

impl PathPatternMatcher {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "**" => Segment::Multi,
                "*" => Segment::Single,
                s if s.starts_with('{') && s.ends_with('}') => Segment::Single,
                s => Segment::Literal(s.to_string()),
            })
            .collect();
        Self { pattern, segments }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Match a raw path.
    pub fn matches_path(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::Multi, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((Segment::Single, rest)) => {
            !path.is_empty() && match_segments(rest, &path[1..])
        }
        Some((Segment::Literal(lit), rest)) => {
            path.first().is_some_and(|p| p == lit) && match_segments(rest, &path[1..])
        }
    }
}

impl Matcher for PathPatternMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.matches_path(req.uri().path())
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}

/// Combines multiple matchers with OR semantics. Empty matches everything.
#[derive(Debug)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.matchers.is_empty() || self.matchers.iter().any(|m| m.matches(req))
    }
}
