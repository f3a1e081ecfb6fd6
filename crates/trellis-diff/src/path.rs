//! Paths into a serialized state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A segment in a [`JsonPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Array index.
    Index(usize),
    /// Object key.
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{}", k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// A path from the root of a state to one of its nested values.
///
/// Serializes as a plain array, e.g. `["todos", 0, "title"]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonPath(Vec<PathSegment>);

impl JsonPath {
    /// The empty path, addressing the whole state.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Parse a path from dot notation (e.g. `"todos.0.title"`).
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::root();
        }
        let segments = path
            .split('.')
            .map(|s| match s.parse::<usize>() {
                Ok(idx) => PathSegment::Index(idx),
                Err(_) => PathSegment::Key(s.to_string()),
            })
            .collect();
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Split into the parent path and the final segment.
    pub fn split_last(&self) -> Option<(JsonPath, &PathSegment)> {
        let (last, init) = self.0.split_last()?;
        Some((JsonPath(init.to_vec()), last))
    }

    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        let s: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", s.join("."))
    }
}
