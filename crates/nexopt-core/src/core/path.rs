use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PathError {
    #[error("Empty path")]
    Empty,

    #[error("Empty segment in path '{0}'")]
    EmptySegment(String),

    #[error("Path not found: '{0}'")]
    NotFound(String),

    #[error("Wildcard path '{0}' matched no leaves")]
    NoMatches(String),

    #[error("Expected a scalar leaf at '{0}', found a branch")]
    NotALeaf(String),

    #[error("Path '{0}' contains a wildcard where a concrete path is required")]
    UnexpectedWildcard(String),
}

/// One segment of a dotted path: a concrete key, or `*` meaning "every
/// sibling in this collection".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Key(String),
    Wildcard,
}

impl Segment {
    pub fn key(name: &str) -> Self {
        Segment::Key(name.to_string())
    }
}

/// A parsed dotted path such as `wings.main_wing.areas.reference` or
/// `wings.*.areas.wetted`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreePath {
    segments: Vec<Segment>,
}

impl TreePath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = Vec::new();
        for part in raw.split('.') {
            match part {
                "" => return Err(PathError::EmptySegment(raw.to_string())),
                "*" => segments.push(Segment::Wildcard),
                key => segments.push(Segment::Key(key.to_string())),
            }
        }
        Ok(TreePath { segments })
    }

    pub fn from_segments(segments: Vec<Segment>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(TreePath { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&Segment::Wildcard)
    }

    /// Splits off the leading segment, returning it and the remainder (if any).
    /// A `TreePath` always has at least one segment.
    pub fn split_first(&self) -> (&Segment, Option<TreePath>) {
        let first = &self.segments[0];
        let rest = &self.segments[1..];
        let rest = if rest.is_empty() {
            None
        } else {
            Some(TreePath {
                segments: rest.to_vec(),
            })
        };
        (first, rest)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Key(key) => f.write_str(key)?,
                Segment::Wildcard => f.write_str("*")?,
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for TreePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TreePath::parse(s)
    }
}
