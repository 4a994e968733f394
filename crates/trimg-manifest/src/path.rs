//! Paths for addressing nodes within a manifest
//!
//! Provides [`ImagePath`], an ordered list of [`PathSegment`]s used identically
//! for read and write addressing.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One step of a path: a mapping key or a sequence index
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// Mapping key
    Key(String),
    /// Zero-based sequence index
    Index(usize),
}

impl PathSegment {
    /// Key segment
    #[inline]
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    /// Index segment
    #[inline]
    #[must_use]
    pub fn index(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Path within a manifest tree
///
/// # Examples
/// - `[Key("spec"), Key("template"), Key("spec")]` → `spec.template.spec`
/// - `[Key("containers"), Index(1), Key("image")]` → `containers[1].image`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ImagePath(Vec<PathSegment>);

impl ImagePath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Empty path (document root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path made only of mapping keys
    #[must_use]
    pub fn from_keys(keys: &[&str]) -> Self {
        Self(keys.iter().map(|k| PathSegment::key(*k)).collect())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Prefix of the first `len` segments
    #[inline]
    #[must_use]
    pub fn truncated(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &PathSegment> {
        self.0.iter()
    }
}

impl Display for ImagePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for ImagePath {
    type Err = PathError;

    /// Parses `a.b[0].c` notation; the empty string is the root.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for part in s.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };

            if key.is_empty() && (rest.is_empty() || !segments.is_empty()) {
                return Err(PathError::EmptySegment);
            }
            if !key.is_empty() {
                segments.push(PathSegment::key(key));
            }

            while !rest.is_empty() {
                let close = rest
                    .find(']')
                    .ok_or_else(|| PathError::InvalidIndex(rest.to_string()))?;
                let index = rest[1..close]
                    .parse::<usize>()
                    .map_err(|_| PathError::InvalidIndex(rest[..=close].to_string()))?;
                segments.push(PathSegment::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(PathError::InvalidIndex(rest.to_string()));
                }
            }
        }

        Ok(Self(segments))
    }
}

impl From<Vec<PathSegment>> for ImagePath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl<'a> IntoIterator for &'a ImagePath {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Errors parsing path notation
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Malformed `[n]` index
    #[error("invalid index: {0}")]
    InvalidIndex(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_from_keys() {
        let path = ImagePath::from_keys(&["spec", "template", "spec"]);
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string(), "spec.template.spec");
    }

    #[test]
    fn path_root() {
        let path = ImagePath::root();
        assert!(path.is_empty());
        assert!(path.parent().is_none());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn path_child_with_index() {
        let path = ImagePath::from_keys(&["spec"])
            .child("containers")
            .child(1)
            .child("image");
        assert_eq!(path.to_string(), "spec.containers[1].image");
        assert_eq!(path.last(), Some(&PathSegment::key("image")));
    }

    #[test]
    fn path_parent() {
        let path: ImagePath = "a.b[2]".parse().unwrap();
        assert_eq!(path.parent().unwrap().to_string(), "a.b");
    }

    #[test]
    fn path_truncated() {
        let path: ImagePath = "a.b.c".parse().unwrap();
        assert_eq!(path.truncated(2).to_string(), "a.b");
        assert_eq!(path.truncated(10), path);
    }

    #[test]
    fn path_from_str_indices() {
        let path: ImagePath = "spec.containers[0].image".parse().unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::key("spec"),
                PathSegment::key("containers"),
                PathSegment::Index(0),
                PathSegment::key("image"),
            ]
        );
    }

    #[test]
    fn path_from_str_nested_indices() {
        let path: ImagePath = "matrix[1][2]".parse().unwrap();
        assert_eq!(
            path.segments(),
            &[PathSegment::key("matrix"), PathSegment::Index(1), PathSegment::Index(2)]
        );
    }

    #[test]
    fn path_from_str_leading_index() {
        let path: ImagePath = "[3].name".parse().unwrap();
        assert_eq!(path.segments(), &[PathSegment::Index(3), PathSegment::key("name")]);
        assert_eq!(path.to_string(), "[3].name");
    }

    #[test]
    fn path_from_str_empty() {
        let path: ImagePath = "".parse().unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn path_from_str_empty_segment() {
        let result: Result<ImagePath, _> = "a..b".parse();
        assert!(matches!(result, Err(PathError::EmptySegment)));
    }

    #[test]
    fn path_from_str_bad_index() {
        assert!(matches!("a[x]".parse::<ImagePath>(), Err(PathError::InvalidIndex(_))));
        assert!(matches!("a[1".parse::<ImagePath>(), Err(PathError::InvalidIndex(_))));
        assert!(matches!("a[1]b".parse::<ImagePath>(), Err(PathError::InvalidIndex(_))));
    }
}
