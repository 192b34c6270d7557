//! Key paths into a document, for schema error reporting

use std::fmt;

/// One step from a node to a child
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Keys and indices traversed from the document root
///
/// Rendered as `graphs[0].nodes[2].id`; the root renders as `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath(Vec<PathSegment>);

impl KeyPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Child path through a mapping key
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// Child path through a sequence index
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(KeyPath::root().to_string(), "<root>");
        let path = KeyPath::root().key("graphs").index(0).key("nodes").index(2).key("id");
        assert_eq!(path.to_string(), "graphs[0].nodes[2].id");
        assert_eq!(path.segments().len(), 5);
        assert!(!path.is_root());
    }

    #[test]
    fn test_children_do_not_alias_parent() {
        let parent = KeyPath::root().key("graphs");
        let _child = parent.index(1);
        assert_eq!(parent.segments(), &[PathSegment::Key("graphs".into())]);
    }
}
