//! Generic document tree (before include resolution and binding)

/// A scalar value as written in the source
///
/// No type inference happens: `42` and `"42"` are both strings, only the
/// `quoted` flag tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scalar {
    pub value: String,
    pub quoted: bool,
}

impl Scalar {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: false,
        }
    }

    pub fn quoted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: true,
        }
    }

    /// An empty unquoted scalar, written as `key:` with nothing after it
    pub fn is_blank(&self) -> bool {
        !self.quoted && self.value.is_empty()
    }
}

/// Parsed document node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentNode {
    /// Ordered `key: value` entries, keys unique
    Mapping(Vec<(String, DocumentNode)>),
    Sequence(Vec<DocumentNode>),
    Scalar(Scalar),
    /// Unresolved `!include` path
    Include(String),
}

impl DocumentNode {
    /// Empty document / empty value
    pub fn blank() -> Self {
        DocumentNode::Scalar(Scalar::default())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DocumentNode::Mapping(_) => "mapping",
            DocumentNode::Sequence(_) => "sequence",
            DocumentNode::Scalar(scalar) if scalar.is_blank() => "empty value",
            DocumentNode::Scalar(_) => "scalar",
            DocumentNode::Include(_) => "include",
        }
    }

    /// Look up a key when this node is a mapping
    pub fn get(&self, key: &str) -> Option<&DocumentNode> {
        match self {
            DocumentNode::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            DocumentNode::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn contains_include(&self) -> bool {
        match self {
            DocumentNode::Include(_) => true,
            DocumentNode::Mapping(entries) => entries.iter().any(|(_, v)| v.contains_include()),
            DocumentNode::Sequence(items) => items.iter().any(DocumentNode::contains_include),
            DocumentNode::Scalar(_) => false,
        }
    }
}
