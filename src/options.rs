//! Parse limits
//!
//! Provides configurable limits for:
//! - Include nesting depth
//! - Block nesting depth, across included files

/// Default maximum number of files on one include chain
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// Default maximum number of nested blocks from the document root
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Limits applied to one parse call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum number of files on one include chain, root included
    pub max_include_depth: usize,

    /// Maximum number of nested blocks, counted through spliced includes
    pub max_nesting_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Create options suitable for untrusted input (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_include_depth: 8,
            max_nesting_depth: 16,
        }
    }

    /// Create options without an include depth limit; cycles are still
    /// rejected and nesting stays bounded
    pub fn unlimited() -> Self {
        Self {
            max_include_depth: usize::MAX,
            max_nesting_depth: 256,
        }
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}
