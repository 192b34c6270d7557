//! Include layer: `!include` resolution across sources
//!
//! - `loader`: where source text comes from
//! - `path`: lexical identity of included files
//! - `resolver`: recursive splicing with cycle and depth checks

pub mod loader;
pub mod path;
pub mod resolver;

pub use loader::{CachingLoader, FsLoader, LoadError, Loader, MemoryLoader};
pub use path::{normalize, resolve_include_path};
pub use resolver::{resolve, ResolvedNode};
