//! Schema layer: resolved tree to typed workflow model
//!
//! - `model`: WorkflowDef, GraphDef, NodeDef, EdgeDef
//! - `binder`: structural binding with key-path errors
//! - `validate`: cross-reference checks after binding
//! - `path`: key paths used in schema errors

pub mod binder;
pub mod model;
pub mod path;
pub mod validate;

pub use binder::bind;
pub use model::{EdgeDef, GraphDef, NodeDef, Parameters, WorkflowDef};
pub use path::{KeyPath, PathSegment};
pub use validate::check_invariants;
