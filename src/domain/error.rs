//! Typed errors for the dependency-graph core.
//!
//! Every message that concerns a node names its sequence index (`#N`), the
//! only identifier that stays stable across a run.

use crate::domain::node::NodeId;

/// Dependency graph and range view errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("sequence counter exhausted: cannot allocate more than {limit} nodes in one run")]
    SequenceExhausted { limit: u32 },

    #[error("node {node} is not part of this run")]
    UnknownNode { node: NodeId },

    #[error("node {node} lies outside the view range [{start}, {end})")]
    OutOfRange { node: NodeId, start: u32, end: u32 },
}

/// Memory-location canonicalization errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("cannot resolve class `{class_name}` for static field `{field}`")]
    UnresolvedClass { class_name: String, field: String },
}

/// Value-path parsing and resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("cannot resolve `{member}` at position {position} of path `{path}`")]
    Unresolved {
        path: String,
        member: String,
        position: usize,
    },

    #[error("the empty path has no parent")]
    NoParent,

    #[error("malformed path component `{component}`")]
    Malformed { component: String },
}
