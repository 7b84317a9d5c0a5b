use crate::domain::edge::EdgeKind;
use crate::domain::value::CapturedValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub trace_path: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub source_count: usize,
    pub location_count: usize,
}

/// A node as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    /// Creation-order sequence index.
    pub index: u32,
    pub event: Option<String>,
    pub is_source: bool,
    pub label: String,
}

/// Nodes are selected by event name, or by sequence index written as `#N`
/// or `N`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesRequest {
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesResponse {
    pub results: Vec<SourcesEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesEntry {
    pub target: NodeRef,
    /// Ascending sequence order.
    pub sources: Vec<NodeRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkOrder {
    #[default]
    Bfs,
    Dfs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkRequest {
    pub node: String,
    #[serde(default)]
    pub order: WalkOrder,
    #[serde(default = "default_true")]
    pub follow_control: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkResponse {
    pub start: NodeRef,
    pub order: WalkOrder,
    pub follow_control: bool,
    /// Nodes in visit order, `start` first.
    pub visited: Vec<NodeRef>,
    pub chain_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowRequest {
    pub node: String,
    /// Inclusive lower sequence bound.
    pub start: u32,
    /// Exclusive upper sequence bound.
    pub end: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowResponse {
    pub nodes: Vec<String>,
    pub edges: Vec<WindowEdge>,
    pub dot: String,
}

/// Resolve either an explicit path, or the value path recorded on a node,
/// against the captured invocation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub path: String,
    pub value_type: String,
    pub value: CapturedValue,
}
