use crate::domain::annotation::Annotations;
use crate::domain::edge::EdgeKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a dependency node: its position in the run's creation order.
///
/// Indices are strictly increasing within a run, so a node can only ever
/// reference nodes with a smaller index. That ordering is what keeps the
/// graph acyclic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Creation-order sequence number of this node.
    pub fn instance_index(self) -> u32 {
        self.0
    }

    /// Arena slot of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Upstream causes of a composite node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeDeps {
    data: Box<[NodeId]>,
    control: Option<NodeId>,
}

impl CompositeDeps {
    pub(crate) fn new(data: &[NodeId], control: Option<NodeId>) -> Self {
        Self {
            data: data.into(),
            control,
        }
    }

    /// Data causes in recording order. The first entry is not interchangeable
    /// with the others for display purposes.
    pub fn data(&self) -> &[NodeId] {
        &self.data
    }

    /// Condition that guarded the computation, if it was conditional.
    pub fn control(&self) -> Option<NodeId> {
        self.control
    }
}

/// Node variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Terminal input with no upstream causes.
    Source,
    /// Value computed from earlier nodes, optionally under a control condition.
    Composite(CompositeDeps),
}

/// One dynamically observed cause-effect event.
#[derive(Debug)]
pub struct DependencyNode {
    id: NodeId,
    kind: NodeKind,
    annotations: Annotations,
}

impl DependencyNode {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            annotations: Annotations::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn instance_index(&self) -> u32 {
        self.id.instance_index()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_source(&self) -> bool {
        matches!(self.kind, NodeKind::Source)
    }

    /// Data causes; empty for source nodes.
    pub fn data_dependencies(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Source => &[],
            NodeKind::Composite(deps) => deps.data(),
        }
    }

    pub fn control_dependency(&self) -> Option<NodeId> {
        match &self.kind {
            NodeKind::Source => None,
            NodeKind::Composite(deps) => deps.control(),
        }
    }

    /// Upstream links in traversal order: data causes first, then the control
    /// cause when `follow_control` is set.
    pub fn dependencies(&self, follow_control: bool) -> impl Iterator<Item = (NodeId, EdgeKind)> + '_ {
        let control = if follow_control {
            self.control_dependency()
        } else {
            None
        };
        self.data_dependencies()
            .iter()
            .map(|&dep| (dep, EdgeKind::Data))
            .chain(control.map(|dep| (dep, EdgeKind::Control)))
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }
}
