use crate::domain::annotation::Annotations;
use crate::domain::error::GraphError;
use crate::domain::events::{CreationListener, ListenerRegistry};
use crate::domain::node::{CompositeDeps, DependencyNode, NodeId, NodeKind};
use std::sync::Arc;

/// Dependency graph of one monitored run.
///
/// Nodes live in an append-only arena indexed by their creation order, so a
/// `NodeId` doubles as the node's sequence number. The graph is frozen by
/// convention once recording ends; analyses only take `&DependencyGraph`.
pub struct DependencyGraph {
    nodes: Vec<DependencyNode>,
    listeners: ListenerRegistry,
    sequence_limit: u32,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::with_sequence_limit(u32::MAX)
    }

    /// Graph that refuses to allocate more than `limit` nodes per run.
    pub fn with_sequence_limit(limit: u32) -> Self {
        Self {
            nodes: Vec::new(),
            listeners: ListenerRegistry::new(),
            sequence_limit: limit,
        }
    }

    /// Record a terminal input.
    pub fn create_source(&mut self) -> Result<NodeId, GraphError> {
        self.push(NodeKind::Source)
    }

    /// Record a value computed from `data` under the optional `control`
    /// condition. `data` is copied; later changes to the caller's buffer do
    /// not reach the node.
    ///
    /// Every dependency must have been created earlier in this run.
    pub fn create_composite(
        &mut self,
        data: &[NodeId],
        control: Option<NodeId>,
    ) -> Result<NodeId, GraphError> {
        debug_assert!(
            data.iter()
                .chain(control.iter())
                .all(|dep| dep.index() < self.nodes.len()),
            "dependencies must precede the node that uses them"
        );
        self.push(NodeKind::Composite(CompositeDeps::new(data, control)))
    }

    fn push(&mut self, kind: NodeKind) -> Result<NodeId, GraphError> {
        let next = u32::try_from(self.nodes.len())
            .ok()
            .filter(|&next| next < self.sequence_limit)
            .ok_or(GraphError::SequenceExhausted {
                limit: self.sequence_limit,
            })?;
        let id = NodeId::from_index(next);
        self.nodes.push(DependencyNode::new(id, kind));
        let node = &self.nodes[id.index()];
        tracing::trace!(node = %id, source = node.is_source(), "dependency node created");
        self.listeners.notify(node);
        Ok(id)
    }

    /// Drop every node and restart numbering at zero. Registered listeners
    /// are kept.
    pub fn reset(&mut self) {
        tracing::debug!(nodes = self.nodes.len(), "resetting dependency graph");
        self.nodes.clear();
    }

    pub fn register_listener(&mut self, listener: Arc<dyn CreationListener>) -> bool {
        self.listeners.register(listener)
    }

    pub fn unregister_listener(&mut self, listener: &Arc<dyn CreationListener>) -> bool {
        self.listeners.unregister(listener)
    }

    /// Node lookup. Panics if `id` was not allocated by this run.
    pub fn node(&self, id: NodeId) -> &DependencyNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&DependencyNode> {
        self.nodes.get(id.index())
    }

    /// Checked lookup by raw sequence index.
    pub fn lookup(&self, index: u32) -> Result<NodeId, GraphError> {
        let id = NodeId::from_index(index);
        self.get(id)
            .map(DependencyNode::id)
            .ok_or(GraphError::UnknownNode { node: id })
    }

    pub fn annotations_mut(&mut self, id: NodeId) -> Result<&mut Annotations, GraphError> {
        self.nodes
            .get_mut(id.index())
            .map(DependencyNode::annotations_mut)
            .ok_or(GraphError::UnknownNode { node: id })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependencyNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sequence index the next node will receive.
    pub fn next_index(&self) -> u32 {
        self.nodes.len() as u32
    }

    /// Number of upstream links, control links included.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.dependencies(true).count()).sum()
    }

    pub fn source_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_source()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::annotation::Description;
    use crate::domain::events::RecordingListener;

    #[test]
    fn test_indices_follow_creation_order() {
        let mut graph = DependencyGraph::new();
        let a = graph.create_source().unwrap();
        let b = graph.create_source().unwrap();
        let c = graph.create_composite(&[a, b], None).unwrap();
        assert_eq!(
            [a, b, c].map(NodeId::instance_index),
            [0, 1, 2]
        );
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.source_count(), 2);
    }

    #[test]
    fn test_composite_snapshots_dependencies() {
        let mut graph = DependencyGraph::new();
        let a = graph.create_source().unwrap();
        let b = graph.create_source().unwrap();
        let mut deps = vec![a];
        let c = graph.create_composite(&deps, Some(b)).unwrap();
        deps.push(b);
        assert_eq!(graph.node(c).data_dependencies(), &[a]);
        assert_eq!(graph.node(c).control_dependency(), Some(b));
    }

    #[test]
    fn test_sequence_limit_is_fatal() {
        let mut graph = DependencyGraph::with_sequence_limit(2);
        graph.create_source().unwrap();
        graph.create_source().unwrap();
        assert_eq!(
            graph.create_source(),
            Err(GraphError::SequenceExhausted { limit: 2 })
        );
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_reset_restarts_numbering_and_keeps_listeners() {
        let mut graph = DependencyGraph::new();
        let recorder = Arc::new(RecordingListener::new());
        graph.register_listener(recorder.clone());
        graph.create_source().unwrap();
        graph.reset();
        assert!(graph.is_empty());
        let again = graph.create_source().unwrap();
        assert_eq!(again.instance_index(), 0);
        assert_eq!(recorder.created().len(), 2);
    }

    #[test]
    fn test_listener_sees_every_node() {
        let mut graph = DependencyGraph::new();
        let recorder = Arc::new(RecordingListener::new());
        let listener: Arc<dyn CreationListener> = recorder.clone();
        assert!(graph.register_listener(listener.clone()));
        assert!(!graph.register_listener(listener.clone()));
        let a = graph.create_source().unwrap();
        let b = graph.create_composite(&[a], None).unwrap();
        assert!(graph.unregister_listener(&listener));
        graph.create_source().unwrap();
        assert_eq!(recorder.created(), vec![a, b]);
    }

    #[test]
    fn test_annotations_mutable_after_creation() {
        let mut graph = DependencyGraph::new();
        let a = graph.create_source().unwrap();
        graph
            .annotations_mut(a)
            .unwrap()
            .insert(Description("argv[1]".into()));
        assert_eq!(
            graph.node(a).annotations().get::<Description>(),
            Some(&Description("argv[1]".into()))
        );
        assert!(graph.lookup(7).is_err());
    }
}
