use crate::domain::edge::EdgeKind;
use crate::domain::error::GraphError;
use crate::domain::graph::DependencyGraph;
use crate::domain::node::{DependencyNode, NodeId};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, VecDeque};
use std::ops::Range;

/// View of the dependency graph restricted to a window of sequence indices
/// (`start` inclusive, `end` exclusive). Nodes outside the window are
/// invisible.
pub struct RangeView<'g> {
    graph: &'g DependencyGraph,
    range: Range<u32>,
}

impl<'g> RangeView<'g> {
    pub fn new(graph: &'g DependencyGraph, range: Range<u32>) -> Self {
        Self { graph, range }
    }

    pub fn range(&self) -> Range<u32> {
        self.range.clone()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.range.contains(&node.instance_index())
    }

    /// Causes of `node` that fall inside the window. Asking about a node
    /// outside the window is an error.
    pub fn successors(&self, node: NodeId) -> Result<Vec<(NodeId, EdgeKind)>, GraphError> {
        self.check(node)?;
        Ok(self
            .graph
            .node(node)
            .dependencies(true)
            .filter(|(dep, _)| self.contains(*dep))
            .collect())
    }

    /// Everything reachable from `start` through in-window causes, as a
    /// directed graph whose node weights are produced by `describe` and whose
    /// edges point from a node to its cause.
    pub fn export<F>(&self, start: NodeId, describe: F) -> Result<DiGraph<String, EdgeKind>, GraphError>
    where
        F: Fn(&DependencyNode) -> String,
    {
        self.check(start)?;
        let mut out = DiGraph::new();
        let mut indices: HashMap<NodeId, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::new();

        indices.insert(start, out.add_node(describe(self.graph.node(start))));
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let from = indices[&current];
            for (dep, kind) in self.successors(current)? {
                let to = match indices.get(&dep) {
                    Some(&idx) => idx,
                    None => {
                        let idx = out.add_node(describe(self.graph.node(dep)));
                        indices.insert(dep, idx);
                        queue.push_back(dep);
                        idx
                    }
                };
                out.add_edge(from, to, kind);
            }
        }
        tracing::debug!(
            start = %start,
            nodes = out.node_count(),
            edges = out.edge_count(),
            "exported dependency window"
        );
        Ok(out)
    }

    fn check(&self, node: NodeId) -> Result<(), GraphError> {
        if self.graph.get(node).is_none() {
            return Err(GraphError::UnknownNode { node });
        }
        if !self.contains(node) {
            return Err(GraphError::OutOfRange {
                node,
                start: self.range.start,
                end: self.range.end,
            });
        }
        Ok(())
    }
}
