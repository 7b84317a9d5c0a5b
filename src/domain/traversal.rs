//! Backward walks over the dependency DAG.
//!
//! Both kernels visit a node at most once, however many nodes share it as a
//! cause. Neither recurses on the call stack: dependency chains from long
//! executions can be arbitrarily deep.

use crate::domain::graph::DependencyGraph;
use crate::domain::node::{DependencyNode, NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Whether a walk should continue into a node's causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    Expand,
    Stop,
}

impl From<bool> for Expansion {
    fn from(expand: bool) -> Self {
        if expand {
            Expansion::Expand
        } else {
            Expansion::Stop
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalConfig {
    /// Include a composite node's control cause among its children.
    pub follow_control_dependencies: bool,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            follow_control_dependencies: true,
        }
    }
}

impl TraversalConfig {
    pub fn data_only() -> Self {
        Self {
            follow_control_dependencies: false,
        }
    }
}

/// Callback of the breadth-first walk.
pub trait NodeVisitor {
    fn visit(&mut self, node: &DependencyNode) -> Expansion;
}

impl<F> NodeVisitor for F
where
    F: FnMut(&DependencyNode) -> Expansion,
{
    fn visit(&mut self, node: &DependencyNode) -> Expansion {
        self(node)
    }
}

/// Callbacks of the depth-first walk.
pub trait DepthFirstVisitor {
    /// Called once when a node is first reached.
    fn pre_visit(&mut self, node: &DependencyNode) -> Expansion;

    /// Called after every child of an expanded node has been handled.
    fn post_visit(&mut self, _node: &DependencyNode) {}
}

/// FIFO work-queue walk.
pub struct BreadthFirstWalk<'g> {
    graph: &'g DependencyGraph,
    config: TraversalConfig,
}

impl<'g> BreadthFirstWalk<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self::with_config(graph, TraversalConfig::default())
    }

    pub fn with_config(graph: &'g DependencyGraph, config: TraversalConfig) -> Self {
        Self { graph, config }
    }

    /// Walk from `start`; a `None` start, or one this graph never allocated,
    /// visits nothing. Returns the number of visited nodes.
    pub fn run(&self, start: Option<NodeId>, visitor: &mut impl NodeVisitor) -> usize {
        let Some(start) = start.filter(|&id| self.graph.get(id).is_some()) else {
            return 0;
        };
        let mut visited = vec![false; self.graph.len()];
        let mut queue = VecDeque::new();
        visited[start.index()] = true;
        queue.push_back(start);

        let mut count = 0;
        while let Some(current) = queue.pop_front() {
            let node = self.graph.node(current);
            count += 1;
            if visitor.visit(node) == Expansion::Stop {
                continue;
            }
            let NodeKind::Composite(deps) = node.kind() else {
                continue;
            };
            let control = deps
                .control()
                .filter(|_| self.config.follow_control_dependencies);
            for &dep in deps.data().iter().chain(control.iter()) {
                if !visited[dep.index()] {
                    visited[dep.index()] = true;
                    queue.push_back(dep);
                }
            }
        }
        tracing::debug!(start = %start, visited = count, "breadth-first walk finished");
        count
    }
}

struct Frame {
    node: NodeId,
    children: Vec<NodeId>,
    cursor: usize,
}

impl Frame {
    fn new(node: &DependencyNode, follow_control: bool) -> Self {
        Self {
            node: node.id(),
            children: node.dependencies(follow_control).map(|(id, _)| id).collect(),
            cursor: 0,
        }
    }

    fn next_child(&mut self) -> Option<NodeId> {
        let child = self.children.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(child)
    }
}

/// Iterative depth-first walk with pre- and post-order hooks.
///
/// A node's `post_visit` runs only after all of its children were either
/// completed or found already visited, so visitors can aggregate over a
/// subtree bottom-up.
pub struct DepthFirstWalk<'g> {
    graph: &'g DependencyGraph,
    config: TraversalConfig,
}

impl<'g> DepthFirstWalk<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self::with_config(graph, TraversalConfig::default())
    }

    pub fn with_config(graph: &'g DependencyGraph, config: TraversalConfig) -> Self {
        Self { graph, config }
    }

    /// Walk from `start`; a `None` start, or one this graph never allocated,
    /// visits nothing. Returns the number of nodes passed to `pre_visit`.
    pub fn run(&self, start: Option<NodeId>, visitor: &mut impl DepthFirstVisitor) -> usize {
        let Some(start) = start.filter(|&id| self.graph.get(id).is_some()) else {
            return 0;
        };
        let follow_control = self.config.follow_control_dependencies;
        let mut visited = vec![false; self.graph.len()];
        let mut stack: Vec<Frame> = Vec::new();
        let mut count = 1;

        visited[start.index()] = true;
        let root = self.graph.node(start);
        if visitor.pre_visit(root) == Expansion::Expand {
            stack.push(Frame::new(root, follow_control));
        }

        while let Some(frame) = stack.last_mut() {
            match frame.next_child() {
                Some(child) => {
                    if visited[child.index()] {
                        continue;
                    }
                    visited[child.index()] = true;
                    count += 1;
                    let node = self.graph.node(child);
                    if visitor.pre_visit(node) == Expansion::Expand {
                        stack.push(Frame::new(node, follow_control));
                    }
                }
                None => {
                    let done = frame.node;
                    stack.pop();
                    visitor.post_visit(self.graph.node(done));
                }
            }
        }
        tracing::debug!(start = %start, visited = count, "depth-first walk finished");
        count
    }
}
