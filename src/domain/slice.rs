use crate::domain::graph::DependencyGraph;
use crate::domain::node::{DependencyNode, NodeId, NodeKind};
use crate::domain::traversal::{
    BreadthFirstWalk, DepthFirstVisitor, DepthFirstWalk, Expansion, TraversalConfig,
};
use rayon::prelude::*;
use std::collections::{BTreeSet, VecDeque};

/// Terminal causes of `start`: every source node reachable upstream,
/// control causes included regardless of any traversal setting. A `start`
/// outside this graph, e.g. one issued before a reset, has no sources.
pub fn extract_sources(graph: &DependencyGraph, start: NodeId) -> BTreeSet<NodeId> {
    let mut sources = BTreeSet::new();
    if graph.get(start).is_none() {
        return sources;
    }
    let mut visited = vec![false; graph.len()];
    let mut queue = VecDeque::new();
    visited[start.index()] = true;
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        match graph.node(current).kind() {
            NodeKind::Source => {
                sources.insert(current);
            }
            NodeKind::Composite(deps) => {
                // an absent control cause is simply skipped
                for &dep in deps.data().iter().chain(deps.control().iter()) {
                    if !visited[dep.index()] {
                        visited[dep.index()] = true;
                        queue.push_back(dep);
                    }
                }
            }
        }
    }
    sources
}

/// [`extract_sources`] for several targets at once, in parallel. Results are
/// returned in the order of `starts`.
pub fn extract_sources_many(graph: &DependencyGraph, starts: &[NodeId]) -> Vec<BTreeSet<NodeId>> {
    starts
        .par_iter()
        .map(|&start| extract_sources(graph, start))
        .collect()
}

/// Every node `start` transitively depends on, `start` included. Empty when
/// `start` is not part of this graph.
pub fn backward_slice(
    graph: &DependencyGraph,
    start: NodeId,
    config: TraversalConfig,
) -> BTreeSet<NodeId> {
    let mut slice = BTreeSet::new();
    BreadthFirstWalk::with_config(graph, config).run(Some(start), &mut |node: &DependencyNode| {
        slice.insert(node.id());
        Expansion::Expand
    });
    slice
}

/// Computes, bottom-up, the longest chain of causes below each node.
struct ChainDepth {
    config: TraversalConfig,
    depth: Vec<usize>,
}

impl DepthFirstVisitor for ChainDepth {
    fn pre_visit(&mut self, _node: &DependencyNode) -> Expansion {
        Expansion::Expand
    }

    fn post_visit(&mut self, node: &DependencyNode) {
        let deepest_child = node
            .dependencies(self.config.follow_control_dependencies)
            .map(|(dep, _)| self.depth[dep.index()])
            .max();
        self.depth[node.id().index()] = deepest_child.map_or(0, |d| d + 1);
    }
}

/// Number of links on the longest upstream path from `start`; zero for a
/// node without causes or one outside this graph.
pub fn chain_depth(graph: &DependencyGraph, start: NodeId, config: TraversalConfig) -> usize {
    let mut visitor = ChainDepth {
        config,
        depth: vec![0; graph.len()],
    };
    DepthFirstWalk::with_config(graph, config).run(Some(start), &mut visitor);
    visitor.depth.get(start.index()).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_include_control_cause() {
        let mut graph = DependencyGraph::new();
        let s1 = graph.create_source().unwrap();
        let s2 = graph.create_source().unwrap();
        let s3 = graph.create_source().unwrap();
        let c = graph.create_composite(&[s1, s2], Some(s3)).unwrap();
        assert_eq!(extract_sources(&graph, c), BTreeSet::from([s1, s2, s3]));
    }

    #[test]
    fn test_sources_of_leaf_nodes() {
        let mut graph = DependencyGraph::new();
        let s = graph.create_source().unwrap();
        let empty = graph.create_composite(&[], None).unwrap();
        assert_eq!(extract_sources(&graph, s), BTreeSet::from([s]));
        assert!(extract_sources(&graph, empty).is_empty());
    }

    #[test]
    fn test_sources_many_matches_single() {
        let mut graph = DependencyGraph::new();
        let a = graph.create_source().unwrap();
        let b = graph.create_source().unwrap();
        let x = graph.create_composite(&[a], None).unwrap();
        let y = graph.create_composite(&[x, b], Some(a)).unwrap();
        let many = extract_sources_many(&graph, &[y, x, b]);
        assert_eq!(
            many,
            vec![
                extract_sources(&graph, y),
                extract_sources(&graph, x),
                extract_sources(&graph, b)
            ]
        );
    }

    #[test]
    fn test_ids_from_before_reset_find_nothing() {
        let mut graph = DependencyGraph::new();
        let _a = graph.create_source().unwrap();
        let b = graph.create_source().unwrap();
        graph.reset();
        let s = graph.create_source().unwrap();

        assert!(extract_sources(&graph, b).is_empty());
        assert_eq!(
            extract_sources_many(&graph, &[s, b]),
            vec![BTreeSet::from([s]), BTreeSet::new()]
        );
        assert!(backward_slice(&graph, b, TraversalConfig::default()).is_empty());
        assert_eq!(chain_depth(&graph, b, TraversalConfig::default()), 0);
    }

    #[test]
    fn test_backward_slice_and_chain_depth() {
        let mut graph = DependencyGraph::new();
        let guard = graph.create_source().unwrap();
        let input = graph.create_source().unwrap();
        let x = graph.create_composite(&[input], None).unwrap();
        let y = graph.create_composite(&[x], None).unwrap();
        let z = graph.create_composite(&[input], Some(y)).unwrap();
        let unrelated = graph.create_source().unwrap();

        let full = backward_slice(&graph, z, TraversalConfig::default());
        assert_eq!(full, BTreeSet::from([input, x, y, z]));
        assert!(!full.contains(&guard) && !full.contains(&unrelated));

        let thin = backward_slice(&graph, z, TraversalConfig::data_only());
        assert_eq!(thin, BTreeSet::from([input, z]));

        assert_eq!(chain_depth(&graph, z, TraversalConfig::default()), 3);
        assert_eq!(chain_depth(&graph, z, TraversalConfig::data_only()), 1);
        assert_eq!(chain_depth(&graph, input, TraversalConfig::default()), 0);
    }
}
