use crate::domain::edge::EdgeKind;
use petgraph::dot::Dot;
use petgraph::graph::DiGraph;

/// Render an exported dependency window as Graphviz DOT. Node labels are the
/// graph's node weights; edges are labelled `data` or `control`.
pub fn render_dot(window: &DiGraph<String, EdgeKind>) -> String {
    format!("{}", Dot::new(window))
}
