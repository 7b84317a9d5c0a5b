use crate::domain::annotation::{Description, EventName, StoredAt, ValueAt};
use crate::domain::error::GraphError;
use crate::domain::graph::DependencyGraph;
use crate::domain::location::{LocationTable, ObjectArena};
use crate::domain::node::{NodeId, NodeKind};
use crate::domain::value::CapturedValue;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// All mutable state of one monitored run: the dependency graph, the object
/// arena and the location table. Start every run from a fresh or reset
/// context so numbering and canonical keys never leak between runs.
#[derive(Default)]
pub struct RunContext {
    pub graph: DependencyGraph,
    pub objects: ObjectArena,
    pub locations: LocationTable,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_graph(graph: DependencyGraph) -> Self {
        Self {
            graph,
            ..Self::default()
        }
    }

    pub fn reset(&mut self) {
        self.graph.reset();
        self.objects.reset();
        self.locations.reset();
    }
}

/// Serialized creation path for recorders running on several threads.
///
/// Every creation takes the same lock, so sequence numbers, listener
/// callbacks and canonical keys follow a single timeline.
#[derive(Clone, Default)]
pub struct SharedRun {
    inner: Arc<Mutex<RunContext>>,
}

impl SharedRun {
    pub fn new(context: RunContext) -> Self {
        Self {
            inner: Arc::new(Mutex::new(context)),
        }
    }

    /// Run `f` with exclusive access to the context.
    pub fn with<R>(&self, f: impl FnOnce(&mut RunContext) -> R) -> R {
        f(&mut *self.inner.lock())
    }

    pub fn create_source(&self) -> Result<NodeId, GraphError> {
        self.with(|ctx| ctx.graph.create_source())
    }

    pub fn create_composite(
        &self,
        data: &[NodeId],
        control: Option<NodeId>,
    ) -> Result<NodeId, GraphError> {
        self.with(|ctx| ctx.graph.create_composite(data, control))
    }

    /// Recover the context once recording is over. Fails (returning `self`)
    /// while other handles are still alive.
    pub fn into_inner(self) -> Result<RunContext, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

/// A recorded run reconstructed from a trace, ready for analysis.
pub struct ReplayedRun {
    pub context: RunContext,
    pub event_to_node: HashMap<String, NodeId>,
    /// Captured invocation record that value paths are resolved against.
    pub captured: Option<CapturedValue>,
}

impl ReplayedRun {
    pub fn node_by_event(&self, event: &str) -> Option<NodeId> {
        self.event_to_node.get(event).copied()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.context.graph
    }

    pub fn event_name(&self, node: NodeId) -> Option<&str> {
        self.graph()
            .get(node)?
            .annotations()
            .get::<EventName>()
            .map(|name| name.0.as_str())
    }

    /// One-line label: index, event, kind, then location, value path and
    /// description when recorded.
    pub fn describe(&self, node: NodeId) -> String {
        let Some(n) = self.graph().get(node) else {
            return format!("{node} <unknown>");
        };
        let mut label = format!("{node}");
        if let Some(name) = n.annotations().get::<EventName>() {
            label.push(' ');
            label.push_str(&name.0);
        }
        label.push_str(match n.kind() {
            NodeKind::Source => " [source]",
            NodeKind::Composite(_) => "",
        });
        if let Some(StoredAt(location)) = n.annotations().get::<StoredAt>() {
            label.push_str(&format!(" @ {location}"));
        }
        if let Some(ValueAt(path)) = n.annotations().get::<ValueAt>() {
            label.push_str(&format!(" = {path}"));
        }
        if let Some(Description(text)) = n.annotations().get::<Description>() {
            label.push_str(&format!(" ({text})"));
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_shared_run_serializes_creation() {
        let shared = SharedRun::default();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let mut last = shared.create_source().unwrap();
                    for _ in 0..50 {
                        last = shared.create_composite(&[last], None).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let ctx = shared.into_inner().ok().unwrap();
        assert_eq!(ctx.graph.len(), 4 * 51);
        for node in ctx.graph.iter() {
            for (dep, _) in node.dependencies(true) {
                assert!(dep < node.id());
            }
        }
    }

    #[test]
    fn test_into_inner_fails_while_shared() {
        let shared = SharedRun::default();
        let other = shared.clone();
        let shared = shared.into_inner().err().unwrap();
        drop(other);
        assert!(shared.into_inner().is_ok());
    }

    #[test]
    fn test_reset_clears_every_table() {
        let mut ctx = RunContext::new();
        let obj = ctx.objects.track("List");
        ctx.locations.array_length(obj);
        ctx.graph.create_source().unwrap();
        ctx.reset();
        assert!(ctx.graph.is_empty());
        assert!(ctx.objects.is_empty());
        assert!(ctx.locations.is_empty());
    }
}
