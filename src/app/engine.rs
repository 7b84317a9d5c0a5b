use crate::adapters::classes::table::ClassTable;
use crate::adapters::export::dot::render_dot;
use crate::adapters::fs::reader::JsonTraceSource;
use crate::app::dto::*;
use crate::domain::annotation::ValueAt;
use crate::domain::builder::TraceReplayer;
use crate::domain::node::{DependencyNode, NodeId};
use crate::domain::ports::TraceSource;
use crate::domain::run::ReplayedRun;
use crate::domain::slice::{chain_depth, extract_sources_many};
use crate::domain::traversal::{
    BreadthFirstWalk, DepthFirstVisitor, DepthFirstWalk, Expansion, TraversalConfig,
};
use crate::domain::value_path::ValuePath;
use crate::domain::window::RangeView;
use anyhow::{Context as _, Result, anyhow, bail};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Query engine over one replayed trace. Cheap to clone; clones share the
/// loaded run, and `reload` swaps it for every clone at once.
#[derive(Clone)]
pub struct SliceEngine {
    inner: Arc<RwLock<EngineData>>,
}

struct EngineData {
    trace_path: PathBuf,
    run: Arc<ReplayedRun>,
}

impl SliceEngine {
    /// Construct an engine from an already-replayed run.
    ///
    /// Used for testing or when the run was recorded in-process.
    pub fn from_replayed(trace_path: PathBuf, run: ReplayedRun) -> Self {
        Self {
            inner: Arc::new(RwLock::new(EngineData {
                trace_path,
                run: Arc::new(run),
            })),
        }
    }

    pub fn load_from_json(trace_path: &Path) -> Result<Self> {
        let run = replay_file(trace_path)?;
        Ok(Self::from_replayed(trace_path.to_path_buf(), run))
    }

    pub fn reload(&self) -> Result<HealthResponse> {
        let path = self.inner.read().trace_path.clone();
        let run = replay_file(&path)?;
        self.inner.write().run = Arc::new(run);
        tracing::info!(path = %path.display(), "trace reloaded");
        Ok(self.health())
    }

    pub fn health(&self) -> HealthResponse {
        let data = self.inner.read();
        let graph = data.run.graph();
        HealthResponse {
            trace_path: data.trace_path.to_string_lossy().to_string(),
            node_count: graph.len(),
            edge_count: graph.edge_count(),
            source_count: graph.source_count(),
            location_count: data.run.context.locations.len(),
        }
    }

    /// Snapshot of the currently loaded run.
    pub fn run(&self) -> Arc<ReplayedRun> {
        self.inner.read().run.clone()
    }

    pub fn sources(&self, req: SourcesRequest) -> Result<SourcesResponse> {
        let run = self.run();
        let targets = req
            .nodes
            .iter()
            .map(|selector| select_node(&run, selector))
            .collect::<Result<Vec<_>>>()?;
        let results = extract_sources_many(run.graph(), &targets)
            .into_iter()
            .zip(&targets)
            .map(|(sources, &target)| SourcesEntry {
                target: node_ref(&run, target),
                sources: sources.into_iter().map(|s| node_ref(&run, s)).collect(),
            })
            .collect();
        Ok(SourcesResponse { results })
    }

    pub fn walk(&self, req: WalkRequest) -> Result<WalkResponse> {
        let run = self.run();
        let start = select_node(&run, &req.node)?;
        let config = TraversalConfig {
            follow_control_dependencies: req.follow_control,
        };
        let mut order = VisitOrder::default();
        match req.order {
            WalkOrder::Bfs => {
                BreadthFirstWalk::with_config(run.graph(), config).run(
                    Some(start),
                    &mut |node: &DependencyNode| {
                        order.0.push(node.id());
                        Expansion::Expand
                    },
                );
            }
            WalkOrder::Dfs => {
                DepthFirstWalk::with_config(run.graph(), config).run(Some(start), &mut order);
            }
        }
        Ok(WalkResponse {
            start: node_ref(&run, start),
            order: req.order,
            follow_control: req.follow_control,
            visited: order.0.iter().map(|&id| node_ref(&run, id)).collect(),
            chain_depth: chain_depth(run.graph(), start, config),
        })
    }

    pub fn window(&self, req: WindowRequest) -> Result<WindowResponse> {
        if req.start >= req.end {
            bail!("empty window [{}, {})", req.start, req.end);
        }
        let run = self.run();
        let start = select_node(&run, &req.node)?;
        let view = RangeView::new(run.graph(), req.start..req.end);
        let exported = view.export(start, |node| run.describe(node.id()))?;

        let edges = exported
            .edge_indices()
            .filter_map(|edge| {
                let (from, to) = exported.edge_endpoints(edge)?;
                Some(WindowEdge {
                    from: exported[from].clone(),
                    to: exported[to].clone(),
                    kind: exported[edge],
                })
            })
            .collect();
        Ok(WindowResponse {
            nodes: exported.node_weights().cloned().collect(),
            edges,
            dot: render_dot(&exported),
        })
    }

    pub fn resolve(&self, req: ResolveRequest) -> Result<ResolveResponse> {
        let run = self.run();
        let path: ValuePath = match (&req.path, &req.node) {
            (Some(text), _) => text.parse()?,
            (None, Some(selector)) => {
                let node = select_node(&run, selector)?;
                run.graph()
                    .node(node)
                    .annotations()
                    .get::<ValueAt>()
                    .map(|at| at.0.clone())
                    .ok_or_else(|| anyhow!("node {node} has no recorded value path"))?
            }
            (None, None) => bail!("either `path` or `node` is required"),
        };
        let root = run
            .captured
            .as_ref()
            .ok_or_else(|| anyhow!("trace has no captured invocation record"))?;
        let value = path.resolve(root)?.into_owned();
        Ok(ResolveResponse {
            path: path.to_string(),
            value_type: value.type_label().to_string(),
            value,
        })
    }
}

fn replay_file(path: &Path) -> Result<ReplayedRun> {
    let trace = JsonTraceSource::new(path).load()?;
    let classes = ClassTable::from_names(&trace.classes);
    TraceReplayer::new(Box::new(classes))
        .replay(trace)
        .with_context(|| format!("Failed to replay trace: {}", path.display()))
}

/// Event name first, then `#N` / `N` as a sequence index.
fn select_node(run: &ReplayedRun, selector: &str) -> Result<NodeId> {
    if let Some(node) = run.node_by_event(selector) {
        return Ok(node);
    }
    let digits = selector.strip_prefix('#').unwrap_or(selector);
    let index: u32 = digits
        .parse()
        .map_err(|_| anyhow!("unknown node `{selector}`: not an event name or sequence index"))?;
    Ok(run.graph().lookup(index)?)
}

fn node_ref(run: &ReplayedRun, node: NodeId) -> NodeRef {
    NodeRef {
        index: node.instance_index(),
        event: run.event_name(node).map(str::to_string),
        is_source: run.graph().node(node).is_source(),
        label: run.describe(node),
    }
}

#[derive(Default)]
struct VisitOrder(Vec<NodeId>);

impl DepthFirstVisitor for VisitOrder {
    fn pre_visit(&mut self, node: &DependencyNode) -> Expansion {
        self.0.push(node.id());
        Expansion::Expand
    }
}
