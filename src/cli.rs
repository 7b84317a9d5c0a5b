use crate::app::dto::{
    ResolveRequest, SourcesRequest, WalkOrder, WalkRequest, WindowRequest,
};
use crate::app::engine::SliceEngine;
use anyhow::Result;
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Node, edge and location counts of the loaded trace.
pub fn display_summary(engine: &SliceEngine, json: bool) -> Result<()> {
    let health = engine.health();
    if json {
        return print_json(&health);
    }
    println!("Trace: {}", health.trace_path);
    println!("  Nodes: {}", health.node_count);
    println!("  Sources: {}", health.source_count);
    println!("  Edges: {}", health.edge_count);
    println!("  Locations: {}", health.location_count);
    Ok(())
}

pub fn display_sources(engine: &SliceEngine, nodes: &[String], json: bool) -> Result<()> {
    let res = engine.sources(SourcesRequest {
        nodes: nodes.to_vec(),
    })?;
    if json {
        return print_json(&res);
    }
    for entry in &res.results {
        println!("Sources of {}:", entry.target.label);
        if entry.sources.is_empty() {
            println!("  (none)");
        }
        for source in &entry.sources {
            println!("  {}", source.label);
        }
    }
    Ok(())
}

pub fn display_walk(
    engine: &SliceEngine,
    node: &str,
    order: WalkOrder,
    follow_control: bool,
    json: bool,
) -> Result<()> {
    let res = engine.walk(WalkRequest {
        node: node.to_string(),
        order,
        follow_control,
    })?;
    if json {
        return print_json(&res);
    }
    let order = match res.order {
        WalkOrder::Bfs => "breadth-first",
        WalkOrder::Dfs => "depth-first",
    };
    let control = if res.follow_control {
        ""
    } else {
        ", data only"
    };
    println!("Backward slice of {} ({order}{control}):", res.start.label);
    println!("{}", "=".repeat(60));
    for (i, node) in res.visited.iter().enumerate() {
        println!("{:4}. {}", i + 1, node.label);
    }
    println!("{}", "=".repeat(60));
    println!("  Visited: {}", res.visited.len());
    println!("  Longest chain: {}", res.chain_depth);
    Ok(())
}

/// Print the window as DOT, or as JSON with node and edge lists.
pub fn display_window(
    engine: &SliceEngine,
    node: &str,
    start: u32,
    end: u32,
    json: bool,
) -> Result<()> {
    let res = engine.window(WindowRequest {
        node: node.to_string(),
        start,
        end,
    })?;
    if json {
        return print_json(&res);
    }
    print!("{}", res.dot);
    Ok(())
}

pub fn display_resolved(
    engine: &SliceEngine,
    node: Option<String>,
    path: Option<String>,
    json: bool,
) -> Result<()> {
    let res = engine.resolve(ResolveRequest { node, path })?;
    if json {
        return print_json(&res);
    }
    println!("{} : {}", res.path, res.value_type);
    println!("{}", serde_json::to_string_pretty(&res.value)?);
    Ok(())
}
