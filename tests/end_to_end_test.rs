//! End-to-end tests: write a trace to disk, load it through the engine,
//! query it, then change the file and reload.

mod common;

use common::fixtures::{SIMPLE_TRACE, checkout_trace};
use dynslice::adapters::fs::reader::JsonTraceSource;
use dynslice::app::dto::{ResolveRequest, SourcesRequest, WalkOrder, WalkRequest};
use dynslice::app::engine::SliceEngine;
use dynslice::domain::ports::TraceSource;
use std::path::Path;

fn write_trace(dir: &Path, trace: &dynslice::domain::trace::TraceData) -> std::path::PathBuf {
    let path = dir.join("trace.json");
    std::fs::write(&path, serde_json::to_string_pretty(trace).unwrap()).unwrap();
    path
}

#[test]
fn test_checkout_trace_round_trips_through_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), &checkout_trace());
    let engine = SliceEngine::load_from_json(&path).unwrap();

    let health = engine.health();
    assert_eq!(health.node_count, 8);
    assert_eq!(health.source_count, 5);
    assert_eq!(health.location_count, 5);

    let res = engine
        .sources(SourcesRequest {
            nodes: vec!["total".into(), "report".into()],
        })
        .unwrap();
    let events = |i: usize| -> Vec<String> {
        res.results[i]
            .sources
            .iter()
            .filter_map(|s| s.event.clone())
            .collect()
    };
    assert_eq!(events(0), vec!["discount", "item0", "item1", "rate"]);
    assert_eq!(events(1), vec!["count"]);

    let walk = engine
        .walk(WalkRequest {
            node: "total".into(),
            order: WalkOrder::Dfs,
            follow_control: true,
        })
        .unwrap();
    assert_eq!(walk.visited.len(), 6);
    assert_eq!(walk.chain_depth, 2);

    let resolved = engine
        .resolve(ResolveRequest {
            node: None,
            path: Some("this().items.length()".into()),
        })
        .unwrap();
    assert_eq!(resolved.value_type, "int");
}

#[test]
fn test_reload_picks_up_new_trace() {
    let dir = tempfile::tempdir().unwrap();
    let mut trace = checkout_trace();
    let path = write_trace(dir.path(), &trace);
    let engine = SliceEngine::load_from_json(&path).unwrap();
    let clone = engine.clone();

    trace.events.truncate(4);
    write_trace(dir.path(), &trace);
    let health = engine.reload().unwrap();
    assert_eq!(health.node_count, 4);
    assert_eq!(clone.health().node_count, 4);
}

#[test]
fn test_reload_failure_keeps_previous_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), &checkout_trace());
    let engine = SliceEngine::load_from_json(&path).unwrap();

    std::fs::write(&path, "{ not json").unwrap();
    let err = engine.reload().unwrap_err();
    assert!(format!("{err:#}").contains("trace.json"));
    assert_eq!(engine.health().node_count, 8);
}

#[test]
fn test_fixture_file_loads() {
    let trace = JsonTraceSource::new(SIMPLE_TRACE).load().unwrap();
    assert_eq!(trace.events.len(), 5);
    let engine = SliceEngine::load_from_json(Path::new(SIMPLE_TRACE)).unwrap();
    assert_eq!(engine.health().edge_count, 4);
}
