//! Serialized trace: the contract between a recorder (instrumentation layer)
//! and the slicing engine.
//!
//! Events are listed in the order the recorder created them. An event may
//! only name earlier events as causes, which is what lets replay preserve the
//! creation-order invariant.

use crate::domain::value::CapturedValue;
use crate::domain::value_path::ValuePath;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceData {
    /// Class names the recorder saw loaded; static-field locations must name
    /// one of them.
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub objects: Vec<TracedObject>,
    pub events: Vec<TraceEvent>,
    /// Captured invocation record that event value paths address.
    #[serde(default)]
    pub captured: Option<CapturedValue>,
}

/// An object observed by the recorder, keyed by a trace-local id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracedObject {
    pub id: String,
    pub class: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Source,
    Composite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub id: String,
    pub kind: EventKind,
    /// Ids of earlier events this value was computed from, in order.
    #[serde(default)]
    pub data: Vec<String>,
    /// Id of the earlier event whose outcome guarded this computation.
    #[serde(default)]
    pub control: Option<String>,
    #[serde(default)]
    pub location: Option<TracedLocation>,
    #[serde(default)]
    pub value_path: Option<ValuePath>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Location as written by the recorder; objects are named by trace-local id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TracedLocation {
    InstanceField { object: String, field: String },
    StaticField { class: String, field: String },
    ArrayElement { array: String, index: u32 },
    ArrayLength { array: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_trace_deserializes() {
        let json = r#"{
            "events": [
                {"id": "in", "kind": "source"},
                {"id": "out", "kind": "composite", "data": ["in"],
                 "location": {"kind": "static_field", "class": "app.Main", "field": "result"},
                 "value_path": "return()"}
            ]
        }"#;
        let trace: TraceData = serde_json::from_str(json).unwrap();
        assert_eq!(trace.events.len(), 2);
        assert!(trace.objects.is_empty());
        let out = &trace.events[1];
        assert_eq!(out.kind, EventKind::Composite);
        assert_eq!(out.data, vec!["in".to_string()]);
        assert_eq!(out.control, None);
        assert_eq!(
            out.value_path.as_ref().map(ToString::to_string).as_deref(),
            Some("return()")
        );
    }
}
