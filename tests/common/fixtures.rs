//! Test fixture generators for integration tests.
#![allow(dead_code)]

use dynslice::domain::trace::{EventKind, TraceData, TraceEvent, TracedLocation, TracedObject};
use dynslice::domain::value::{CapturedParameter, CapturedValue};
use std::collections::BTreeMap;

pub const SIMPLE_TRACE: &str = "tests/fixtures/simple_trace.json";

pub fn event(id: &str, kind: EventKind, data: &[&str], control: Option<&str>) -> TraceEvent {
    TraceEvent {
        id: id.to_string(),
        kind,
        data: data.iter().map(|d| d.to_string()).collect(),
        control: control.map(str::to_string),
        location: None,
        value_path: None,
        description: None,
    }
}

pub fn source(id: &str) -> TraceEvent {
    event(id, EventKind::Source, &[], None)
}

pub fn composite(id: &str, data: &[&str], control: Option<&str>) -> TraceEvent {
    event(id, EventKind::Composite, data, control)
}

fn at(mut event: TraceEvent, location: TracedLocation) -> TraceEvent {
    event.location = Some(location);
    event
}

fn path(mut event: TraceEvent, text: &str) -> TraceEvent {
    event.value_path = Some(text.parse().expect("fixture path parses"));
    event
}

/// Captured record of `Cart.total(rate)` on a cart holding `[10, 20]`.
pub fn checkout_invocation() -> CapturedValue {
    let mut cart = BTreeMap::new();
    cart.insert(
        "items".to_string(),
        CapturedValue::Array {
            elements: vec![
                CapturedValue::Int { value: 10 },
                CapturedValue::Int { value: 20 },
            ],
        },
    );
    CapturedValue::Invocation {
        method: "total".into(),
        this: Some(Box::new(CapturedValue::Object {
            class: "shop.Cart".into(),
            fields: cart,
        })),
        parameters: vec![CapturedParameter {
            name: "rate".into(),
            value: CapturedValue::Float { value: 0.5 },
        }],
        return_value: Some(Box::new(CapturedValue::Int { value: 15 })),
        exception: None,
    }
}

/// A checkout computation:
///
/// ```text
/// #0 discount  source   @ shop.Config.DISCOUNT
/// #1 item0     source   @ items[0]
/// #2 item1     source   @ items[1]
/// #3 count     source   @ items.length
/// #4 sum       = f(item0, item1)          @ cart.subtotal
/// #5 rate      source
/// #6 total     = g(sum, rate) under discount
/// #7 report    = h(count)
/// ```
pub fn checkout_trace() -> TraceData {
    let items = |index| TracedLocation::ArrayElement {
        array: "items".into(),
        index,
    };
    TraceData {
        classes: vec!["shop.Cart".into(), "shop.Config".into()],
        objects: vec![
            TracedObject {
                id: "cart".into(),
                class: "shop.Cart".into(),
            },
            TracedObject {
                id: "items".into(),
                class: "int[]".into(),
            },
        ],
        events: vec![
            at(
                source("discount"),
                TracedLocation::StaticField {
                    class: "shop.Config".into(),
                    field: "DISCOUNT".into(),
                },
            ),
            path(at(source("item0"), items(0)), "this().items.elementAt(0)"),
            path(at(source("item1"), items(1)), "this().items.elementAt(1)"),
            path(
                at(
                    source("count"),
                    TracedLocation::ArrayLength {
                        array: "items".into(),
                    },
                ),
                "this().items.length()",
            ),
            at(
                composite("sum", &["item0", "item1"], None),
                TracedLocation::InstanceField {
                    object: "cart".into(),
                    field: "subtotal".into(),
                },
            ),
            path(source("rate"), "param(rate)"),
            path(
                composite("total", &["sum", "rate"], Some("discount")),
                "return()",
            ),
            composite("report", &["count"], None),
        ],
        captured: Some(checkout_invocation()),
    }
}
