use crate::domain::annotation::{Description, EventName, StoredAt, ValueAt};
use crate::domain::location::{LocationDescriptor, MemoryLocation, ObjectHandle};
use crate::domain::node::NodeId;
use crate::domain::ports::ClassResolver;
use crate::domain::run::{ReplayedRun, RunContext};
use crate::domain::trace::{EventKind, TraceData, TraceEvent, TracedLocation};
use anyhow::{Context as _, Result, anyhow, bail};
use std::collections::HashMap;

/// Replays a recorded trace into a run context - Domain Service
pub struct TraceReplayer {
    classes: Box<dyn ClassResolver>,
}

impl TraceReplayer {
    pub fn new(classes: Box<dyn ClassResolver>) -> Self {
        Self { classes }
    }

    pub fn replay(&self, trace: TraceData) -> Result<ReplayedRun> {
        self.replay_into(trace, RunContext::new())
    }

    /// Three-pass replay into an existing (typically fresh) context, so that
    /// callers can pre-register listeners or set a sequence limit.
    pub fn replay_into(&self, trace: TraceData, mut context: RunContext) -> Result<ReplayedRun> {
        // Pass 1: object handles
        let mut objects: HashMap<&str, ObjectHandle> = HashMap::with_capacity(trace.objects.len());
        for object in &trace.objects {
            let handle = context.objects.track(&object.class);
            if objects.insert(object.id.as_str(), handle).is_some() {
                bail!("duplicate object id `{}` in trace", object.id);
            }
        }
        tracing::debug!(objects = objects.len(), "replay pass 1: objects tracked");

        // Pass 2: dependency nodes in recording order
        let mut event_to_node: HashMap<String, NodeId> = HashMap::with_capacity(trace.events.len());
        let mut replayed: Vec<(&TraceEvent, NodeId)> = Vec::with_capacity(trace.events.len());
        for event in &trace.events {
            let node = self.create_node(&mut context, &event_to_node, event)?;
            if event_to_node.insert(event.id.clone(), node).is_some() {
                bail!("duplicate event id `{}` (node {node})", event.id);
            }
            replayed.push((event, node));
        }
        tracing::debug!(nodes = context.graph.len(), "replay pass 2: nodes created");

        // Pass 3: annotations
        for (event, node) in replayed {
            let stored_at = match &event.location {
                Some(location) => Some(
                    self.canonical_location(&mut context, &objects, location)
                        .with_context(|| format!("event `{}` (node {node})", event.id))?,
                ),
                None => None,
            };
            let annotations = context.graph.annotations_mut(node)?;
            annotations.insert(EventName(event.id.clone()));
            if let Some(location) = stored_at {
                annotations.insert(StoredAt(location));
            }
            if let Some(path) = &event.value_path {
                if let Some(root) = &trace.captured
                    && let Err(err) = path.resolve(root)
                {
                    tracing::warn!(node = %node, error = %err, "value path does not resolve against captured record");
                }
                annotations.insert(ValueAt(path.clone()));
            }
            if let Some(text) = &event.description {
                annotations.insert(Description(text.clone()));
            }
        }
        tracing::debug!(locations = context.locations.len(), "replay pass 3: annotations attached");

        Ok(ReplayedRun {
            context,
            event_to_node,
            captured: trace.captured,
        })
    }

    fn create_node(
        &self,
        context: &mut RunContext,
        known: &HashMap<String, NodeId>,
        event: &TraceEvent,
    ) -> Result<NodeId> {
        let next = context.graph.next_index();
        let lookup = |dep: &str| {
            known.get(dep).copied().ok_or_else(|| {
                anyhow!(
                    "event `{}` (node #{next}) depends on `{dep}`, which is not an earlier event",
                    event.id
                )
            })
        };
        let node = match event.kind {
            EventKind::Source => {
                if !event.data.is_empty() || event.control.is_some() {
                    bail!("source event `{}` (node #{next}) lists dependencies", event.id);
                }
                context.graph.create_source()?
            }
            EventKind::Composite => {
                let data = event
                    .data
                    .iter()
                    .map(|dep| lookup(dep.as_str()))
                    .collect::<Result<Vec<_>>>()?;
                let control = event.control.as_deref().map(lookup).transpose()?;
                context.graph.create_composite(&data, control)?
            }
        };
        Ok(node)
    }

    fn canonical_location(
        &self,
        context: &mut RunContext,
        objects: &HashMap<&str, ObjectHandle>,
        location: &TracedLocation,
    ) -> Result<MemoryLocation> {
        let object = |id: &str| {
            objects
                .get(id)
                .copied()
                .ok_or_else(|| anyhow!("unknown object `{id}`"))
        };
        let descriptor = match location {
            TracedLocation::InstanceField { object: id, field } => LocationDescriptor::InstanceField {
                object: object(id)?,
                field: field.clone(),
            },
            TracedLocation::StaticField { class, field } => LocationDescriptor::StaticField {
                class_name: class.clone(),
                field: field.clone(),
            },
            TracedLocation::ArrayElement { array, index } => LocationDescriptor::ArrayElement {
                array: object(array)?,
                index: *index,
            },
            TracedLocation::ArrayLength { array } => LocationDescriptor::ArrayLength {
                array: object(array)?,
            },
        };
        let location = context.locations.get(&descriptor);
        if let MemoryLocation::StaticField(key) = &location {
            key.class(self.classes.as_ref())?;
        }
        Ok(location)
    }
}
