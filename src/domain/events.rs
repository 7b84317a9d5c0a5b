//! Node creation events.
//!
//! Listeners live in a registry owned by the graph of a single run and are
//! invoked synchronously, in registration order, on the creating thread.

use crate::domain::node::{DependencyNode, NodeId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

/// Observer of node creation.
pub trait CreationListener: Send + Sync {
    fn node_created(&self, node: &DependencyNode);
}

impl<F> CreationListener for F
where
    F: Fn(&DependencyNode) + Send + Sync,
{
    fn node_created(&self, node: &DependencyNode) {
        self(node)
    }
}

/// Ordered, duplicate-free listener list.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<Arc<dyn CreationListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if this exact listener is already registered.
    pub fn register(&mut self, listener: Arc<dyn CreationListener>) -> bool {
        if self.position(&listener).is_some() {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    pub fn unregister(&mut self, listener: &Arc<dyn CreationListener>) -> bool {
        match self.position(listener) {
            Some(pos) => {
                self.listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn notify(&self, node: &DependencyNode) {
        for listener in &self.listeners {
            listener.node_created(node);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    // Identity is the data pointer; vtable pointers may differ across codegen units.
    fn position(&self, listener: &Arc<dyn CreationListener>) -> Option<usize> {
        let target = Arc::as_ptr(listener) as *const ();
        self.listeners
            .iter()
            .position(|l| Arc::as_ptr(l) as *const () == target)
    }
}

/// Event carried by [`ChannelListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeCreated {
    pub node: NodeId,
    pub is_source: bool,
}

/// Forwards creation events into a bounded queue.
///
/// Creation never blocks on a slow consumer: once the queue is full, further
/// events are dropped and counted.
pub struct ChannelListener {
    sender: SyncSender<NodeCreated>,
    dropped: AtomicU64,
}

impl ChannelListener {
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl CreationListener for ChannelListener {
    fn node_created(&self, node: &DependencyNode) {
        let event = NodeCreated {
            node: node.id(),
            is_source: node.is_source(),
        };
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(node = %event.node, dropped, "creation event queue full");
            }
            Err(TrySendError::Disconnected(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::debug!(
                    node = %event.node,
                    dropped,
                    "creation event receiver is gone"
                );
            }
        }
    }
}

/// Bounded creation-event channel.
pub fn creation_channel(bound: usize) -> (Arc<ChannelListener>, Receiver<NodeCreated>) {
    let (sender, receiver) = mpsc::sync_channel(bound);
    let listener = Arc::new(ChannelListener {
        sender,
        dropped: AtomicU64::new(0),
    });
    (listener, receiver)
}

/// Collects created node ids in creation order.
#[derive(Debug, Default)]
pub struct RecordingListener {
    created: Mutex<Vec<NodeId>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<NodeId> {
        self.created.lock().clone()
    }
}

impl CreationListener for RecordingListener {
    fn node_created(&self, node: &DependencyNode) {
        self.created.lock().push(node.id());
    }
}
