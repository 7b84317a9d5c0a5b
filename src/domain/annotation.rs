//! Typed annotation storage attached to dependency nodes.
//!
//! The set is open: any `Send + Sync + 'static` type can be attached, keyed by
//! its Rust type, so a node carries at most one annotation of each kind.

use crate::domain::location::MemoryLocation;
use crate::domain::value_path::ValuePath;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

#[derive(Default)]
pub struct Annotations {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `value`, returning the previous annotation of the same kind.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.entries
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|prev| prev.downcast::<T>().ok())
            .map(|prev| *prev)
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotations")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Where the value produced by a node lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAt(pub MemoryLocation);

/// Address of the produced value inside the captured invocation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueAt(pub ValuePath);

/// Free-form text supplied by the recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(pub String);

/// Identifier the recorder used for the event behind a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventName(pub String);
