//! Canonical memory-location keys.
//!
//! Objects observed during a run are registered once in an [`ObjectArena`]
//! and referred to by the stable [`ObjectHandle`] it hands out. Location keys
//! are built from handles, never from identity hashes, so two distinct objects
//! can not alias even if the monitored runtime recycles their addresses.
//!
//! [`LocationTable`] deduplicates keys: describing the same location twice in
//! one run yields the same shared instance, so [`MemoryLocation::is_same`]
//! (pointer identity) is a valid "same location" test.

use crate::domain::error::LocationError;
use crate::domain::ports::ClassResolver;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Stable handle of an object tracked during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectHandle(u32);

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object@{}", self.0)
    }
}

/// Append-only table of tracked objects.
#[derive(Debug, Default)]
pub struct ObjectArena {
    classes: Vec<Arc<str>>,
}

impl ObjectArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly observed object of class `class_name`.
    pub fn track(&mut self, class_name: &str) -> ObjectHandle {
        let handle = ObjectHandle(self.classes.len() as u32);
        self.classes.push(Arc::from(class_name));
        handle
    }

    pub fn class_name(&self, handle: ObjectHandle) -> Option<&str> {
        self.classes.get(handle.0 as usize).map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn reset(&mut self) {
        self.classes.clear();
    }
}

/// Opaque handle of a loaded class, produced by a [`ClassResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassHandle(pub u32);

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct InstanceFieldKey {
    pub object: ObjectHandle,
    pub field: Arc<str>,
}

/// Static field, identified by class and field name.
///
/// The class handle is resolved on first request and cached in the key.
#[derive(Debug)]
pub struct StaticFieldKey {
    pub class_name: Arc<str>,
    pub field: Arc<str>,
    class: OnceLock<ClassHandle>,
}

impl StaticFieldKey {
    fn new(class_name: Arc<str>, field: Arc<str>) -> Self {
        Self {
            class_name,
            field,
            class: OnceLock::new(),
        }
    }

    pub fn class(&self, resolver: &dyn ClassResolver) -> Result<ClassHandle, LocationError> {
        if let Some(&class) = self.class.get() {
            return Ok(class);
        }
        let resolved = resolver.resolve_class(&self.class_name).ok_or_else(|| {
            LocationError::UnresolvedClass {
                class_name: self.class_name.to_string(),
                field: self.field.to_string(),
            }
        })?;
        Ok(*self.class.get_or_init(|| resolved))
    }

    pub fn is_resolved(&self) -> bool {
        self.class.get().is_some()
    }
}

impl PartialEq for StaticFieldKey {
    fn eq(&self, other: &Self) -> bool {
        self.class_name == other.class_name && self.field == other.field
    }
}

impl Eq for StaticFieldKey {}

impl Hash for StaticFieldKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class_name.hash(state);
        self.field.hash(state);
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ArrayElementKey {
    pub array: ObjectHandle,
    pub index: u32,
}

/// The length pseudo-field of an array.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ArrayLengthKey {
    pub array: ObjectHandle,
}

/// Canonical location handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemoryLocation {
    InstanceField(Arc<InstanceFieldKey>),
    StaticField(Arc<StaticFieldKey>),
    ArrayElement(Arc<ArrayElementKey>),
    ArrayLength(Arc<ArrayLengthKey>),
}

impl MemoryLocation {
    /// Identity comparison; valid for keys obtained from the same table.
    pub fn is_same(&self, other: &MemoryLocation) -> bool {
        match (self, other) {
            (Self::InstanceField(a), Self::InstanceField(b)) => Arc::ptr_eq(a, b),
            (Self::StaticField(a), Self::StaticField(b)) => Arc::ptr_eq(a, b),
            (Self::ArrayElement(a), Self::ArrayElement(b)) => Arc::ptr_eq(a, b),
            (Self::ArrayLength(a), Self::ArrayLength(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Object owning the location; `None` for static fields.
    pub fn owner(&self) -> Option<ObjectHandle> {
        match self {
            Self::InstanceField(k) => Some(k.object),
            Self::StaticField(_) => None,
            Self::ArrayElement(k) => Some(k.array),
            Self::ArrayLength(k) => Some(k.array),
        }
    }
}

impl fmt::Display for MemoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstanceField(k) => write!(f, "{}.{}", k.object, k.field),
            Self::StaticField(k) => write!(f, "{}.{}", k.class_name, k.field),
            Self::ArrayElement(k) => write!(f, "{}[{}]", k.array, k.index),
            Self::ArrayLength(k) => write!(f, "{}.length", k.array),
        }
    }
}

/// Description of a location prior to canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocationDescriptor {
    InstanceField { object: ObjectHandle, field: String },
    StaticField { class_name: String, field: String },
    ArrayElement { array: ObjectHandle, index: u32 },
    ArrayLength { array: ObjectHandle },
}

/// Deduplicating store of location keys for one run.
///
/// Grows with the number of distinct locations touched and is only emptied by
/// [`LocationTable::reset`].
#[derive(Debug, Default)]
pub struct LocationTable {
    names: HashSet<Arc<str>>,
    instance_fields: HashSet<Arc<InstanceFieldKey>>,
    static_fields: HashSet<Arc<StaticFieldKey>>,
    array_elements: HashSet<Arc<ArrayElementKey>>,
    array_lengths: HashSet<Arc<ArrayLengthKey>>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, descriptor: &LocationDescriptor) -> MemoryLocation {
        match descriptor {
            LocationDescriptor::InstanceField { object, field } => {
                self.instance_field(*object, field)
            }
            LocationDescriptor::StaticField { class_name, field } => {
                self.static_field(class_name, field)
            }
            LocationDescriptor::ArrayElement { array, index } => {
                self.array_element(*array, *index)
            }
            LocationDescriptor::ArrayLength { array } => self.array_length(*array),
        }
    }

    pub fn instance_field(&mut self, object: ObjectHandle, field: &str) -> MemoryLocation {
        let field = self.intern(field);
        let key = canonicalize(&mut self.instance_fields, InstanceFieldKey { object, field });
        MemoryLocation::InstanceField(key)
    }

    pub fn static_field(&mut self, class_name: &str, field: &str) -> MemoryLocation {
        let class_name = self.intern(class_name);
        let field = self.intern(field);
        let key = canonicalize(
            &mut self.static_fields,
            StaticFieldKey::new(class_name, field),
        );
        MemoryLocation::StaticField(key)
    }

    pub fn array_element(&mut self, array: ObjectHandle, index: u32) -> MemoryLocation {
        let key = canonicalize(&mut self.array_elements, ArrayElementKey { array, index });
        MemoryLocation::ArrayElement(key)
    }

    pub fn array_length(&mut self, array: ObjectHandle) -> MemoryLocation {
        let key = canonicalize(&mut self.array_lengths, ArrayLengthKey { array });
        MemoryLocation::ArrayLength(key)
    }

    /// Number of distinct locations handed out.
    pub fn len(&self) -> usize {
        self.instance_fields.len()
            + self.static_fields.len()
            + self.array_elements.len()
            + self.array_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reset(&mut self) {
        tracing::debug!(locations = self.len(), "resetting location table");
        self.names.clear();
        self.instance_fields.clear();
        self.static_fields.clear();
        self.array_elements.clear();
        self.array_lengths.clear();
    }

    fn intern(&mut self, name: &str) -> Arc<str> {
        if let Some(existing) = self.names.get(name) {
            return existing.clone();
        }
        let name: Arc<str> = Arc::from(name);
        self.names.insert(name.clone());
        name
    }
}

fn canonicalize<K: Eq + Hash>(set: &mut HashSet<Arc<K>>, candidate: K) -> Arc<K> {
    if let Some(existing) = set.get(&candidate) {
        return existing.clone();
    }
    let key = Arc::new(candidate);
    set.insert(key.clone());
    key
}
