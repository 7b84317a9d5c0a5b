use crate::domain::location::ClassHandle;
use crate::domain::ports::ClassResolver;
use std::collections::HashMap;

/// Class resolver over the class names a recorder declared as loaded.
#[derive(Debug, Default)]
pub struct ClassTable {
    classes: HashMap<String, ClassHandle>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut table = Self::new();
        for name in names {
            table.declare(name.as_ref());
        }
        table
    }

    /// Declare a class, returning its handle. Declaring twice is harmless.
    pub fn declare(&mut self, name: &str) -> ClassHandle {
        let next = ClassHandle(self.classes.len() as u32);
        *self.classes.entry(name.to_string()).or_insert(next)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassResolver for ClassTable {
    fn resolve_class(&self, class_name: &str) -> Option<ClassHandle> {
        self.classes.get(class_name).copied()
    }
}
