use std::collections::BTreeMap;

use super::{ClassModel, MethodModel};

/// Immutable set of decoded classes for one pass, keyed by dotted class name.
///
/// Built once after every decode task has finished; later stages only borrow it.
#[derive(Debug, Default)]
pub struct ClassArena {
    classes: BTreeMap<String, ClassModel>,
}

impl ClassArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a class. Returns `false` (and keeps the first model) on duplicates.
    pub fn insert(&mut self, class: ClassModel) -> bool {
        if self.classes.contains_key(&class.name) {
            return false;
        }
        self.classes.insert(class.name.clone(), class);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ClassModel> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassModel> {
        self.classes.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodModel> {
        self.classes.values().flat_map(|c| c.methods.iter())
    }
}

impl FromIterator<ClassModel> for ClassArena {
    fn from_iter<I: IntoIterator<Item = ClassModel>>(iter: I) -> Self {
        let mut arena = ClassArena::new();
        for class in iter {
            arena.insert(class);
        }
        arena
    }
}
