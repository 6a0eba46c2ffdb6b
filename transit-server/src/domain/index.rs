//! Deduplicating entity collections.

use std::collections::HashMap;

use super::entities::Identified;

/// An ordered set of entities, unique by id.
///
/// Inserting an entity whose id is already known is a no-op: the first
/// occurrence wins. Insertion order is preserved.
#[derive(Debug, Clone)]
pub struct EntitySet<T> {
    items: Vec<T>,
    positions: HashMap<String, usize>,
}

impl<T> Default for EntitySet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T: Identified> EntitySet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity. Returns `false` if its id was already present.
    pub fn insert(&mut self, item: T) -> bool {
        if self.positions.contains_key(item.id()) {
            return false;
        }
        self.positions.insert(item.id().to_string(), self.items.len());
        self.items.push(item);
        true
    }

    /// Merge a batch, keeping existing entries on id collision.
    /// Returns how many entities were new.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) -> usize {
        items
            .into_iter()
            .map(|item| self.insert(item))
            .filter(|inserted| *inserted)
            .count()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.positions.get(id).map(|&idx| &self.items[idx])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.positions.get(id).map(|&idx| &mut self.items[idx])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Identified> FromIterator<T> for EntitySet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// Build a borrowed id → entity lookup table.
pub fn index_by_id<T: Identified>(items: &[T]) -> HashMap<&str, &T> {
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        index.entry(item.id()).or_insert(item);
    }
    index
}
