//! Normalized storage for one kind of entity.
//!
//! Entities live exactly once in a table keyed by id. The main collection,
//! the secondary groupings and the current selection only hold ids, so
//! patching an entity is visible through all of them at once and removing
//! it clears every index in the same call.
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

pub trait Entity: Clone {
    type Id: Clone + Eq + Hash + Debug;

    fn id(&self) -> &Self::Id;
}

/// Result of [`EntityStore::insert_one`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inserted<T> {
    New,
    Replaced(T),
}

#[derive(Debug, Clone)]
pub struct EntityStore<T: Entity, G = ()> {
    entities: HashMap<T::Id, T>,
    order: Vec<T::Id>,
    listed: HashSet<T::Id>,
    groups: HashMap<G, Vec<T::Id>>,
    memberships: HashMap<T::Id, HashSet<G>>,
    selected: Option<T::Id>,
}

impl<T: Entity, G> Default for EntityStore<T, G> {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            order: Vec::new(),
            listed: HashSet::new(),
            groups: HashMap::new(),
            memberships: HashMap::new(),
            selected: None,
        }
    }
}

impl<T, G> EntityStore<T, G>
where
    T: Entity,
    G: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether `id` is part of the main collection.
    pub fn contains(&self, id: &T::Id) -> bool {
        self.listed.contains(id)
    }

    /// Looks `id` up anywhere in the store: main collection, groupings or selection.
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.entities.get(id)
    }

    /// The main collection, in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    pub fn group(&self, key: &G) -> Option<impl Iterator<Item = &T>> {
        self.groups
            .get(key)
            .map(|ids| ids.iter().filter_map(|id| self.entities.get(id)))
    }

    pub fn has_group(&self, key: &G) -> bool {
        self.groups.contains_key(key)
    }

    pub fn group_keys(&self) -> impl Iterator<Item = &G> {
        self.groups.keys()
    }

    pub fn groups_of(&self, id: &T::Id) -> impl Iterator<Item = &G> {
        self.memberships.get(id).into_iter().flatten()
    }

    pub fn selected(&self) -> Option<&T> {
        self.selected.as_ref().and_then(|id| self.entities.get(id))
    }

    pub fn selected_id(&self) -> Option<&T::Id> {
        self.selected.as_ref()
    }

    /// Replaces the main collection. Repeated ids keep their first position and last value.
    pub fn replace_all(&mut self, entities: impl IntoIterator<Item = T>) {
        let previous = std::mem::take(&mut self.order);
        self.listed.clear();

        for entity in entities {
            let id = entity.id().clone();
            if self.listed.insert(id.clone()) {
                self.order.push(id.clone());
            }
            self.entities.insert(id, entity);
        }

        for id in previous {
            self.release(&id);
        }
    }

    /// Puts `entity` at the front of the main collection.
    pub fn insert_one(&mut self, entity: T) -> Inserted<T> {
        let id = entity.id().clone();
        if self.listed.insert(id.clone()) {
            self.order.insert(0, id.clone());
        } else if let Some(index) = self.order.iter().position(|existing| *existing == id) {
            let moved = self.order.remove(index);
            self.order.insert(0, moved);
        }

        match self.entities.insert(id, entity) {
            Some(old) => Inserted::Replaced(old),
            None => Inserted::New,
        }
    }

    /// Replaces the entity stored under `id`, wherever it is referenced.
    /// Returns the previous value, or `None` (leaving the store untouched) if `id` is unknown.
    pub fn patch_one(&mut self, id: &T::Id, entity: T) -> Option<T> {
        debug_assert_eq!(id, entity.id(), "patched entity must keep its id");
        let slot = self.entities.get_mut(id)?;
        Some(std::mem::replace(slot, entity))
    }

    /// Removes `id` from the main collection, every grouping and the selection.
    pub fn remove_one(&mut self, id: &T::Id) -> Option<T> {
        if self.listed.remove(id) {
            self.order.retain(|existing| existing != id);
        }
        if let Some(keys) = self.memberships.remove(id) {
            for key in keys {
                if let Some(members) = self.groups.get_mut(&key) {
                    members.retain(|existing| existing != id);
                }
            }
        }
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        self.entities.remove(id)
    }

    /// Populates (or repopulates) the grouping under `key`.
    pub fn set_group(&mut self, key: G, entities: impl IntoIterator<Item = T>) {
        let previous = self.groups.remove(&key).unwrap_or_default();
        for id in &previous {
            self.leave_group(id, &key);
        }

        let mut members = Vec::new();
        for entity in entities {
            let id = entity.id().clone();
            if self.memberships.entry(id.clone()).or_default().insert(key.clone()) {
                members.push(id.clone());
            }
            self.entities.insert(id, entity);
        }
        self.groups.insert(key, members);

        for id in previous {
            self.release(&id);
        }
    }

    /// Adds `entity` to the front of an already loaded grouping. Unloaded groupings are left
    /// alone, since a partial grouping would look complete to readers.
    pub fn prepend_to_group(&mut self, key: &G, entity: T) -> bool {
        let Some(members) = self.groups.get_mut(key) else {
            return false;
        };
        let id = entity.id().clone();
        members.retain(|existing| *existing != id);
        members.insert(0, id.clone());
        self.memberships.entry(id.clone()).or_default().insert(key.clone());
        self.entities.insert(id, entity);
        true
    }

    /// Drops the grouping under `key`, along with any entity nothing else refers to.
    pub fn remove_group(&mut self, key: &G) -> Option<Vec<T>> {
        let members = self.groups.remove(key)?;
        let removed = members
            .iter()
            .filter_map(|id| self.entities.get(id).cloned())
            .collect();
        for id in &members {
            self.leave_group(id, key);
            self.release(id);
        }
        Some(removed)
    }

    /// Makes `entity` the current selection, storing it alongside the collection.
    pub fn select(&mut self, entity: T) {
        let id = entity.id().clone();
        self.entities.insert(id.clone(), entity);
        if let Some(previous) = self.selected.replace(id) {
            self.release(&previous);
        }
    }

    pub fn clear_selection(&mut self) -> Option<T::Id> {
        let previous = self.selected.take()?;
        self.release(&previous);
        Some(previous)
    }

    fn leave_group(&mut self, id: &T::Id, key: &G) {
        if let Some(keys) = self.memberships.get_mut(id) {
            keys.remove(key);
            if keys.is_empty() {
                self.memberships.remove(id);
            }
        }
    }

    /// Forgets `id` if no index refers to it anymore.
    fn release(&mut self, id: &T::Id) {
        let referenced = self.listed.contains(id)
            || self.memberships.contains_key(id)
            || self.selected.as_ref() == Some(id);
        if !referenced {
            self.entities.remove(id);
        }
    }
}
