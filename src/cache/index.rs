//! Dual Index Module
//!
//! Owns every cache entry in a slot arena and maps both the numeric id and
//! the string key of each value to its slot.

use std::collections::HashMap;
use std::time::Instant;

use crate::cache::list::SlotId;
use crate::cache::{CacheEntry, CacheItem, ItemId, Lookup};
use crate::error::{CacheError, Result};

/// Outcome of [`DualIndex::insert_or_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A fresh entry was created in this slot
    Inserted(SlotId),
    /// The value of the entry in this slot was replaced
    Updated(SlotId),
}

impl Upsert {
    pub fn slot(self) -> SlotId {
        match self {
            Upsert::Inserted(slot) | Upsert::Updated(slot) => slot,
        }
    }
}

// == Dual Index ==
/// Entry arena addressed by id and by key.
///
/// Both maps always hold the same set of slots, and each id has exactly one
/// key (and vice versa) for as long as its entry lives here.
#[derive(Debug)]
pub struct DualIndex<V> {
    slots: Vec<Option<CacheEntry<V>>>,
    free: Vec<SlotId>,
    by_id: HashMap<ItemId, SlotId>,
    by_key: HashMap<String, SlotId>,
}

impl<V> Default for DualIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> DualIndex<V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            by_id: HashMap::new(),
            by_key: HashMap::new(),
        }
    }

    // == Find ==
    pub fn find_by_id(&self, id: ItemId) -> Option<SlotId> {
        self.by_id.get(&id).copied()
    }

    pub fn find_by_key(&self, key: &str) -> Option<SlotId> {
        self.by_key.get(key).copied()
    }

    /// Resolves a lookup to its slot without side effects.
    pub fn find(&self, lookup: Lookup<'_>) -> Option<SlotId> {
        match lookup {
            Lookup::Id(id) => self.find_by_id(id),
            Lookup::Key(key) => self.find_by_key(key),
        }
    }

    // == Entry Access ==
    pub fn entry(&self, slot: SlotId) -> Option<&CacheEntry<V>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn entry_mut(&mut self, slot: SlotId) -> Option<&mut CacheEntry<V>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    // == Count ==
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    // == Clear ==
    /// Drops every entry and releases the arena.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.by_id.clear();
        self.by_key.clear();
    }

    // == Iter ==
    /// Iterates all live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &CacheEntry<V>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.as_ref().map(|entry| (slot, entry)))
    }

    fn alloc(&mut self, entry: CacheEntry<V>) -> SlotId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        }
    }
}

impl<V: CacheItem> DualIndex<V> {
    // == Insert Or Update ==
    /// Stores `value`, treating the id as the primary identity.
    ///
    /// - Unknown id and unknown key: a new entry is created.
    /// - Known id: the stored value is replaced in place. If the value now
    ///   carries a different key, the entry is re-keyed.
    /// - Key held by a different id: `DuplicateKey`, nothing changes.
    pub fn insert_or_update(&mut self, value: V, now: Instant) -> Result<Upsert> {
        let id = value.id();
        let key = value.key().to_owned();

        let existing = self.find_by_id(id);
        if let Some(holder) = self.find_by_key(&key) {
            if existing != Some(holder) {
                return Err(CacheError::DuplicateKey {
                    existing_id: self.entry(holder).map_or(id, |entry| entry.value.id()),
                    key,
                    id,
                });
            }
        }

        if let Some(slot) = existing {
            if let Some(entry) = self.slots.get_mut(slot).and_then(Option::as_mut) {
                if entry.value.key() != key {
                    self.by_key.remove(entry.value.key());
                    self.by_key.insert(key, slot);
                }
                entry.value = value;
                return Ok(Upsert::Updated(slot));
            }
            // id mapped to a freed slot: drop the mapping and insert afresh
            self.by_id.remove(&id);
        }

        let slot = self.alloc(CacheEntry::new(value, now));
        self.by_id.insert(id, slot);
        self.by_key.insert(key, slot);
        Ok(Upsert::Inserted(slot))
    }

    // == Remove ==
    /// Removes the entry in `slot` from both maps and frees the slot.
    pub fn remove_slot(&mut self, slot: SlotId) -> Option<CacheEntry<V>> {
        let entry = self.slots.get_mut(slot)?.take()?;
        self.by_id.remove(&entry.value.id());
        self.by_key.remove(entry.value.key());
        self.free.push(slot);
        Some(entry)
    }

    /// Removes the entry addressed by `lookup`; absent entries are a no-op.
    pub fn remove(&mut self, lookup: Lookup<'_>) -> Option<(SlotId, CacheEntry<V>)> {
        let slot = self.find(lookup)?;
        self.remove_slot(slot).map(|entry| (slot, entry))
    }
}
