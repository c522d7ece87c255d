//! Cache Store Module
//!
//! The eviction engine: combines the dual index with the recency list and
//! the creation-time index, and applies the size, age and access-count rules
//! on every touch.
//!
//! `CacheStore` itself is not synchronized. [`LimitedCache`] wraps it in a
//! single mutex shared with the background sweeper.
//!
//! [`LimitedCache`]: crate::cache::LimitedCache

use std::time::Instant;

use tracing::debug;

use crate::cache::index::{DualIndex, Upsert};
use crate::cache::list::{SlotId, SlotList};
use crate::cache::{CacheItem, EvictionPolicy, EvictionReason, Lookup};
use crate::error::Result;

// == Cache Store ==
/// Entry storage with recency, age and access-count eviction.
///
/// Every live entry is linked into both `recency` and `ages`, whichever rules
/// are enabled, so rules can be switched at runtime. All removals go through
/// [`CacheStore::evict`], which detaches the slot from both lists before the
/// index frees it.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Entry arena addressed by id and key
    index: DualIndex<V>,
    /// Front = most recently touched
    recency: SlotList,
    /// Front = most recently created
    ages: SlotList,
    /// Enabled eviction rules
    policy: EvictionPolicy,
}

impl<V: CacheItem + Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store applying `policy`.
    ///
    /// # Arguments
    /// * `policy` - Rules checked on every touch and sweep
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            index: DualIndex::new(),
            recency: SlotList::new(),
            ages: SlotList::new(),
            policy,
        }
    }

    // == Policy ==
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Replaces the eviction rules. A smaller size limit takes effect at once.
    pub fn set_policy(&mut self, policy: EvictionPolicy) {
        self.policy = policy;
        self.enforce_size_limit();
    }

    // == Get ==
    /// Retrieves a value by id or key.
    ///
    /// An age-expired entry is evicted and reported as a miss. A hit touches
    /// the entry, which may evict it on the access-count rule after its value
    /// has been read.
    pub fn get(&mut self, lookup: Lookup<'_>) -> Option<V> {
        self.get_at(lookup, Instant::now())
    }

    pub(crate) fn get_at(&mut self, lookup: Lookup<'_>, now: Instant) -> Option<V> {
        let slot = self.index.find(lookup)?;
        if self.reap_if_expired(slot, now) {
            return None;
        }

        let value = self.index.entry(slot)?.value.clone();
        self.touch(slot, now);
        Some(value)
    }

    // == Put ==
    /// Inserts a value, or refreshes the entry already stored under its id.
    ///
    /// A refresh restarts the entry's age clock and access counter.
    ///
    /// # Returns
    /// `Err(CacheError::DuplicateKey)`, leaving the store unchanged, when the
    /// key belongs to another id.
    pub fn put(&mut self, value: V) -> Result<()> {
        self.put_at(value, Instant::now())
    }

    pub(crate) fn put_at(&mut self, value: V, now: Instant) -> Result<()> {
        // expired holders of either identity must not block or absorb the insert
        if let Some(slot) = self.index.find_by_id(value.id()) {
            self.reap_if_expired(slot, now);
        }
        if let Some(slot) = self.index.find_by_key(value.key()) {
            self.reap_if_expired(slot, now);
        }

        let slot = match self.index.insert_or_update(value, now)? {
            Upsert::Inserted(slot) => {
                self.ages.push_front(slot);
                slot
            }
            Upsert::Updated(slot) => {
                if let Some(entry) = self.index.entry_mut(slot) {
                    entry.refresh(now);
                }
                self.ages.move_to_front(slot);
                slot
            }
        };

        self.touch(slot, now);
        Ok(())
    }

    // == Invalidate ==
    /// Removes an entry by id or key. Absent entries are a no-op.
    pub fn invalidate(&mut self, lookup: Lookup<'_>) {
        if let Some(slot) = self.index.find(lookup) {
            self.evict(slot, EvictionReason::Invalidated);
        }
    }

    // == Flush ==
    /// Removes every entry.
    pub fn flush(&mut self) {
        let dropped = self.index.len();
        self.index.clear();
        self.recency.clear();
        self.ages.clear();
        debug!(dropped, "cache flushed");
    }

    // == Count ==
    /// Number of entries tracked, including age-expired entries that have not
    /// been reaped yet.
    pub fn count(&self) -> usize {
        self.index.len()
    }

    /// Number of entries that are not age-expired. Does not evict.
    pub fn valid_count(&self) -> usize {
        self.valid_count_at(Instant::now())
    }

    pub(crate) fn valid_count_at(&self, now: Instant) -> usize {
        if !self.policy.is_age_bounded() {
            return self.index.len();
        }
        self.index
            .iter()
            .filter(|(_, entry)| !self.policy.is_expired(entry, now))
            .count()
    }

    // == Sweep Expired ==
    /// Removes every age-expired entry, oldest first.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub(crate) fn sweep_expired_at(&mut self, now: Instant) -> usize {
        if !self.policy.is_age_bounded() {
            return 0;
        }

        // `ages` is ordered by creation time, so the scan stops at the first
        // entry that is still fresh.
        let mut removed = 0;
        while let Some(slot) = self.ages.back() {
            let expired = self
                .index
                .entry(slot)
                .map_or(true, |entry| self.policy.is_expired(entry, now));
            if !expired {
                break;
            }
            self.evict(slot, EvictionReason::Swept);
            removed += 1;
        }
        removed
    }

    // == Touch ==
    /// Records an access: move to the recency front, count it, then apply the
    /// size and access-count rules.
    fn touch(&mut self, slot: SlotId, now: Instant) {
        self.recency.move_to_front(slot);

        let access_count = match self.index.entry_mut(slot) {
            Some(entry) => entry.record_access(now),
            None => return,
        };

        // the touched slot is the recency head, so the size rule never takes it
        self.enforce_size_limit();

        if self.policy.is_exhausted(access_count) {
            self.evict(slot, EvictionReason::AccessLimit);
        }
    }

    fn enforce_size_limit(&mut self) {
        while self.policy.exceeds_size(self.recency.len()) {
            match self.recency.back() {
                Some(slot) => self.evict(slot, EvictionReason::SizeLimit),
                None => break,
            }
        }
    }

    /// Evicts `slot` if its entry is age-expired. Returns true if it was.
    fn reap_if_expired(&mut self, slot: SlotId, now: Instant) -> bool {
        let expired = self
            .index
            .entry(slot)
            .map_or(false, |entry| self.policy.is_expired(entry, now));
        if expired {
            self.evict(slot, EvictionReason::Expired);
        }
        expired
    }

    // == Evict ==
    /// The single removal path: detach from both lists, then free the slot.
    fn evict(&mut self, slot: SlotId, reason: EvictionReason) {
        self.recency.unlink(slot);
        self.ages.unlink(slot);
        if let Some(entry) = self.index.remove_slot(slot) {
            debug!(
                id = entry.value.id(),
                key = entry.value.key(),
                ?reason,
                "evicted cache entry"
            );
        }
    }

    /// Asserts the structural invariants tying the index to both lists.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let live: Vec<SlotId> = self.index.iter().map(|(slot, _)| slot).collect();
        assert_eq!(live.len(), self.index.len(), "arena and id map disagree");
        assert_eq!(self.recency.len(), live.len(), "recency list out of sync");
        assert_eq!(self.ages.len(), live.len(), "time index out of sync");

        for (slot, entry) in self.index.iter() {
            assert!(self.recency.contains(slot), "slot {} missing from recency", slot);
            assert!(self.ages.contains(slot), "slot {} missing from time index", slot);
            assert_eq!(self.index.find_by_id(entry.value.id()), Some(slot));
            assert_eq!(self.index.find_by_key(entry.value.key()), Some(slot));
        }

        let created: Vec<Instant> = self
            .ages
            .iter()
            .filter_map(|slot| self.index.entry(slot).map(|entry| entry.created_at))
            .collect();
        assert!(
            created.windows(2).all(|pair| pair[0] >= pair[1]),
            "time index not ordered by creation"
        );
    }
}
