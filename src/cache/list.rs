//! Slot List Module
//!
//! An ordered list of arena slots, used both for recency tracking (size
//! eviction) and for the creation-time index (age sweeps).
//!
//! Links live in a vector indexed by slot, so a slot index doubles as the
//! entry's position handle: relocating or detaching an entry is O(1) and the
//! list never holds references into the entries themselves.

/// Index of an entry in the dual-index arena.
pub type SlotId = usize;

/// Null link.
const NIL: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: usize,
    next: usize,
    linked: bool,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            prev: NIL,
            next: NIL,
            linked: false,
        }
    }
}

// == Slot List ==
/// Doubly linked list over slot indices.
///
/// - Front = most recently pushed
/// - Back = oldest, the eviction candidate
#[derive(Debug)]
pub struct SlotList {
    links: Vec<Link>,
    head: usize,
    tail: usize,
    len: usize,
}

impl Default for SlotList {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotList {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            links: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    // == Push Front ==
    /// Links a detached slot at the front.
    pub fn push_front(&mut self, slot: SlotId) {
        if slot >= self.links.len() {
            self.links.resize(slot + 1, Link::default());
        }
        debug_assert!(!self.links[slot].linked, "slot {} linked twice", slot);

        self.links[slot] = Link {
            prev: NIL,
            next: self.head,
            linked: true,
        };
        if self.head != NIL {
            self.links[self.head].prev = slot;
        } else {
            self.tail = slot;
        }
        self.head = slot;
        self.len += 1;
    }

    // == Move To Front ==
    /// Moves a slot to the front, linking it first if it is not a member.
    pub fn move_to_front(&mut self, slot: SlotId) {
        if self.head == slot {
            return;
        }
        self.unlink(slot);
        self.push_front(slot);
    }

    // == Unlink ==
    /// Detaches a slot. Returns false if the slot was not a member.
    pub fn unlink(&mut self, slot: SlotId) -> bool {
        let link = match self.links.get(slot) {
            Some(link) if link.linked => *link,
            _ => return false,
        };

        if link.prev != NIL {
            self.links[link.prev].next = link.next;
        } else {
            self.head = link.next;
        }
        if link.next != NIL {
            self.links[link.next].prev = link.prev;
        } else {
            self.tail = link.prev;
        }

        self.links[slot] = Link::default();
        self.len -= 1;
        true
    }

    // == Back ==
    /// Returns the oldest slot.
    pub fn back(&self) -> Option<SlotId> {
        (self.tail != NIL).then_some(self.tail)
    }

    // == Contains ==
    /// Checks if a slot is linked into this list.
    pub fn contains(&self, slot: SlotId) -> bool {
        self.links.get(slot).map_or(false, |link| link.linked)
    }

    // == Length ==
    /// Returns the number of linked slots.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Clear ==
    /// Detaches every slot.
    pub fn clear(&mut self) {
        self.links.clear();
        self.head = NIL;
        self.tail = NIL;
        self.len = 0;
    }

    // == Iter ==
    /// Iterates slots from front to back.
    pub fn iter(&self) -> impl Iterator<Item = SlotId> + '_ {
        let mut current = self.head;
        std::iter::from_fn(move || {
            if current == NIL {
                return None;
            }
            let slot = current;
            current = self.links[slot].next;
            Some(slot)
        })
    }
}
