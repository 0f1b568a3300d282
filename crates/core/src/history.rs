use crate::model::CardId;

/// Bounded ring of the most recently presented cards.
///
/// Backed by a fixed-capacity buffer with a head index; once full, the oldest
/// entry is overwritten. This exists solely so a UI can offer a "previous
/// card" action — it replays what was already shown and has no scheduling
/// authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentCards {
    slots: Vec<CardId>,
    capacity: usize,
    head: usize,
    len: usize,
}

impl RecentCards {
    /// Creates an empty ring holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be > 0");
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            len: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Record a presented card, overwriting the oldest entry when full.
    pub fn push(&mut self, id: CardId) {
        if self.slots.len() < self.capacity {
            self.slots.push(id);
        } else {
            self.slots[self.head] = id;
        }
        self.head = (self.head + 1) % self.capacity;
        self.len = (self.len + 1).min(self.capacity);
    }

    /// The most recently recorded card, if any.
    #[must_use]
    pub fn latest(&self) -> Option<CardId> {
        self.nth_recent(0)
    }

    /// The `n`-th most recent entry (0 = latest).
    #[must_use]
    pub fn nth_recent(&self, n: usize) -> Option<CardId> {
        if n >= self.len {
            return None;
        }
        let idx = (self.head + self.capacity - 1 - n) % self.capacity;
        Some(self.slots[idx])
    }

    /// Iterate entries newest-first.
    pub fn iter_recent(&self) -> impl Iterator<Item = CardId> + '_ {
        (0..self.len).filter_map(|n| self.nth_recent(n))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
