// Copyright 2026 Meridian Health Labs. All rights reserved.
// Outbreak Response Simulation Suite - Lag Buffers

use serde::{Deserialize, Serialize};

/// Maximum tracked transition delay, in days. Every cohort buffer in the
/// simulation uses this capacity; a cohort that survives this long in a
/// stage recovers when its slot is evicted.
pub const MAX_LAG_DAYS: usize = 14;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LagError {
    #[error("lag buffer capacity must be positive, got {0}")]
    InvalidCapacity(usize),
}

// ---------------------------------------------------------------------------
// LagBuffer
// ---------------------------------------------------------------------------

/// Cyclic fixed-capacity buffer of daily cohort counts.
///
/// The head slot is "today's" bucket (`front`). `push` advances the head by
/// one (mod capacity) and seeds the new front with the pushed value,
/// returning whatever occupied the overwritten slot — the entry from
/// `capacity` pushes ago. Eviction is how the simulation detects that a
/// cohort has fully aged out of a stage.
///
/// Offset indexing: `get(0)` is the front; negative offsets reach back in
/// push order (`get(-2)` is the value pushed two days ago); positive
/// offsets walk forward from the head, so `get(1)` is the slot that will
/// be evicted by the next push (the oldest surviving entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagBuffer {
    slots: Vec<i64>,
    head: usize,
}

impl LagBuffer {
    pub fn new(capacity: usize) -> Result<Self, LagError> {
        if capacity == 0 {
            return Err(LagError::InvalidCapacity(capacity));
        }
        Ok(Self {
            slots: vec![0; capacity],
            head: 0,
        })
    }

    /// Buffer sized for the simulation's 14-day transition window.
    pub fn daily() -> Self {
        Self {
            slots: vec![0; MAX_LAG_DAYS],
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn front(&self) -> i64 {
        self.slots[self.head]
    }

    pub fn set_front(&mut self, value: i64) {
        self.slots[self.head] = value;
    }

    /// Accumulate into today's bucket. Same-day inflows from multiple
    /// sources (local spread plus each incident edge) land here.
    pub fn add_front(&mut self, value: i64) {
        self.slots[self.head] += value;
    }

    /// Advance the head and open a new front bucket holding `value`.
    /// Returns the evicted entry from `capacity` pushes ago.
    pub fn push(&mut self, value: i64) -> i64 {
        self.head = (self.head + 1) % self.slots.len();
        let evicted = self.slots[self.head];
        self.slots[self.head] = value;
        evicted
    }

    /// Read the slot at a signed offset from the head.
    pub fn get(&self, offset: i64) -> i64 {
        self.slots[self.resolve(offset)]
    }

    /// Add into the slot at a signed offset (negative deltas record people
    /// leaving a cohort early, so eviction only sees survivors).
    pub fn add_at(&mut self, offset: i64, delta: i64) {
        let idx = self.resolve(offset);
        self.slots[idx] += delta;
    }

    /// Read and zero the slot at a signed offset. Used for early release:
    /// a cohort taken here contributes nothing at eviction time.
    pub fn take(&mut self, offset: i64) -> i64 {
        let idx = self.resolve(offset);
        std::mem::take(&mut self.slots[idx])
    }

    fn resolve(&self, offset: i64) -> usize {
        let capacity = self.slots.len();
        let normalized = if offset >= 0 {
            offset as usize % capacity
        } else {
            let back = (-offset) as usize % capacity;
            (capacity - back) % capacity
        };
        (self.head + normalized) % capacity
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
