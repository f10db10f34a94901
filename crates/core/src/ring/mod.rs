use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// History length used when nothing else is configured.
pub const DEFAULT_HISTORY_LEN: usize = 64 * 1024;

/// One instant's (reference, effect) amplitude pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplePair {
    pub x: f32,
    pub y: f32,
}

impl SamplePair {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Both coordinates are neither NaN nor infinite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Fixed-capacity circular history written by the capture path.
///
/// Storage is allocated once in [`SampleRing::new`]. Writing never allocates,
/// locks or fails: the oldest pair is overwritten once the ring is full. Slots
/// that have not been written yet hold `(0, 0)`.
#[derive(Debug, Clone)]
pub struct SampleRing {
    slots: Box<[SamplePair]>,
    cursor: usize,
    written: u64,
}

impl SampleRing {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: vec![SamplePair::default(); capacity.get()].into_boxed_slice(),
            cursor: 0,
            written: 0,
        }
    }

    /// Stores `pair` at the cursor and advances it, wrapping at capacity.
    #[inline]
    pub fn write(&mut self, pair: SamplePair) {
        self.slots[self.cursor] = pair;
        self.cursor += 1;
        if self.cursor == self.slots.len() {
            self.cursor = 0;
        }
        self.written = self.written.wrapping_add(1);
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Index of the slot the next write will overwrite.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total number of pairs written since creation.
    pub fn samples_written(&self) -> u64 {
        self.written
    }

    /// Raw slot order, wrap point included.
    pub fn as_slice(&self) -> &[SamplePair] {
        &self.slots
    }

    /// Walks the slots from oldest to newest.
    pub fn iter_chronological(&self) -> impl Iterator<Item = &SamplePair> + '_ {
        let (newer, older) = self.slots.split_at(self.cursor);
        older.iter().chain(newer.iter())
    }
}

impl Default for SampleRing {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_HISTORY_LEN).unwrap_or(NonZeroUsize::MIN))
    }
}
