//! Real-time entry point driven once per audio processing cycle.
//!
//! [`CaptureContext`] owns the sample ring outright and shares only the
//! [`SnapshotPublisher`] with the display side. Every method here is safe to call
//! from an audio callback: no allocation, no blocking lock, no logging.

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::{SamplePair, SampleRing, SnapshotPublisher};

/// What a single capture cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Pairs written into the ring during this cycle.
    pub frames: usize,
    /// Whether the end-of-cycle publish reached the snapshot slot.
    pub published: bool,
}

/// Producer half of the scope: the ring plus a handle to the shared snapshot.
#[derive(Debug)]
pub struct CaptureContext {
    ring: SampleRing,
    publisher: Arc<SnapshotPublisher>,
}

impl CaptureContext {
    /// Builds the producer context and returns the publisher the consumer reads.
    pub fn new(capacity: NonZeroUsize) -> (Self, Arc<SnapshotPublisher>) {
        let ring = SampleRing::new(capacity);
        let publisher = Arc::new(SnapshotPublisher::for_ring(&ring));
        let context = Self {
            ring,
            publisher: Arc::clone(&publisher),
        };
        (context, publisher)
    }

    pub fn ring(&self) -> &SampleRing {
        &self.ring
    }

    /// Processes one cycle of planar reference/effect buffers.
    ///
    /// A missing buffer skips the writes but still attempts a publish of the
    /// unchanged history. Buffers of unequal length are truncated to the
    /// shorter one.
    pub fn process(&mut self, reference: Option<&[f32]>, effect: Option<&[f32]>) -> CycleOutcome {
        let frames = match (reference, effect) {
            (Some(reference), Some(effect)) => {
                let pairs = reference
                    .iter()
                    .zip(effect)
                    .map(|(&x, &y)| SamplePair::new(x, y));
                self.write_all(pairs)
            }
            _ => 0,
        };

        CycleOutcome {
            frames,
            published: self.publisher.try_publish(&self.ring),
        }
    }

    /// Processes one cycle of already-paired frames, e.g. de-interleaved lazily
    /// from a multichannel engine buffer.
    pub fn process_pairs<I>(&mut self, pairs: I) -> CycleOutcome
    where
        I: IntoIterator<Item = SamplePair>,
    {
        let frames = self.write_all(pairs);
        CycleOutcome {
            frames,
            published: self.publisher.try_publish(&self.ring),
        }
    }

    fn write_all<I>(&mut self, pairs: I) -> usize
    where
        I: IntoIterator<Item = SamplePair>,
    {
        let mut frames = 0;
        for pair in pairs {
            self.ring.write(pair);
            frames += 1;
        }
        frames
    }
}
