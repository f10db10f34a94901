use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use crate::{SamplePair, SampleRing};

/// Counters describing how often the producer managed to hand over data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishStats {
    /// Successful copies into the snapshot slot.
    pub published: u64,
    /// Attempts abandoned because the consumer held the lock.
    pub skipped: u64,
    /// Ring write count captured by the last successful copy.
    pub samples_written: u64,
}

/// Shared slot holding the last successfully published copy of the ring.
///
/// The producer only ever calls [`SnapshotPublisher::try_publish`], which gives
/// up immediately on contention. The consumer acquires the same lock with a
/// blocking call, but only for the duration of a bulk copy.
#[derive(Debug)]
pub struct SnapshotPublisher {
    slot: Mutex<Vec<SamplePair>>,
    published: AtomicU64,
    skipped: AtomicU64,
    samples_written: AtomicU64,
}

impl SnapshotPublisher {
    /// Creates a zero-filled slot matching the ring's capacity.
    pub fn for_ring(ring: &SampleRing) -> Self {
        Self::with_capacity(ring.capacity())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slot: Mutex::new(vec![SamplePair::default(); capacity]),
            published: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            samples_written: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.lock_snapshot().len()
    }

    /// Copies the whole ring into the slot if the lock is free right now.
    ///
    /// Returns `false` without copying when the consumer holds the lock or when
    /// the ring's capacity does not match the slot. Never blocks and never
    /// allocates.
    pub fn try_publish(&self, ring: &SampleRing) -> bool {
        let mut slot = match self.slot.try_lock() {
            Ok(guard) => guard,
            // Slot only holds plain values, a panicked reader cannot leave it torn.
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        };

        if slot.len() != ring.capacity() {
            return false;
        }

        slot.copy_from_slice(ring.as_slice());
        self.samples_written
            .store(ring.samples_written(), Ordering::Relaxed);
        self.published.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Copies the current snapshot into `dst`, waiting for the lock if needed.
    ///
    /// `dst` is resized to the slot length, so a warmed-up buffer is reused
    /// without reallocating.
    pub fn copy_into(&self, dst: &mut Vec<SamplePair>) {
        let slot = self.lock_snapshot();
        dst.clear();
        dst.extend_from_slice(&slot);
    }

    /// Blocking access to the snapshot slot.
    pub fn lock_snapshot(&self) -> MutexGuard<'_, Vec<SamplePair>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> PublishStats {
        PublishStats {
            published: self.published.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            samples_written: self.samples_written.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;

    fn filled_ring(capacity: usize) -> SampleRing {
        let mut ring = SampleRing::new(NonZeroUsize::new(capacity).unwrap());
        for i in 0..capacity {
            ring.write(SamplePair::new(i as f32 * 0.25, 1.0 - i as f32));
        }
        ring
    }

    #[test]
    fn successful_publish_matches_ring_exactly() {
        let ring = filled_ring(16);
        let publisher = SnapshotPublisher::for_ring(&ring);

        assert!(publisher.try_publish(&ring));

        let snapshot = publisher.lock_snapshot();
        assert_eq!(snapshot.as_slice(), ring.as_slice());
        for (published, written) in snapshot.iter().zip(ring.as_slice()) {
            assert_eq!(published.x.to_bits(), written.x.to_bits());
            assert_eq!(published.y.to_bits(), written.y.to_bits());
        }
    }

    #[test]
    fn publish_preserves_raw_slot_order_across_wrap() {
        let mut ring = filled_ring(4);
        ring.write(SamplePair::new(9.0, 9.0));
        let publisher = SnapshotPublisher::for_ring(&ring);

        assert!(publisher.try_publish(&ring));
        assert_eq!(publisher.lock_snapshot()[0], SamplePair::new(9.0, 9.0));
    }

    #[test]
    fn held_lock_makes_publish_fail_fast_and_leaves_snapshot_alone() {
        let ring = filled_ring(8);
        let publisher = Arc::new(SnapshotPublisher::for_ring(&ring));
        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let reader = {
            let publisher = Arc::clone(&publisher);
            thread::spawn(move || {
                let _guard = publisher.lock_snapshot();
                locked_tx.send(()).unwrap();
                release_rx.recv().unwrap();
            })
        };
        locked_rx.recv().unwrap();

        let started = Instant::now();
        assert!(!publisher.try_publish(&ring));
        assert!(started.elapsed() < Duration::from_millis(100));

        release_tx.send(()).unwrap();
        reader.join().unwrap();

        let stats = publisher.stats();
        assert_eq!(stats.published, 0);
        assert_eq!(stats.skipped, 1);
        assert!(publisher
            .lock_snapshot()
            .iter()
            .all(|p| *p == SamplePair::default()));
    }

    #[test]
    fn stale_snapshot_survives_a_skipped_publish() {
        let mut ring = filled_ring(4);
        let publisher = SnapshotPublisher::for_ring(&ring);
        assert!(publisher.try_publish(&ring));
        let before = publisher.lock_snapshot().clone();

        ring.write(SamplePair::new(5.0, 5.0));
        {
            let _reader = publisher.lock_snapshot();
            assert!(!publisher.try_publish(&ring));
        }

        assert_eq!(*publisher.lock_snapshot(), before);
        assert_eq!(publisher.stats().samples_written, 4);
    }

    #[test]
    fn capacity_mismatch_is_rejected() {
        let ring = filled_ring(4);
        let publisher = SnapshotPublisher::with_capacity(8);

        assert!(!publisher.try_publish(&ring));
        assert_eq!(publisher.stats().published, 0);
    }

    #[test]
    fn copy_into_reuses_destination() {
        let ring = filled_ring(32);
        let publisher = SnapshotPublisher::for_ring(&ring);
        publisher.try_publish(&ring);

        let mut dst = Vec::with_capacity(32);
        publisher.copy_into(&mut dst);
        let ptr = dst.as_ptr();
        publisher.copy_into(&mut dst);

        assert_eq!(dst.as_slice(), ring.as_slice());
        assert_eq!(dst.as_ptr(), ptr);
    }
}
