use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::{Result, ScopeError};

/// Render cadence used when nothing else is configured (about 50 Hz).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(20);

/// Periodic scheduler that drives the render tick on its own thread.
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    interval: Duration,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts calling `on_tick` every interval until the handle is stopped.
    ///
    /// A tick that overruns its slot re-bases the schedule on the current time
    /// rather than firing a burst of catch-up ticks.
    pub fn spawn<F>(self, mut on_tick: F) -> Result<TickerHandle>
    where
        F: FnMut() + Send + 'static,
    {
        if self.interval.is_zero() {
            return Err(ScopeError::InvalidConfig("tick interval must be non-zero"));
        }

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let interval = self.interval;

        let thread = thread::Builder::new()
            .name("scope-render-tick".to_string())
            .spawn(move || {
                let mut next = Instant::now() + interval;
                while flag.load(Ordering::Acquire) {
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                        continue;
                    }
                    on_tick();
                    next += interval;
                    let now = Instant::now();
                    if next <= now {
                        next = now + interval;
                    }
                }
            })?;

        tracing::debug!(interval_ms = interval.as_millis() as u64, "render ticker started");
        Ok(TickerHandle {
            running,
            thread: Some(thread),
        })
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

/// Owns the ticker thread; stopping or dropping it ends the schedule.
#[derive(Debug)]
pub struct TickerHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl TickerHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops the schedule and waits for an in-flight tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("render tick thread panicked");
            }
        }
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn ticks_repeatedly_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handle = Ticker::new(Duration::from_millis(5))
            .spawn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        thread::sleep(Duration::from_millis(120));
        handle.stop();
        let stopped_at = count.load(Ordering::SeqCst);
        assert!(stopped_at >= 3, "only {stopped_at} ticks");

        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), stopped_at);
    }

    #[test]
    fn dropping_the_handle_stops_ticking() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handle = Ticker::new(Duration::from_millis(2))
            .spawn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert!(handle.is_running());
        drop(handle);

        let after_drop = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = Ticker::new(Duration::ZERO).spawn(|| {}).unwrap_err();
        assert!(matches!(err, ScopeError::InvalidConfig(_)));
    }

    #[test]
    fn default_cadence_is_twenty_milliseconds() {
        assert_eq!(Ticker::default().interval(), Duration::from_millis(20));
    }
}
