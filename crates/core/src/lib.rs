//! Core library for the XY Scope correlation display.
//!
//! Two synchronized audio inputs ("reference" and "effect") are captured as
//! sample pairs into a fixed-capacity ring on the audio thread. Once per cycle
//! the ring is opportunistically published to a shared snapshot slot, which the
//! display side copies out on its own timer and plots as an X-Y scatter.
//!
//! The producer half ([`CaptureContext`]) never blocks; the consumer half
//! ([`Renderer`]) is allowed to wait briefly for the snapshot lock.

#[cfg(feature = "backend")]
pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod export;
pub mod publish;
pub mod render;
pub mod ring;
pub mod timer;

#[cfg(feature = "backend")]
pub use audio::{list_input_devices, AudioEngine, CaptureSession};
pub use capture::{CaptureContext, CycleOutcome};
pub use config::{AppConfig, CaptureConfig, DisplayConfig};
pub use error::{Result, ScopeError};
pub use export::{export_to_path, read_points, write_points};
pub use publish::{PublishStats, SnapshotPublisher};
pub use render::{Pen, PlotMapping, Raster, RenderStats, Renderer, Surface};
pub use ring::{SamplePair, SampleRing, DEFAULT_HISTORY_LEN};
pub use timer::{Ticker, TickerHandle, DEFAULT_TICK_INTERVAL};
