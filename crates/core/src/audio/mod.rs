//! Live audio engine boundary built on cpal.
//!
//! The scope needs two mono inputs, "Reference" and "Effect". The engine uses
//! a single multichannel input device for them and picks the two configured
//! channel indices out of each interleaved frame. Setup failures are fatal and
//! are never retried.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};

use crate::{CaptureConfig, CaptureContext, Result, SamplePair, ScopeError};

/// Endpoint names, in (reference, effect) order.
pub const ENDPOINTS: [&str; 2] = ["Reference", "Effect"];

/// A running input stream feeding a [`CaptureContext`].
///
/// The stream stops when the session is dropped.
pub struct CaptureSession {
    _stream: cpal::Stream,
    device_name: String,
    sample_rate: u32,
    channels: u16,
}

impl CaptureSession {
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("device_name", &self.device_name)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish()
    }
}

/// Opens input devices and binds them to the capture path.
#[derive(Debug, Default)]
pub struct AudioEngine;

impl AudioEngine {
    /// Opens the configured device, moves `capture` into its process callback
    /// and starts the stream.
    pub fn open(config: &CaptureConfig, capture: CaptureContext) -> Result<CaptureSession> {
        let host = cpal::default_host();
        tracing::debug!(host = ?host.id(), "using audio host");

        let device = select_input_device(&host, config.device.as_deref())?;
        let device_name = device
            .name()
            .unwrap_or_else(|_| "<unknown input>".to_string());
        let supported = device
            .default_input_config()
            .map_err(|err| ScopeError::setup(format!("cannot query `{device_name}`: {err}")))?;
        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.config();
        let channels = stream_config.channels;

        let needed = config
            .reference_channel
            .max(config.effect_channel)
            .saturating_add(1);
        if channels < needed {
            return Err(ScopeError::setup(format!(
                "`{device_name}` has {channels} input channel(s); \
                 {} on {} and {} on {} need {needed}",
                ENDPOINTS[0], config.reference_channel, ENDPOINTS[1], config.effect_channel
            )));
        }

        let routing = Routing {
            channels: usize::from(channels),
            reference: usize::from(config.reference_channel),
            effect: usize::from(config.effect_channel),
        };

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &stream_config, routing, capture)
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &stream_config, routing, capture)
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &stream_config, routing, capture)
            }
            other => {
                return Err(ScopeError::setup(format!(
                    "unsupported sample format: {other:?}"
                )))
            }
        }?;

        stream
            .play()
            .map_err(|err| ScopeError::setup(format!("cannot start `{device_name}`: {err}")))?;

        tracing::info!(
            device = %device_name,
            sample_rate = stream_config.sample_rate.0,
            channels,
            reference_channel = config.reference_channel,
            effect_channel = config.effect_channel,
            "capture started"
        );

        Ok(CaptureSession {
            _stream: stream,
            device_name,
            sample_rate: stream_config.sample_rate.0,
            channels,
        })
    }
}

/// Names of every input device the default host reports.
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|err| ScopeError::setup(format!("cannot enumerate input devices: {err}")))?;
    Ok(devices.filter_map(|device| device.name().ok()).collect())
}

#[derive(Debug, Clone, Copy)]
struct Routing {
    channels: usize,
    reference: usize,
    effect: usize,
}

fn select_input_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    if let Some(target) = name {
        let devices = host
            .input_devices()
            .map_err(|err| ScopeError::setup(format!("cannot enumerate input devices: {err}")))?;
        return devices
            .into_iter()
            .find(|device| device.name().map(|n| n == target).unwrap_or(false))
            .ok_or_else(|| ScopeError::setup(format!("input device `{target}` not found")));
    }

    host.default_input_device()
        .ok_or_else(|| ScopeError::setup("no audio input device available"))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    routing: Routing,
    mut capture: CaptureContext,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let err_fn = |err: cpal::StreamError| tracing::error!("audio stream error: {err}");

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                capture.process_pairs(deinterleave(data, routing));
            },
            err_fn,
            None,
        )
        .map_err(|err| ScopeError::setup(format!("cannot build input stream: {err}")))
}

/// Picks the reference and effect channels out of each interleaved frame.
///
/// A trailing partial frame is dropped.
fn deinterleave<T>(data: &[T], routing: Routing) -> impl Iterator<Item = SamplePair> + '_
where
    T: SizedSample,
    f32: FromSample<T>,
{
    data.chunks_exact(routing.channels).map(move |frame| {
        SamplePair::new(
            f32::from_sample_(frame[routing.reference]),
            f32::from_sample_(frame[routing.effect]),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routing(channels: usize, reference: usize, effect: usize) -> Routing {
        Routing {
            channels,
            reference,
            effect,
        }
    }

    #[test]
    fn routes_configured_channels_to_each_axis() {
        // Frame n holds n.0, n.1, n.2, n.3 on channels 0..4.
        let data = [0.0_f32, 0.1, 0.2, 0.3, 1.0, 1.1, 1.2, 1.3, 2.0, 2.1, 2.2, 2.3];

        let pairs: Vec<_> = deinterleave(&data, routing(4, 2, 0)).collect();

        assert_eq!(
            pairs,
            vec![
                SamplePair::new(0.2, 0.0),
                SamplePair::new(1.2, 1.0),
                SamplePair::new(2.2, 2.0),
            ]
        );
    }

    #[test]
    fn drops_trailing_partial_frame() {
        let data = [0.5_f32, -0.5, 0.25, -0.25, 0.75];

        let pairs: Vec<_> = deinterleave(&data, routing(2, 0, 1)).collect();

        assert_eq!(
            pairs,
            vec![SamplePair::new(0.5, -0.5), SamplePair::new(0.25, -0.25)]
        );
    }

    #[test]
    fn integer_samples_are_normalised() {
        let data = [i16::MAX, 0, i16::MIN, 0];

        let pairs: Vec<_> = deinterleave(&data, routing(2, 0, 1)).collect();

        assert!((pairs[0].x - 1.0).abs() < 1e-4);
        assert_eq!(pairs[0].y, 0.0);
        assert_eq!(pairs[1].x, -1.0);
    }

    #[test]
    fn feeds_capture_context_once_per_buffer() {
        let (mut capture, publisher) =
            CaptureContext::new(std::num::NonZeroUsize::new(4).unwrap());
        let data = [0.1_f32, 0.9, 0.2, 0.8, 0.3];

        let outcome = capture.process_pairs(deinterleave(&data, routing(2, 1, 0)));

        assert_eq!(outcome.frames, 2);
        assert!(outcome.published);
        assert_eq!(publisher.lock_snapshot()[1], SamplePair::new(0.8, 0.2));
    }
}
