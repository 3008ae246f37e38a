use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::error::EngineError;

use super::core::Engine;
use super::ring_buffer::RingBuffer;

/// Thin adapter from an `Engine` to a host `cpal` output stream.
///
/// Device/stream-config selection mirrors the teacher's own: prefer
/// 44.1 kHz, fall back to 48 kHz, fall back to whatever the device
/// reports as its own default.
pub struct AudioDeviceBinding {
    stream: Option<cpal::Stream>,
}

impl AudioDeviceBinding {
    pub fn new() -> Self {
        Self { stream: None }
    }

    /// Opens the default output device and starts streaming `engine`'s
    /// samples to it. If `tap` is given, every rendered frame is also
    /// published to it for visualization.
    pub fn start(&mut self, mut engine: Engine, tap: Option<Arc<RingBuffer>>) -> Result<(), EngineError> {
        if self.stream.is_some() {
            return Ok(());
        }
        if let Some(tap) = tap {
            engine.set_tap(tap);
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::HostError("no output device".into()))?;

        let config = choose_stream_config(&device, engine.sample_rate())
            .or_else(|| device.default_output_config().ok())
            .ok_or_else(|| EngineError::HostError("no usable output stream config".into()))?;

        let mut stream_config: cpal::StreamConfig = config.into();
        stream_config.buffer_size = cpal::BufferSize::Fixed(1024);

        log::info!(
            "opening audio device {:?} at {} Hz, {} channel(s)",
            device.name().unwrap_or_default(),
            stream_config.sample_rate.0,
            stream_config.channels
        );
        if (stream_config.sample_rate.0 as f32 - engine.sample_rate()).abs() > 0.5 {
            log::warn!(
                "device sample rate {} Hz does not match engine sample rate {} Hz",
                stream_config.sample_rate.0,
                engine.sample_rate()
            );
        }

        let channels = stream_config.channels as usize;
        let err_fn = |err: cpal::StreamError| log::error!("audio stream error: {err}");

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _| {
                    for frame in data.chunks_mut(channels) {
                        let (l, r) = engine.next_sample();
                        frame[0] = l;
                        if frame.len() > 1 {
                            frame[1] = r;
                        }
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| EngineError::HostError(e.to_string()))?;

        stream.play().map_err(|e| EngineError::HostError(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.stream.take();
    }
}

impl Default for AudioDeviceBinding {
    fn default() -> Self {
        Self::new()
    }
}

fn choose_stream_config(device: &cpal::Device, preferred_sample_rate: f32) -> Option<cpal::SupportedStreamConfig> {
    let candidates = [preferred_sample_rate.round().max(1.0) as u32, 44_100, 48_000];
    for sr in candidates {
        if let Ok(supported) = device.supported_output_configs() {
            if let Some(range) = supported.into_iter().find(|cfg_range| {
                cfg_range.channels() == 2
                    && cfg_range.sample_format() == cpal::SampleFormat::F32
                    && cfg_range.min_sample_rate().0 <= sr
                    && cfg_range.max_sample_rate().0 >= sr
            }) {
                return Some(range.with_sample_rate(cpal::SampleRate(sr)));
            }
        }
    }
    if let Ok(supported) = device.supported_output_configs() {
        for cfg_range in supported {
            if cfg_range.channels() == 2 && cfg_range.sample_format() == cpal::SampleFormat::F32 {
                return Some(cfg_range.with_max_sample_rate());
            }
        }
    }
    None
}
