// crates/engine/src/audio/output.rs
//! cpal output stream
//!
//! One stream per loaded track, fed from a bounded sample channel. The
//! device callback drains whatever the decode loop has queued and pads
//! with silence on underrun.

use crate::error::{EngineError, EngineResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub(crate) struct AudioOutput {
    device: cpal::Device,
    config: cpal::StreamConfig,
    stream: Option<cpal::Stream>,
}

impl AudioOutput {
    pub(crate) fn new(sample_rate: u32, channels: u16) -> EngineResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::Output("No output device available".to_string()))?;

        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        Ok(Self {
            device,
            config,
            stream: None,
        })
    }

    /// Starts the output stream, pulling interleaved f32 samples from `rx`.
    pub(crate) fn start(
        &mut self,
        rx: Receiver<Vec<f32>>,
        running: Arc<AtomicBool>,
    ) -> EngineResult<()> {
        let mut pending: Vec<f32> = Vec::new();

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _| {
                    if !running.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }
                    let mut written = 0;
                    while written < data.len() {
                        if pending.is_empty() {
                            match rx.try_recv() {
                                Ok(chunk) => pending = chunk,
                                Err(_) => break,
                            }
                        }
                        let take = pending.len().min(data.len() - written);
                        data[written..written + take].copy_from_slice(&pending[..take]);
                        pending.drain(..take);
                        written += take;
                    }
                    // Underrun: pad with silence rather than repeating stale
                    // samples.
                    data[written..].fill(0.0);
                },
                |err| log::error!("Audio output stream error: {}", err),
                None,
            )
            .map_err(|e| EngineError::Output(format!("Failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| EngineError::Output(format!("Failed to start output stream: {}", e)))?;

        self.stream = Some(stream);
        Ok(())
    }

    pub(crate) fn stop(&mut self) {
        self.stream = None;
    }
}
