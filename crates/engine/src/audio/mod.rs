// crates/engine/src/audio/mod.rs
//! Symphonia-backed audio pipeline
//!
//! One worker thread per loaded track owns the decoder and the cpal stream;
//! the pipeline handle on the engine side only holds a command channel and
//! shared position/duration atomics, so every trait method is non-blocking.
//! Rate change is a frame-skipping resample in the decode loop, which
//! shifts pitch with tempo; recitation listeners use modest speed ranges
//! where this is acceptable.

mod decoder;
mod output;

use crate::error::EngineResult;
use crate::pipeline::{AudioPipeline, MediaSource, PipelineEvent};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use decoder::VerseDecoder;
use output::AudioOutput;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Sample chunks buffered ahead of the device callback.
const CHUNK_BUFFER: usize = 8;

enum WorkerCommand {
    Play,
    Pause,
    Seek(f64),
    SetRate(f32),
    Stop,
}

struct Worker {
    commands: Sender<WorkerCommand>,
    running: Arc<AtomicBool>,
    position_bits: Arc<AtomicU64>,
    duration_bits: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        let _ = self.commands.send(WorkerCommand::Stop);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The production [`AudioPipeline`]: symphonia mp3 decode into a cpal
/// output stream.
pub struct SymphoniaPipeline {
    events: UnboundedSender<PipelineEvent>,
    worker: Option<Worker>,
    rate: f32,
}

impl SymphoniaPipeline {
    pub fn new(events: UnboundedSender<PipelineEvent>) -> Self {
        Self {
            events,
            worker: None,
            rate: 1.0,
        }
    }
}

impl AudioPipeline for SymphoniaPipeline {
    fn load(&mut self, source: MediaSource, generation: u32) -> EngineResult<()> {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }

        log::debug!("Loading track from {}", source.describe());

        let (cmd_tx, cmd_rx) = unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let position_bits = Arc::new(AtomicU64::new(0f64.to_bits()));
        let duration_bits = Arc::new(AtomicU64::new(f64::NAN.to_bits()));

        let events = self.events.clone();
        let thread_running = running.clone();
        let thread_position = position_bits.clone();
        let thread_duration = duration_bits.clone();
        let rate = self.rate;

        let thread = std::thread::Builder::new()
            .name("verse-playback".to_string())
            .spawn(move || {
                worker_loop(
                    source,
                    generation,
                    events,
                    cmd_rx,
                    thread_running,
                    thread_position,
                    thread_duration,
                    rate,
                );
            })
            .map_err(|e| crate::error::EngineError::Output(format!(
                "Failed to spawn playback thread: {}",
                e
            )))?;

        self.worker = Some(Worker {
            commands: cmd_tx,
            running,
            position_bits,
            duration_bits,
            thread: Some(thread),
        });
        Ok(())
    }

    fn play(&mut self) {
        if let Some(worker) = &self.worker {
            let _ = worker.commands.send(WorkerCommand::Play);
        }
    }

    fn pause(&mut self) {
        if let Some(worker) = &self.worker {
            let _ = worker.commands.send(WorkerCommand::Pause);
        }
    }

    fn stop(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
    }

    fn seek(&mut self, seconds: f64) {
        if let Some(worker) = &self.worker {
            // Optimistic: the progress tick reads a sane value even before
            // the worker services the command.
            worker
                .position_bits
                .store(seconds.max(0.0).to_bits(), Ordering::Relaxed);
            let _ = worker.commands.send(WorkerCommand::Seek(seconds));
        }
    }

    fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
        if let Some(worker) = &self.worker {
            let _ = worker.commands.send(WorkerCommand::SetRate(rate));
        }
    }

    fn position(&self) -> f64 {
        match &self.worker {
            Some(worker) => f64::from_bits(worker.position_bits.load(Ordering::Relaxed)),
            None => 0.0,
        }
    }

    fn duration(&self) -> Option<f64> {
        let worker = self.worker.as_ref()?;
        let value = f64::from_bits(worker.duration_bits.load(Ordering::Relaxed));
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    source: MediaSource,
    generation: u32,
    events: UnboundedSender<PipelineEvent>,
    commands: Receiver<WorkerCommand>,
    running: Arc<AtomicBool>,
    position_bits: Arc<AtomicU64>,
    duration_bits: Arc<AtomicU64>,
    initial_rate: f32,
) {
    let mut decoder = match VerseDecoder::new(source) {
        Ok(decoder) => decoder,
        Err(e) => {
            let _ = events.send(PipelineEvent::Failed {
                generation,
                reason: e.to_string(),
            });
            return;
        }
    };

    let duration = decoder.duration();
    if let Some(d) = duration {
        duration_bits.store(d.to_bits(), Ordering::Relaxed);
    }

    let sample_rate = decoder.sample_rate();
    let channels = decoder.channels();

    let (chunk_tx, chunk_rx) = bounded::<Vec<f32>>(CHUNK_BUFFER);
    let mut output = match AudioOutput::new(sample_rate, channels as u16) {
        Ok(output) => output,
        Err(e) => {
            let _ = events.send(PipelineEvent::Failed {
                generation,
                reason: e.to_string(),
            });
            return;
        }
    };
    if let Err(e) = output.start(chunk_rx, running.clone()) {
        let _ = events.send(PipelineEvent::Failed {
            generation,
            reason: e.to_string(),
        });
        return;
    }

    let _ = events.send(PipelineEvent::Ready {
        generation,
        duration,
    });

    let mut playing = false;
    let mut rate = initial_rate;
    let mut phase = 0.0f64;
    let mut position = 0.0f64;
    let mut pending_chunk: Option<Vec<f32>> = None;

    'main: while running.load(Ordering::Relaxed) {
        // Commands first so pause and seek stay responsive while the chunk
        // buffer is full.
        while let Ok(command) = commands.try_recv() {
            match command {
                WorkerCommand::Play => playing = true,
                WorkerCommand::Pause => playing = false,
                WorkerCommand::Seek(seconds) => {
                    if let Err(e) = decoder.seek(seconds) {
                        log::warn!("Seek failed: {}", e);
                        continue;
                    }
                    position = seconds.max(0.0);
                    position_bits.store(position.to_bits(), Ordering::Relaxed);
                    phase = 0.0;
                    pending_chunk = None;
                }
                WorkerCommand::SetRate(r) => rate = r,
                WorkerCommand::Stop => break 'main,
            }
        }

        if !playing {
            std::thread::sleep(Duration::from_millis(10));
            continue;
        }

        let chunk = match pending_chunk.take() {
            Some(chunk) => chunk,
            None => match decoder.decode_next() {
                Ok(Some(samples)) => {
                    let frames = samples.len() / channels;
                    position += frames as f64 / sample_rate as f64;
                    position_bits.store(position.to_bits(), Ordering::Relaxed);
                    resample(&samples, channels, rate, &mut phase)
                }
                Ok(None) => {
                    playing = false;
                    let _ = events.send(PipelineEvent::EndOfTrack { generation });
                    continue;
                }
                Err(e) => {
                    let _ = events.send(PipelineEvent::Failed {
                        generation,
                        reason: e.to_string(),
                    });
                    break;
                }
            },
        };

        match chunk_tx.try_send(chunk) {
            Ok(()) => {}
            Err(TrySendError::Full(chunk)) => {
                // Device callback hasn't caught up; hold the chunk and poll
                // again shortly.
                pending_chunk = Some(chunk);
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(TrySendError::Disconnected(_)) => break,
        }
    }

    output.stop();
}

/// Frame-skipping rate adjustment over interleaved samples. `phase` carries
/// the fractional read offset across chunks.
fn resample(samples: &[f32], channels: usize, rate: f32, phase: &mut f64) -> Vec<f32> {
    if (rate - 1.0).abs() < 1e-3 {
        return samples.to_vec();
    }
    let rate = f64::from(rate.max(0.1));
    let frames = samples.len() / channels;
    let mut out = Vec::with_capacity(((frames as f64 / rate) as usize + 1) * channels);
    let mut cursor = *phase;
    while (cursor as usize) < frames {
        let frame = cursor as usize;
        out.extend_from_slice(&samples[frame * channels..(frame + 1) * channels]);
        cursor += rate;
    }
    *phase = cursor - frames as f64;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_unity_rate_is_passthrough() {
        let samples: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let mut phase = 0.0;
        assert_eq!(resample(&samples, 2, 1.0, &mut phase), samples);
    }

    #[test]
    fn test_resample_double_rate_halves_frames() {
        let samples: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let mut phase = 0.0;
        let out = resample(&samples, 2, 2.0, &mut phase);
        assert_eq!(out.len(), 8);
        // Frames 0, 2, 4, 6 survive; channel pairs stay intact.
        assert_eq!(&out[..4], &[0.0, 1.0, 4.0, 5.0]);
    }

    #[test]
    fn test_resample_half_rate_doubles_frames() {
        let samples: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let mut phase = 0.0;
        let out = resample(&samples, 2, 0.5, &mut phase);
        assert_eq!(out.len(), 16);
    }

    #[test]
    fn test_resample_phase_carries_across_chunks() {
        let samples: Vec<f32> = (0..6).map(|i| i as f32).collect();
        let mut phase = 0.0;
        resample(&samples, 2, 1.5, &mut phase);
        assert!(phase > 0.0 && phase < 1.5);
    }

    #[tokio::test]
    async fn test_load_garbage_reports_failed_with_generation() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut pipeline = SymphoniaPipeline::new(tx);
        pipeline
            .load(MediaSource::Memory(b"not an mp3 at all".to_vec()), 5)
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, PipelineEvent::Failed { .. }));
        assert_eq!(event.generation(), 5);
    }

    #[test]
    fn test_position_without_worker_is_zero() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let pipeline = SymphoniaPipeline::new(tx);
        assert_eq!(pipeline.position(), 0.0);
        assert_eq!(pipeline.duration(), None);
    }
}
