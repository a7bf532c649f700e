// crates/engine/src/pipeline.rs
//! The media pipeline seam
//!
//! The engine drives playback through this trait and never assumes a
//! concrete audio stack. Commands are synchronous and non-blocking;
//! readiness, failure and end-of-track come back as discrete events on the
//! channel handed to the pipeline at construction. Position and duration
//! reads must be cheap (the progress tick calls them every 50 ms).

use crate::error::EngineResult;
use std::path::PathBuf;

/// Where the audio bytes come from
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// A cached blob on disk
    File(PathBuf),
    /// Freshly fetched bytes, played while the cache write happens
    /// elsewhere
    Memory(Vec<u8>),
}

impl MediaSource {
    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            MediaSource::File(path) => path.display().to_string(),
            MediaSource::Memory(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

/// Discrete events reported by a pipeline
///
/// Every event carries the generation of the `load` it belongs to. A
/// replaced track may already have queued events on the shared channel
/// when the next `load` happens; the generation lets the consumer drop
/// them instead of attributing them to the new track.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// The track probed successfully and can start playing
    Ready {
        generation: u32,
        /// Track duration in seconds, when the container reports one
        duration: Option<f64>,
    },
    /// Load or decode failure; human-readable reason
    Failed { generation: u32, reason: String },
    /// The current track played to its end
    EndOfTrack { generation: u32 },
}

impl PipelineEvent {
    pub fn generation(&self) -> u32 {
        match self {
            PipelineEvent::Ready { generation, .. }
            | PipelineEvent::Failed { generation, .. }
            | PipelineEvent::EndOfTrack { generation } => *generation,
        }
    }
}

/// An opaque single-track audio pipeline
pub trait AudioPipeline: Send {
    /// Replaces the current track. The caller picks a generation; every
    /// event for this track echoes it back. Emits `Ready` or `Failed` on
    /// the event channel once probing settles.
    fn load(&mut self, source: MediaSource, generation: u32) -> EngineResult<()>;

    fn play(&mut self);

    fn pause(&mut self);

    /// Tears the current track down; no further events for it are emitted.
    fn stop(&mut self);

    /// Repositions within the current track.
    fn seek(&mut self, seconds: f64);

    /// Applies a playback rate multiplier.
    fn set_rate(&mut self, rate: f32);

    /// Current position in track seconds. Non-blocking.
    fn position(&self) -> f64;

    /// Track duration in seconds, once known. Non-blocking.
    fn duration(&self) -> Option<f64>;
}
