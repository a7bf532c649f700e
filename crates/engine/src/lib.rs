//! Recitation Engine - verse-by-verse audio playback for Murattal
//!
//! The engine owns all playback state and mutates it on a single control
//! task. Callers talk to it through an [`EngineHandle`] (commands in, a
//! watch channel of [`EngineSnapshot`]s out). Audio itself runs behind the
//! [`AudioPipeline`] trait; the bundled [`SymphoniaPipeline`] decodes mp3 on
//! a worker thread and plays through the default output device.

pub mod audio;
mod engine;
mod error;
mod now_playing;
mod pipeline;
mod queue;
mod state;
mod timing;

pub use audio::SymphoniaPipeline;
pub use engine::{EngineConfig, EngineHandle, RecitationEngine};
pub use error::{EngineError, EngineResult};
pub use now_playing::{LogPublisher, NowPlayingInfo, NowPlayingPublisher, TransportCommand};
pub use pipeline::{AudioPipeline, MediaSource, PipelineEvent};
pub use queue::{PlaybackQueue, TrackDecision};
pub use state::{EngineSnapshot, PlaybackState};
pub use timing::{word_index_at, TimingStore};

pub use murattal_core::{Narrator, PlaybackSpeed, RepeatTarget, VerseRef};
