// crates/engine/src/state.rs
//! Observable engine state

use murattal_core::{PlaybackSpeed, RepeatTarget, VerseRef};
use serde::Serialize;

/// The engine's lifecycle state
///
/// Exactly one instance exists, owned by the control task and published
/// through a watch channel. `Error` is terminal until a new play intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
    Error(String),
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, PlaybackState::Paused)
    }

    /// Whether a track is loaded or loading. A narrator switch in this
    /// state forces a stop.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            PlaybackState::Loading | PlaybackState::Playing | PlaybackState::Paused
        )
    }
}

/// A point-in-time projection of the whole engine, published on every
/// observable change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub state: PlaybackState,
    pub narrator_id: u32,
    pub current: Option<VerseRef>,
    /// Seconds into the current track
    pub elapsed: f64,
    /// Track duration in seconds, once known
    pub duration: Option<f64>,
    pub speed: PlaybackSpeed,
    pub repeat: RepeatTarget,
    /// 0-based index of the word under the playhead, `None` before the
    /// timing table arrives or outside any interval
    pub highlighted_word: Option<usize>,
}

impl EngineSnapshot {
    pub fn idle(narrator_id: u32) -> Self {
        Self {
            state: PlaybackState::Idle,
            narrator_id,
            current: None,
            elapsed: 0.0,
            duration: None,
            speed: PlaybackSpeed::NORMAL,
            repeat: RepeatTarget::default(),
            highlighted_word: None,
        }
    }

    pub fn progress(&self) -> f64 {
        match self.duration {
            Some(d) if d > 0.0 => (self.elapsed / d).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}
