// crates/engine/src/now_playing.rs
//! Now-playing metadata publication
//!
//! The engine pushes track metadata through this seam on every verse
//! change and transport action so a platform integration (desktop media
//! keys, a status bar, a remote control surface) can mirror playback.
//! Inbound transport commands are translated to engine commands by the
//! handle; the publisher itself is outbound-only.

use murattal_core::{Narrator, VerseRef};

/// Metadata for the track currently loaded
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingInfo {
    /// "Verse {n}"
    pub title: String,
    /// Chapter display name
    pub album: String,
    /// Narrator display name
    pub artist: String,
    /// Playback rate; 0.0 while paused or stopped so progress bars freeze
    pub rate: f32,
    pub elapsed: f64,
    pub duration: Option<f64>,
}

impl NowPlayingInfo {
    pub fn new(verse: VerseRef, chapter_name: String, narrator: &Narrator) -> Self {
        Self {
            title: format!("Verse {}", verse.verse()),
            album: chapter_name,
            artist: narrator.name.clone(),
            rate: 0.0,
            elapsed: 0.0,
            duration: None,
        }
    }
}

/// Transport actions arriving from a platform control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Play,
    Pause,
    NextTrack,
    PreviousTrack,
}

/// Outbound sink for now-playing metadata
pub trait NowPlayingPublisher: Send + Sync {
    fn publish(&self, info: &NowPlayingInfo);

    /// Called when playback stops and the slate should be cleared.
    fn clear(&self);
}

/// Publisher that just logs; the default when no platform surface is wired
/// up.
#[derive(Debug, Default)]
pub struct LogPublisher;

impl NowPlayingPublisher for LogPublisher {
    fn publish(&self, info: &NowPlayingInfo) {
        log::debug!(
            "Now playing: {} - {} ({}) rate={}",
            info.album,
            info.title,
            info.artist,
            info.rate
        );
    }

    fn clear(&self) {
        log::debug!("Now playing cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_from_verse() {
        let narrator = &Narrator::builtin()[0];
        let verse = VerseRef::new(2, 255).unwrap();
        let info = NowPlayingInfo::new(verse, "Surah 2".to_string(), narrator);

        assert_eq!(info.title, "Verse 255");
        assert_eq!(info.album, "Surah 2");
        assert_eq!(info.artist, narrator.name);
        assert_eq!(info.rate, 0.0);
    }

    #[test]
    fn test_log_publisher_is_inert() {
        let publisher = LogPublisher;
        let narrator = &Narrator::builtin()[0];
        let info = NowPlayingInfo::new(VerseRef::new(1, 1).unwrap(), "Surah 1".to_string(), narrator);
        publisher.publish(&info);
        publisher.clear();
    }
}
