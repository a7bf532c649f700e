//! Domain types for Murattal
//!
//! Organized by responsibility:
//! - `verse`: verse addressing and the fixed chapter/verse tables
//! - `narrator`: the narrator catalog
//! - `locator`: resource location (remote URLs, cache filenames)
//! - `speed`: validated playback speed
//! - `timing`: word-level timing entries
//! - `chapter`: chapter display-name seam to the external text store

mod chapter;
mod locator;
mod narrator;
mod speed;
mod timing;
mod verse;

pub use chapter::{ChapterNames, DefaultChapterNames};
pub use locator::{audio_url, cache_file_name, timing_url};
pub use narrator::Narrator;
pub use speed::PlaybackSpeed;
pub use timing::{TimingTable, WordTiming};
pub use verse::{global_ayah_index, verse_count, RepeatTarget, VerseRef, CHAPTER_COUNT, VERSE_COUNTS};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let verse = VerseRef::new(1, 1).unwrap();
        let _ = audio_url(&Narrator::builtin()[0], verse);
        let _ = PlaybackSpeed::NORMAL;
        let _ = RepeatTarget::default();
    }
}
