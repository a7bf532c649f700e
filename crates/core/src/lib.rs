//! Shared domain types for Murattal
//!
//! This crate holds everything the playback, cache and network crates agree
//! on: verse addressing, the narrator catalog, resource location, playback
//! speed, and word-timing types. It has no I/O and no state.

pub mod error;
pub mod types;

pub use error::VerseError;
pub use types::{
    audio_url, cache_file_name, global_ayah_index, timing_url, verse_count, ChapterNames,
    DefaultChapterNames, Narrator, PlaybackSpeed, RepeatTarget, TimingTable, VerseRef,
    WordTiming, CHAPTER_COUNT, VERSE_COUNTS,
};
