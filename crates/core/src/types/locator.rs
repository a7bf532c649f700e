//! Resource location
//!
//! Pure functions mapping a (narrator, verse) pair to its remote audio URL,
//! its word-timing API URL, and its cache filename. Invalid verse numbers
//! are a caller precondition, not a runtime check here.

use super::narrator::Narrator;
use super::verse::VerseRef;

/// File extension of every audio resource (single codec by design)
pub const AUDIO_EXT: &str = "mp3";

const TIMING_API_BASE: &str = "https://api.quran.com/api/v4/recitations";

/// Remote URL of a verse's audio blob for the given narrator.
pub fn audio_url(narrator: &Narrator, verse: VerseRef) -> String {
    format!(
        "{}{}.{}",
        narrator.audio_base_url,
        verse.global_index(),
        AUDIO_EXT
    )
}

/// Remote URL of the word-timing table for a verse.
pub fn timing_url(recitation_id: u32, verse: VerseRef) -> String {
    format!(
        "{}/{}/by_ayah/{}:{}",
        TIMING_API_BASE,
        recitation_id,
        verse.chapter(),
        verse.verse()
    )
}

/// Deterministic cache filename for a verse's audio blob.
pub fn cache_file_name(narrator_id: u32, verse: VerseRef) -> String {
    format!(
        "{}_{}_{}.{}",
        narrator_id,
        verse.chapter(),
        verse.verse(),
        AUDIO_EXT
    )
}
