//! Verse addressing
//!
//! The source text has a fixed two-level structure: 114 chapters with a
//! known verse count each. Everything downstream (remote resource ids,
//! cache filenames, queue construction) is derived from this table.

use crate::error::VerseError;
use serde::{Deserialize, Serialize};

/// Number of chapters in the text
pub const CHAPTER_COUNT: u16 = 114;

/// Verse count per chapter, indexed by `chapter - 1`
pub const VERSE_COUNTS: [u16; 114] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// Returns the verse count of a chapter, or `None` if the chapter is out of
/// range.
pub fn verse_count(chapter: u16) -> Option<u16> {
    if (1..=CHAPTER_COUNT).contains(&chapter) {
        Some(VERSE_COUNTS[(chapter - 1) as usize])
    } else {
        None
    }
}

/// Computes the global running verse number across all chapters.
///
/// This is the identifier the audio CDN uses for per-verse resources:
/// chapter 1 verse 1 is 1, chapter 2 verse 1 is 8 (chapter 1 has 7 verses),
/// and so on. Derived on demand, never persisted.
pub fn global_ayah_index(chapter: u16, verse: u16) -> u32 {
    let preceding: u32 = VERSE_COUNTS[..(chapter - 1) as usize]
        .iter()
        .map(|&c| c as u32)
        .sum();
    preceding + verse as u32
}

/// A reference to a single verse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseRef {
    chapter: u16,
    verse: u16,
}

impl VerseRef {
    /// Creates a verse reference, validating both coordinates against the
    /// fixed tables.
    pub fn new(chapter: u16, verse: u16) -> Result<Self, VerseError> {
        let max = verse_count(chapter).ok_or(VerseError::ChapterOutOfRange(chapter))?;
        if verse == 0 || verse > max {
            return Err(VerseError::VerseOutOfRange {
                chapter,
                verse,
                max,
            });
        }
        Ok(Self { chapter, verse })
    }

    pub fn chapter(&self) -> u16 {
        self.chapter
    }

    pub fn verse(&self) -> u16 {
        self.verse
    }

    /// Global running verse number of this reference
    pub fn global_index(&self) -> u32 {
        global_ayah_index(self.chapter, self.verse)
    }
}

impl std::fmt::Display for VerseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.chapter, self.verse)
    }
}

/// How many consecutive plays of the same track before the queue advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatTarget {
    /// Play each track `n` times (n >= 1)
    Count(u32),
    /// Repeat the current track until an explicit next/stop
    Infinite,
}

impl RepeatTarget {
    /// Creates a counted target, clamping zero up to one play.
    pub fn count(n: u32) -> Self {
        Self::Count(n.max(1))
    }
}

impl Default for RepeatTarget {
    fn default() -> Self {
        Self::Count(1)
    }
}

impl std::fmt::Display for RepeatTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{}x", n),
            Self::Infinite => write!(f, "infinite"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_all_chapters() {
        assert_eq!(VERSE_COUNTS.len(), CHAPTER_COUNT as usize);
        // Total verse count of the text
        let total: u32 = VERSE_COUNTS.iter().map(|&c| c as u32).sum();
        assert_eq!(total, 6236);
    }

    #[test]
    fn test_verse_count_bounds() {
        assert_eq!(verse_count(1), Some(7));
        assert_eq!(verse_count(2), Some(286));
        assert_eq!(verse_count(114), Some(6));
        assert_eq!(verse_count(0), None);
        assert_eq!(verse_count(115), None);
    }

    #[test]
    fn test_global_index_first_chapters() {
        assert_eq!(global_ayah_index(1, 1), 1);
        assert_eq!(global_ayah_index(1, 7), 7);
        assert_eq!(global_ayah_index(2, 1), 8);
        assert_eq!(global_ayah_index(3, 1), 8 + 286);
    }

    #[test]
    fn test_global_index_of_every_chapter_start() {
        let mut expected = 1u32;
        for chapter in 1..=CHAPTER_COUNT {
            assert_eq!(global_ayah_index(chapter, 1), expected);
            expected += VERSE_COUNTS[(chapter - 1) as usize] as u32;
        }
    }

    #[test]
    fn test_last_verse_is_total() {
        assert_eq!(global_ayah_index(114, 6), 6236);
    }

    #[test]
    fn test_verse_ref_validation() {
        assert!(VerseRef::new(1, 1).is_ok());
        assert!(VerseRef::new(1, 7).is_ok());
        assert!(VerseRef::new(1, 8).is_err());
        assert!(VerseRef::new(1, 0).is_err());
        assert!(VerseRef::new(0, 1).is_err());
        assert!(VerseRef::new(115, 1).is_err());
    }

    #[test]
    fn test_verse_ref_display() {
        let verse = VerseRef::new(2, 255).unwrap();
        assert_eq!(verse.to_string(), "2:255");
    }

    #[test]
    fn test_repeat_target_clamps_zero() {
        assert_eq!(RepeatTarget::count(0), RepeatTarget::Count(1));
        assert_eq!(RepeatTarget::count(3), RepeatTarget::Count(3));
    }
}
