//! Error types for verse addressing

use thiserror::Error;

/// Errors produced when constructing verse references
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerseError {
    /// Chapter number outside 1..=114
    #[error("chapter {0} is out of range (1-114)")]
    ChapterOutOfRange(u16),

    /// Verse number outside the chapter's verse count
    #[error("verse {verse} is out of range for chapter {chapter} (1-{max})")]
    VerseOutOfRange { chapter: u16, verse: u16, max: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VerseError::ChapterOutOfRange(115);
        assert!(err.to_string().contains("115"));

        let err = VerseError::VerseOutOfRange {
            chapter: 1,
            verse: 8,
            max: 7,
        };
        assert!(err.to_string().contains("chapter 1"));
    }
}
