//! Chapter display names
//!
//! Canonical chapter names live in the external text store. This trait is
//! the seam the engine uses when projecting now-playing metadata; the
//! default implementation produces a generic label so playback never
//! depends on the store being present.

/// Source of human-readable chapter names
pub trait ChapterNames: Send + Sync {
    fn name(&self, chapter: u16) -> String;
}

/// Fallback name source used when no text store is wired in
#[derive(Debug, Default, Clone)]
pub struct DefaultChapterNames;

impl ChapterNames for DefaultChapterNames {
    fn name(&self, chapter: u16) -> String {
        format!("Surah {}", chapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let names = DefaultChapterNames;
        assert_eq!(names.name(36), "Surah 36");
    }
}
