// crates/engine/src/queue.rs
//! The playback queue
//!
//! A queue is created fresh for every play intent and destroyed on stop.
//! It owns the cursor and the per-track repeat counter. The end-of-track
//! decision is deliberately order-sensitive: repeat is evaluated before
//! advance, so "repeat 3x" plays each queued verse three times before the
//! cursor moves, not the whole queue three times.

use murattal_core::{RepeatTarget, VerseError, VerseRef};

/// What to do when the current track finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackDecision {
    /// Seek to start and play the same track again (no reload)
    RepeatCurrent,
    /// Load the next queued verse
    Advance(VerseRef),
    /// Queue exhausted
    Finished,
}

/// Ordered verses with a cursor and per-track repeat counter
#[derive(Debug, Clone)]
pub struct PlaybackQueue {
    verses: Vec<VerseRef>,
    cursor: usize,
    current_repeat: u32,
    repeat_target: RepeatTarget,
}

impl PlaybackQueue {
    /// Queue of exactly one verse.
    pub fn single(verse: VerseRef, repeat_target: RepeatTarget) -> Self {
        Self {
            verses: vec![verse],
            cursor: 0,
            current_repeat: 0,
            repeat_target,
        }
    }

    /// Inclusive range of verses within one chapter.
    pub fn range(
        chapter: u16,
        from: u16,
        to: u16,
        repeat_target: RepeatTarget,
    ) -> Result<Self, VerseError> {
        let verses = (from..=to)
            .map(|v| VerseRef::new(chapter, v))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            verses,
            cursor: 0,
            current_repeat: 0,
            repeat_target,
        })
    }

    /// The verse under the cursor, `None` once the queue is exhausted.
    pub fn current(&self) -> Option<VerseRef> {
        self.verses.get(self.cursor).copied()
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_repeat(&self) -> u32 {
        self.current_repeat
    }

    pub fn repeat_target(&self) -> RepeatTarget {
        self.repeat_target
    }

    pub fn set_repeat_target(&mut self, target: RepeatTarget) {
        self.repeat_target = target;
    }

    /// Records a completed play of the current track and decides what
    /// happens next. Repeat is evaluated before advance.
    pub fn finish_track(&mut self) -> TrackDecision {
        self.current_repeat += 1;
        match self.repeat_target {
            RepeatTarget::Infinite => TrackDecision::RepeatCurrent,
            RepeatTarget::Count(n) if self.current_repeat < n => TrackDecision::RepeatCurrent,
            RepeatTarget::Count(_) => {
                self.current_repeat = 0;
                self.cursor += 1;
                match self.current() {
                    Some(verse) => TrackDecision::Advance(verse),
                    None => TrackDecision::Finished,
                }
            }
        }
    }

    /// Moves the cursor forward, resetting the repeat counter.
    pub fn advance(&mut self) -> Option<VerseRef> {
        self.current_repeat = 0;
        self.cursor += 1;
        self.current()
    }

    /// Moves the cursor back, resetting the repeat counter. Returns `None`
    /// (and stays put) at the head of the queue.
    pub fn retreat(&mut self) -> Option<VerseRef> {
        if self.cursor == 0 {
            return None;
        }
        self.current_repeat = 0;
        self.cursor -= 1;
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verse(chapter: u16, verse: u16) -> VerseRef {
        VerseRef::new(chapter, verse).unwrap()
    }

    #[test]
    fn test_single_queue() {
        let queue = PlaybackQueue::single(verse(1, 1), RepeatTarget::default());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.current(), Some(verse(1, 1)));
    }

    #[test]
    fn test_range_queue() {
        let queue = PlaybackQueue::range(1, 3, 7, RepeatTarget::default()).unwrap();
        assert_eq!(queue.len(), 5);
        assert_eq!(queue.current(), Some(verse(1, 3)));
    }

    #[test]
    fn test_range_rejects_invalid_verse() {
        assert!(PlaybackQueue::range(1, 1, 8, RepeatTarget::default()).is_err());
    }

    #[test]
    fn test_repeat_three_times_per_track() {
        // With repeat 3x over two verses, the observed sequence is
        // v1 v1 v1 v2 v2 v2, then finished.
        let mut queue = PlaybackQueue::range(1, 1, 2, RepeatTarget::count(3)).unwrap();
        let mut played = vec![queue.current().unwrap()];

        loop {
            match queue.finish_track() {
                TrackDecision::RepeatCurrent => played.push(queue.current().unwrap()),
                TrackDecision::Advance(v) => played.push(v),
                TrackDecision::Finished => break,
            }
        }

        let expected = vec![
            verse(1, 1),
            verse(1, 1),
            verse(1, 1),
            verse(1, 2),
            verse(1, 2),
            verse(1, 2),
        ];
        assert_eq!(played, expected);
    }

    #[test]
    fn test_infinite_repeat_never_advances() {
        let mut queue = PlaybackQueue::range(1, 1, 2, RepeatTarget::Infinite).unwrap();
        for _ in 0..100 {
            assert_eq!(queue.finish_track(), TrackDecision::RepeatCurrent);
        }
        assert_eq!(queue.cursor(), 0);
    }

    #[test]
    fn test_advance_resets_repeat_counter() {
        let mut queue = PlaybackQueue::range(1, 1, 3, RepeatTarget::count(3)).unwrap();
        queue.finish_track(); // repeat 1
        assert_eq!(queue.current_repeat(), 1);

        let next = queue.advance();
        assert_eq!(next, Some(verse(1, 2)));
        assert_eq!(queue.current_repeat(), 0);
    }

    #[test]
    fn test_retreat_at_head_stays_put() {
        let mut queue = PlaybackQueue::range(1, 1, 3, RepeatTarget::default()).unwrap();
        assert_eq!(queue.retreat(), None);
        assert_eq!(queue.cursor(), 0);

        queue.advance();
        assert_eq!(queue.retreat(), Some(verse(1, 1)));
    }

    #[test]
    fn test_cursor_past_end_is_finished() {
        let mut queue = PlaybackQueue::single(verse(1, 1), RepeatTarget::default());
        assert_eq!(queue.finish_track(), TrackDecision::Finished);
        assert_eq!(queue.current(), None);
    }
}
