// crates/engine/src/timing.rs
//! Word-timing synchronization
//!
//! Maps the playhead position to a word index using tables fetched from the
//! timing API. Lookup is a pure in-memory scan so the progress tick never
//! blocks. Tables are cached per verse for the lifetime of the current
//! narrator and dropped wholesale when the narrator changes, since one
//! narrator's timings say nothing about another's recording.

use murattal_core::{TimingTable, VerseRef, WordTiming};
use std::collections::HashMap;

/// Returns the word index whose `[start, end)` interval contains the
/// elapsed time, or `None` when no interval matches.
///
/// `None` means "unchanged": the caller keeps the previous highlight rather
/// than clearing it, which avoids flicker between word boundaries. If the
/// remote data has overlapping intervals the first match in table order
/// wins.
pub fn word_index_at(table: &[WordTiming], elapsed: f64) -> Option<usize> {
    table
        .iter()
        .find(|t| t.contains(elapsed))
        .map(|t| t.word_index)
}

/// In-memory store of timing tables, keyed by verse
///
/// Never persisted; invalidated implicitly on narrator change.
#[derive(Debug, Default)]
pub struct TimingStore {
    tables: HashMap<(u16, u16), TimingTable>,
}

impl TimingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, verse: VerseRef) -> Option<&TimingTable> {
        self.tables.get(&(verse.chapter(), verse.verse()))
    }

    pub fn contains(&self, verse: VerseRef) -> bool {
        self.tables.contains_key(&(verse.chapter(), verse.verse()))
    }

    pub fn insert(&mut self, verse: VerseRef, table: TimingTable) {
        self.tables
            .insert((verse.chapter(), verse.verse()), table);
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> TimingTable {
        vec![WordTiming::new(0, 0.0, 0.5), WordTiming::new(1, 0.5, 1.2)]
    }

    #[test]
    fn test_lookup_inside_intervals() {
        let table = sample_table();
        assert_eq!(word_index_at(&table, 0.0), Some(0));
        assert_eq!(word_index_at(&table, 0.49), Some(0));
        assert_eq!(word_index_at(&table, 0.5), Some(1));
        assert_eq!(word_index_at(&table, 1.19), Some(1));
    }

    #[test]
    fn test_lookup_outside_intervals_is_unchanged() {
        let table = sample_table();
        assert_eq!(word_index_at(&table, -1.0), None);
        assert_eq!(word_index_at(&table, 1.2), None);
        assert_eq!(word_index_at(&table, 5.0), None);
    }

    #[test]
    fn test_lookup_empty_table() {
        assert_eq!(word_index_at(&[], 0.5), None);
    }

    #[test]
    fn test_overlapping_intervals_first_wins() {
        let table = vec![WordTiming::new(3, 0.0, 1.0), WordTiming::new(9, 0.5, 1.5)];
        assert_eq!(word_index_at(&table, 0.7), Some(3));
    }

    #[test]
    fn test_store_roundtrip_and_clear() {
        let mut store = TimingStore::new();
        let verse = VerseRef::new(1, 1).unwrap();

        assert!(!store.contains(verse));
        store.insert(verse, sample_table());
        assert!(store.contains(verse));
        assert_eq!(store.get(verse).unwrap().len(), 2);

        store.clear();
        assert!(!store.contains(verse));
    }
}
