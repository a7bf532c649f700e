// crates/cache/src/store.rs
//! The audio cache store

use crate::error::{CacheError, CacheResult};
use murattal_core::{cache_file_name, verse_count, VerseRef};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Content-addressed on-disk cache of per-verse audio blobs
#[derive(Debug, Clone)]
pub struct AudioCache {
    root: PathBuf,
}

impl AudioCache {
    /// Opens (and creates if needed) the cache at the given root directory.
    pub fn new<P: AsRef<Path>>(root: P) -> CacheResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| CacheError::CreateRoot {
            path: root.clone(),
            source: e,
        })?;
        Ok(Self { root })
    }

    /// Returns the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path of a verse's audio blob for a narrator. The file may or
    /// may not exist.
    pub fn path_for(&self, narrator_id: u32, verse: VerseRef) -> PathBuf {
        self.root.join(cache_file_name(narrator_id, verse))
    }

    /// Checks whether a verse's audio is cached. Always re-queries the
    /// filesystem: the OS may reclaim cache storage at any time.
    pub fn exists(&self, narrator_id: u32, verse: VerseRef) -> bool {
        self.path_for(narrator_id, verse).exists()
    }

    /// Writes a verse's audio blob atomically.
    ///
    /// The bytes go to a temporary file in the cache root first and are
    /// moved into place with a rename, so a crash mid-write never leaves a
    /// partial file visible to `exists`.
    pub fn write(&self, narrator_id: u32, verse: VerseRef, bytes: &[u8]) -> CacheResult<()> {
        let dest = self.path_for(narrator_id, verse);

        // Temp file must live in the cache root so the rename stays on one
        // filesystem.
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(&dest).map_err(|e| CacheError::Persist {
            path: dest.clone(),
            reason: e.to_string(),
        })?;

        log::debug!("Cached {} ({} bytes)", dest.display(), bytes.len());
        Ok(())
    }

    /// Removes a single verse's cache entry. Missing entries are not an
    /// error.
    pub fn delete(&self, narrator_id: u32, verse: VerseRef) -> CacheResult<()> {
        let path = self.path_for(narrator_id, verse);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    /// A chapter is fully cached iff every one of its verses has an entry
    /// for the given narrator.
    pub fn is_chapter_cached(&self, narrator_id: u32, chapter: u16) -> bool {
        let Some(count) = verse_count(chapter) else {
            return false;
        };
        (1..=count).all(|v| {
            // Verse numbers in range are valid by construction of the table
            VerseRef::new(chapter, v)
                .map(|verse| self.exists(narrator_id, verse))
                .unwrap_or(false)
        })
    }

    /// Total size in bytes of all cached entries.
    pub fn total_size(&self) -> CacheResult<u64> {
        let mut total = 0u64;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if meta.is_file() {
                total += meta.len();
            }
        }
        Ok(total)
    }

    /// Removes the entire cache root and recreates it empty.
    pub fn clear(&self) -> CacheResult<()> {
        fs::remove_dir_all(&self.root)?;
        fs::create_dir_all(&self.root).map_err(|e| CacheError::CreateRoot {
            path: self.root.clone(),
            source: e,
        })?;
        log::info!("Cleared audio cache at {}", self.root.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn verse(chapter: u16, verse: u16) -> VerseRef {
        VerseRef::new(chapter, verse).unwrap()
    }

    #[test]
    fn test_new_creates_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("audio");
        assert!(!root.exists());
        let _cache = AudioCache::new(&root).unwrap();
        assert!(root.exists());
    }

    #[test]
    fn test_write_then_exists() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();

        assert!(!cache.exists(7, verse(1, 1)));
        cache.write(7, verse(1, 1), b"mp3 bytes").unwrap();
        assert!(cache.exists(7, verse(1, 1)));

        // Key is namespaced by narrator
        assert!(!cache.exists(1, verse(1, 1)));
    }

    #[test]
    fn test_filename_layout() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();
        cache.write(7, verse(2, 255), b"x").unwrap();
        assert!(dir.path().join("7_2_255.mp3").exists());
    }

    #[test]
    fn test_write_is_atomic_no_partial_on_disk() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();

        // Simulate a crash mid-write: a temp file left behind must never be
        // visible as a cache entry.
        let mut tmp = NamedTempFile::new_in(dir.path()).unwrap();
        tmp.write_all(b"trunc").unwrap();
        // tmp dropped without persist
        drop(tmp);

        assert!(!cache.exists(7, verse(1, 1)));
    }

    #[test]
    fn test_overwrite_wins_atomically() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();

        cache.write(7, verse(1, 1), b"first").unwrap();
        cache.write(7, verse(1, 1), b"second").unwrap();
        let bytes = fs::read(cache.path_for(7, verse(1, 1))).unwrap();
        assert_eq!(bytes, b"second");
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();

        cache.write(7, verse(1, 1), b"x").unwrap();
        cache.delete(7, verse(1, 1)).unwrap();
        assert!(!cache.exists(7, verse(1, 1)));
        // Second delete is a no-op
        cache.delete(7, verse(1, 1)).unwrap();
    }

    #[test]
    fn test_chapter_completeness() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();

        // Chapter 1 has 7 verses
        for v in 1..=7 {
            assert!(!cache.is_chapter_cached(7, 1));
            cache.write(7, verse(1, v), b"x").unwrap();
        }
        assert!(cache.is_chapter_cached(7, 1));

        // Deleting any single verse flips completeness back
        cache.delete(7, verse(1, 4)).unwrap();
        assert!(!cache.is_chapter_cached(7, 1));
    }

    #[test]
    fn test_chapter_completeness_invalid_chapter() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();
        assert!(!cache.is_chapter_cached(7, 0));
        assert!(!cache.is_chapter_cached(7, 115));
    }

    #[test]
    fn test_total_size() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();

        assert_eq!(cache.total_size().unwrap(), 0);
        cache.write(7, verse(1, 1), &[0u8; 100]).unwrap();
        cache.write(7, verse(1, 2), &[0u8; 50]).unwrap();
        assert_eq!(cache.total_size().unwrap(), 150);
    }

    #[test]
    fn test_clear_recreates_empty_root() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();

        cache.write(7, verse(1, 1), b"x").unwrap();
        cache.clear().unwrap();
        assert!(cache.root().exists());
        assert!(!cache.exists(7, verse(1, 1)));
        assert_eq!(cache.total_size().unwrap(), 0);
    }
}
