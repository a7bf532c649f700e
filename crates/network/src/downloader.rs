// crates/network/src/downloader.rs
//! Whole-chapter audio prefetch
//!
//! One background job per chapter, at most. A job fans out one fetch per
//! missing verse, bounded by a semaphore, and counts every unit of work
//! toward aggregate progress — including verses that were already cached,
//! so a resumed download reports the correct fraction from the start.
//!
//! A failed verse fetch is logged and dropped: the verse stays absent and
//! the next `start_download` call for the chapter will pick it up again.
//! Partial success is a normal outcome. Whether a chapter is actually
//! complete is always answered by the cache, never by progress numbers.

use crate::client::Client;
use murattal_cache::AudioCache;
use murattal_core::{audio_url, verse_count, Narrator, VerseRef};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Aggregate download progress for one chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterProgress {
    /// Units of work finished (fetched, failed, or already cached)
    pub completed: u32,
    /// Total verses in the chapter
    pub total: u32,
}

impl ChapterProgress {
    /// Progress as a fraction in [0, 1]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.completed as f64 / self.total as f64).min(1.0)
        }
    }
}

/// Callback invoked after every unit of completed work
pub type ProgressCallback = Arc<dyn Fn(u16, ChapterProgress) + Send + Sync>;

/// Prefetch configuration
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Maximum in-flight verse fetches per chapter job
    pub max_concurrent: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

/// Background downloader of whole-chapter audio
pub struct ChapterDownloader {
    client: Client,
    cache: AudioCache,
    config: DownloaderConfig,
    /// Cancellation flags of active jobs, keyed by chapter
    jobs: Arc<Mutex<HashMap<u16, Arc<AtomicBool>>>>,
    progress: Arc<Mutex<HashMap<u16, ChapterProgress>>>,
    on_progress: Option<ProgressCallback>,
}

impl ChapterDownloader {
    pub fn new(client: Client, cache: AudioCache, config: DownloaderConfig) -> Self {
        Self {
            client,
            cache,
            config,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            progress: Arc::new(Mutex::new(HashMap::new())),
            on_progress: None,
        }
    }

    /// Registers a callback fired after every unit of completion.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Starts downloading every missing verse of a chapter.
    ///
    /// Idempotent: a no-op when the chapter is already fully cached or a
    /// job for it is already active.
    pub fn start_download(&self, chapter: u16, narrator: &Narrator) {
        let Some(total) = verse_count(chapter) else {
            log::warn!("Ignoring download request for invalid chapter {}", chapter);
            return;
        };
        if self.cache.is_chapter_cached(narrator.id, chapter) {
            log::debug!("Chapter {} already fully cached, nothing to do", chapter);
            return;
        }

        let cancel = Arc::new(AtomicBool::new(false));
        {
            let mut jobs = lock(&self.jobs);
            if jobs.contains_key(&chapter) {
                log::debug!("Download for chapter {} already active", chapter);
                return;
            }
            jobs.insert(chapter, Arc::clone(&cancel));
        }

        let total = total as u32;
        lock(&self.progress).insert(
            chapter,
            ChapterProgress {
                completed: 0,
                total,
            },
        );

        // Resolve every verse's URL up front; the job only moves bytes.
        let items: Vec<(VerseRef, String)> = (1..=total as u16)
            .filter_map(|v| VerseRef::new(chapter, v).ok())
            .map(|verse| (verse, audio_url(narrator, verse)))
            .collect();

        let client = self.client.clone();
        let cache = self.cache.clone();
        let jobs = Arc::clone(&self.jobs);
        let progress = Arc::clone(&self.progress);
        let callback = self.on_progress.clone();
        let narrator_id = narrator.id;
        let max_concurrent = self.config.max_concurrent;

        tokio::spawn(async move {
            let completed = Arc::new(AtomicU32::new(0));
            let semaphore = Arc::new(Semaphore::new(max_concurrent));
            let mut tasks = JoinSet::new();

            for (verse, url) in items {
                // Cooperative cancellation: checked before each unit of
                // work; verses already in flight are allowed to finish.
                if cancel.load(Ordering::Relaxed) {
                    break;
                }

                // Already cached verses count immediately, otherwise a
                // resumed download would start from a wrong fraction.
                if cache.exists(narrator_id, verse) {
                    bump(chapter, total, &completed, &progress, &callback);
                    continue;
                }

                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };
                let client = client.clone();
                let cache = cache.clone();
                let completed = Arc::clone(&completed);
                let progress = Arc::clone(&progress);
                let callback = callback.clone();

                tasks.spawn(async move {
                    let _permit = permit;
                    match client.fetch_bytes(&url).await {
                        Ok(bytes) => {
                            if let Err(e) = cache.write(narrator_id, verse, &bytes) {
                                log::warn!("Cache write for verse {} failed: {}", verse, e);
                            }
                        }
                        Err(e) => {
                            // Dropped at verse granularity; the batch goes on
                            log::warn!("Fetch of verse {} failed: {}", verse, e);
                        }
                    }
                    bump(chapter, total, &completed, &progress, &callback);
                });
            }

            while tasks.join_next().await.is_some() {}

            lock(&jobs).remove(&chapter);
            if cancel.load(Ordering::Relaxed) {
                lock(&progress).remove(&chapter);
                log::info!("Download of chapter {} cancelled", chapter);
            } else {
                log::info!(
                    "Download of chapter {} finished ({}/{} units)",
                    chapter,
                    completed.load(Ordering::Relaxed),
                    total
                );
            }
        });
    }

    /// Requests cancellation of a chapter's download.
    ///
    /// In-flight verse fetches complete and write through; no further
    /// verses are dispatched.
    pub fn cancel_download(&self, chapter: u16) {
        if let Some(flag) = lock(&self.jobs).get(&chapter) {
            flag.store(true, Ordering::Relaxed);
        }
    }

    /// Removes every verse cache entry of a chapter, unconditionally.
    pub fn delete_chapter(&self, chapter: u16, narrator_id: u32) {
        let Some(count) = verse_count(chapter) else {
            return;
        };
        for v in 1..=count {
            if let Ok(verse) = VerseRef::new(chapter, v) {
                if let Err(e) = self.cache.delete(narrator_id, verse) {
                    log::warn!("Failed to delete cache entry {}: {}", verse, e);
                }
            }
        }
        lock(&self.progress).remove(&chapter);
    }

    /// Whether a download job is currently active for the chapter.
    pub fn is_downloading(&self, chapter: u16) -> bool {
        lock(&self.jobs).contains_key(&chapter)
    }

    /// Latest aggregate progress for the chapter, if a job ran.
    pub fn progress(&self, chapter: u16) -> Option<ChapterProgress> {
        lock(&self.progress).get(&chapter).copied()
    }

    /// Whether every verse of the chapter is cached (asks the filesystem).
    pub fn is_chapter_downloaded(&self, chapter: u16, narrator_id: u32) -> bool {
        self.cache.is_chapter_cached(narrator_id, chapter)
    }

    /// Waits until no job is active for the chapter.
    pub async fn wait_until_finished(&self, chapter: u16) {
        while self.is_downloading(chapter) {
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        }
    }
}

fn bump(
    chapter: u16,
    total: u32,
    completed: &AtomicU32,
    progress: &Mutex<HashMap<u16, ChapterProgress>>,
    callback: &Option<ProgressCallback>,
) {
    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
    let snapshot = ChapterProgress {
        completed: done,
        total,
    };
    lock(progress).insert(chapter, snapshot);
    if let Some(cb) = callback {
        cb(chapter, snapshot);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use std::time::Duration;
    use tempfile::tempdir;

    fn unreachable_narrator() -> Narrator {
        // Reserved discard port: connections are refused immediately
        Narrator {
            id: 7,
            name: "Test".to_string(),
            native_name: String::new(),
            style: String::new(),
            audio_base_url: "http://127.0.0.1:9/".to_string(),
            timing_recitation_id: None,
        }
    }

    fn fast_client() -> Client {
        Client::with_config(ClientConfig {
            timeout: Duration::from_secs(2),
            retry_policy: None,
            ..Default::default()
        })
        .unwrap()
    }

    fn fill_chapter(cache: &AudioCache, narrator_id: u32, chapter: u16) {
        for v in 1..=verse_count(chapter).unwrap() {
            cache
                .write(narrator_id, VerseRef::new(chapter, v).unwrap(), b"x")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_fully_cached_chapter_is_noop() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();
        fill_chapter(&cache, 7, 114);

        let downloader =
            ChapterDownloader::new(fast_client(), cache, DownloaderConfig::default());
        downloader.start_download(114, &unreachable_narrator());

        assert!(!downloader.is_downloading(114));
        assert!(downloader.progress(114).is_none());
        assert!(downloader.is_chapter_downloaded(114, 7));
    }

    #[tokio::test]
    async fn test_duplicate_start_is_single_job() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();
        let downloader =
            ChapterDownloader::new(fast_client(), cache, DownloaderConfig::default());
        let narrator = unreachable_narrator();

        downloader.start_download(114, &narrator);
        downloader.start_download(114, &narrator);
        assert!(lock(&downloader.jobs).len() <= 1);

        downloader.wait_until_finished(114).await;
        assert!(lock(&downloader.jobs).is_empty());
    }

    #[tokio::test]
    async fn test_progress_counts_cached_and_failed_units() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();
        // Pre-cache 3 of chapter 114's 6 verses
        for v in [1u16, 2, 3] {
            cache
                .write(7, VerseRef::new(114, v).unwrap(), b"x")
                .unwrap();
        }

        let downloader =
            ChapterDownloader::new(fast_client(), cache, DownloaderConfig::default());
        downloader.start_download(114, &unreachable_narrator());
        downloader.wait_until_finished(114).await;

        // Every unit was accounted for, but the chapter is still incomplete
        // because the remaining fetches failed.
        let progress = downloader.progress(114).unwrap();
        assert_eq!(progress.completed, 6);
        assert_eq!(progress.total, 6);
        assert!((progress.fraction() - 1.0).abs() < f64::EPSILON);
        assert!(!downloader.is_chapter_downloaded(114, 7));
    }

    #[tokio::test]
    async fn test_progress_callback_is_monotonic() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();
        for v in [1u16, 2] {
            cache
                .write(7, VerseRef::new(114, v).unwrap(), b"x")
                .unwrap();
        }

        let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let downloader =
            ChapterDownloader::new(fast_client(), cache, DownloaderConfig::default())
                .with_progress_callback(Arc::new(move |_, p| {
                    seen_clone.lock().unwrap().push(p.completed);
                }));

        downloader.start_download(114, &unreachable_narrator());
        downloader.wait_until_finished(114).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 6);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*seen.last().unwrap(), 6);
    }

    #[tokio::test]
    async fn test_cancel_clears_progress() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();
        let downloader =
            ChapterDownloader::new(fast_client(), cache, DownloaderConfig::default());
        let narrator = unreachable_narrator();

        // Chapter 2 has 286 verses; cancellation lands mid-batch
        downloader.start_download(2, &narrator);
        downloader.cancel_download(2);
        downloader.wait_until_finished(2).await;

        assert!(downloader.progress(2).is_none());
        assert!(!downloader.is_chapter_downloaded(2, narrator.id));
    }

    #[tokio::test]
    async fn test_delete_chapter_removes_entries() {
        let dir = tempdir().unwrap();
        let cache = AudioCache::new(dir.path()).unwrap();
        fill_chapter(&cache, 7, 114);

        let downloader =
            ChapterDownloader::new(fast_client(), cache.clone(), DownloaderConfig::default());
        assert!(downloader.is_chapter_downloaded(114, 7));

        downloader.delete_chapter(114, 7);
        assert!(!downloader.is_chapter_downloaded(114, 7));
        assert_eq!(cache.total_size().unwrap(), 0);
    }
}
