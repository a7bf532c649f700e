// crates/engine/src/engine.rs
//! The recitation engine control task
//!
//! All playback state lives on one tokio task. Callers hold an
//! [`EngineHandle`] and send commands over an unbounded channel; the task
//! publishes an [`EngineSnapshot`] on a watch channel whenever anything
//! observable changes. Remote fetches run on spawned tasks and report back
//! over an internal channel tagged with a load sequence number, so a result
//! that arrives after the user has already moved on is dropped instead of
//! hijacking the current track.

use crate::now_playing::{NowPlayingInfo, NowPlayingPublisher, TransportCommand};
use crate::pipeline::{AudioPipeline, MediaSource, PipelineEvent};
use crate::queue::{PlaybackQueue, TrackDecision};
use crate::state::{EngineSnapshot, PlaybackState};
use crate::timing::{word_index_at, TimingStore};
use murattal_cache::AudioCache;
use murattal_core::{
    audio_url, verse_count, ChapterNames, Narrator, PlaybackSpeed, RepeatTarget, TimingTable,
    VerseRef,
};
use murattal_network::{fetch_word_timings, Client, NetworkError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;

/// How long into a track "previous" means restart instead of retreat.
const PREVIOUS_RESTART_THRESHOLD: f64 = 3.0;

/// Engine tuning and initial session settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Progress and highlight refresh interval
    pub tick_interval: Duration,
    pub speed: PlaybackSpeed,
    pub repeat: RepeatTarget,
    pub narrator: Narrator,
}

impl EngineConfig {
    pub fn new(narrator: Narrator) -> Self {
        Self {
            tick_interval: Duration::from_millis(50),
            speed: PlaybackSpeed::NORMAL,
            repeat: RepeatTarget::default(),
            narrator,
        }
    }
}

#[derive(Debug)]
enum EngineCommand {
    PlayVerse(VerseRef),
    PlayChapter { chapter: u16, from: u16 },
    PlayRange { chapter: u16, from: u16, to: u16 },
    Pause,
    Resume,
    TogglePlayPause,
    Stop,
    PlayNext,
    PlayPrevious,
    Seek(f64),
    SetSpeed(PlaybackSpeed),
    SetRepeat(RepeatTarget),
    SetNarrator(Narrator),
    Shutdown,
}

/// Results of background fetches, tagged for staleness checks
enum FetchResult {
    Audio {
        verse: VerseRef,
        narrator_id: u32,
        seq: u32,
        result: Result<Vec<u8>, NetworkError>,
    },
    Timings {
        verse: VerseRef,
        narrator_id: u32,
        table: TimingTable,
    },
}

/// Spawns the engine control task.
pub struct RecitationEngine;

impl RecitationEngine {
    /// Starts the engine on the current tokio runtime and returns its
    /// handle. The pipeline factory receives the event sender the pipeline
    /// must report through.
    pub fn spawn<F>(
        config: EngineConfig,
        cache: AudioCache,
        client: Client,
        chapter_names: Arc<dyn ChapterNames>,
        publisher: Arc<dyn NowPlayingPublisher>,
        pipeline_factory: F,
    ) -> EngineHandle
    where
        F: FnOnce(UnboundedSender<PipelineEvent>) -> Box<dyn AudioPipeline> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = unbounded_channel();

        let mut initial = EngineSnapshot::idle(config.narrator.id);
        initial.speed = config.speed;
        initial.repeat = config.repeat;
        let (watch_tx, watch_rx) = watch::channel(initial.clone());

        tokio::spawn(async move {
            let (event_tx, event_rx) = unbounded_channel();
            let (internal_tx, internal_rx) = unbounded_channel();
            let pipeline = pipeline_factory(event_tx);
            let actor = Actor::new(config, cache, client, chapter_names, publisher, pipeline,
                watch_tx, initial, internal_tx);
            actor.run(cmd_rx, event_rx, internal_rx).await;
        });

        EngineHandle {
            commands: cmd_tx,
            snapshot: watch_rx,
        }
    }
}

struct Actor {
    config: EngineConfig,
    cache: AudioCache,
    client: Client,
    chapter_names: Arc<dyn ChapterNames>,
    publisher: Arc<dyn NowPlayingPublisher>,
    pipeline: Box<dyn AudioPipeline>,
    watch: watch::Sender<EngineSnapshot>,
    snapshot: EngineSnapshot,

    narrator: Narrator,
    speed: PlaybackSpeed,
    repeat: RepeatTarget,
    queue: Option<PlaybackQueue>,
    timings: TimingStore,

    /// Monotonic load counter; stamps in-flight fetches
    load_seq: u32,
    /// The load we are waiting on, if any
    pending_load: Option<(VerseRef, u32)>,

    internal_tx: UnboundedSender<FetchResult>,
}

impl Actor {
    #[allow(clippy::too_many_arguments)]
    fn new(
        config: EngineConfig,
        cache: AudioCache,
        client: Client,
        chapter_names: Arc<dyn ChapterNames>,
        publisher: Arc<dyn NowPlayingPublisher>,
        pipeline: Box<dyn AudioPipeline>,
        watch: watch::Sender<EngineSnapshot>,
        snapshot: EngineSnapshot,
        internal_tx: UnboundedSender<FetchResult>,
    ) -> Self {
        let narrator = config.narrator.clone();
        let speed = config.speed;
        let repeat = config.repeat;
        Self {
            config,
            cache,
            client,
            chapter_names,
            publisher,
            pipeline,
            watch,
            snapshot,
            narrator,
            speed,
            repeat,
            queue: None,
            timings: TimingStore::new(),
            load_seq: 0,
            pending_load: None,
            internal_tx,
        }
    }

    async fn run(
        mut self,
        mut commands: UnboundedReceiver<EngineCommand>,
        mut events: UnboundedReceiver<PipelineEvent>,
        mut internal: UnboundedReceiver<FetchResult>,
    ) {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(EngineCommand::Shutdown) | None => break,
                        Some(command) => self.handle_command(command),
                    }
                }
                Some(event) = events.recv() => self.handle_pipeline_event(event),
                Some(result) = internal.recv() => self.handle_fetch_result(result),
                _ = ticker.tick() => self.tick(),
            }
            self.publish();
        }

        self.pipeline.stop();
        self.publisher.clear();
        log::debug!("Engine control task exiting");
    }

    fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::PlayVerse(verse) => {
                self.start_queue(PlaybackQueue::single(verse, self.repeat));
            }
            EngineCommand::PlayChapter { chapter, from } => {
                let Some(count) = verse_count(chapter) else {
                    self.snapshot.state =
                        PlaybackState::Error(format!("Chapter {} does not exist", chapter));
                    return;
                };
                match PlaybackQueue::range(chapter, from, count, self.repeat) {
                    Ok(queue) => self.start_queue(queue),
                    Err(e) => self.snapshot.state = PlaybackState::Error(e.to_string()),
                }
            }
            EngineCommand::PlayRange { chapter, from, to } => {
                match PlaybackQueue::range(chapter, from, to, self.repeat) {
                    Ok(queue) => self.start_queue(queue),
                    Err(e) => self.snapshot.state = PlaybackState::Error(e.to_string()),
                }
            }
            EngineCommand::Pause => self.pause(),
            EngineCommand::Resume => self.resume(),
            EngineCommand::TogglePlayPause => {
                if self.snapshot.state.is_playing() {
                    self.pause();
                } else if self.snapshot.state.is_paused() {
                    self.resume();
                }
            }
            EngineCommand::Stop => self.stop_playback(),
            EngineCommand::PlayNext => {
                let next = self.queue.as_mut().and_then(|q| q.advance());
                match next {
                    Some(verse) => self.load_current(verse),
                    None => self.stop_playback(),
                }
            }
            EngineCommand::PlayPrevious => self.play_previous(),
            EngineCommand::Seek(seconds) => {
                if self.snapshot.state.is_playing() || self.snapshot.state.is_paused() {
                    let max = self.pipeline.duration().unwrap_or(f64::MAX);
                    let target = seconds.clamp(0.0, max);
                    self.pipeline.seek(target);
                    self.snapshot.elapsed = target;
                }
            }
            EngineCommand::SetSpeed(speed) => {
                self.speed = speed;
                self.snapshot.speed = speed;
                if self.snapshot.state.is_active() {
                    self.pipeline.set_rate(speed.value());
                }
                if self.snapshot.state.is_playing() {
                    self.publish_now_playing();
                }
            }
            EngineCommand::SetRepeat(repeat) => {
                self.repeat = repeat;
                self.snapshot.repeat = repeat;
                if let Some(queue) = &mut self.queue {
                    queue.set_repeat_target(repeat);
                }
            }
            EngineCommand::SetNarrator(narrator) => {
                if narrator.id == self.narrator.id {
                    return;
                }
                // A narrator switch invalidates the loaded audio and every
                // timing table.
                if self.snapshot.state.is_active() {
                    self.stop_playback();
                }
                self.timings.clear();
                log::info!("Narrator switched to {} (id {})", narrator.name, narrator.id);
                self.snapshot.narrator_id = narrator.id;
                self.narrator = narrator;
            }
            EngineCommand::Shutdown => {}
        }
    }

    fn handle_pipeline_event(&mut self, event: PipelineEvent) {
        // A replaced worker may have queued events before it was shut
        // down; anything from an older load generation is not about the
        // current track.
        if event.generation() != self.load_seq {
            log::debug!(
                "Dropping stale pipeline event from generation {}",
                event.generation()
            );
            return;
        }
        match event {
            PipelineEvent::Ready { duration, .. } => {
                if self.pending_load.is_none() {
                    return;
                }
                self.pending_load = None;
                self.snapshot.duration = duration;
                self.pipeline.set_rate(self.speed.value());
                self.pipeline.play();
                self.snapshot.state = PlaybackState::Playing;
                self.publish_now_playing();
            }
            PipelineEvent::Failed { reason, .. } => {
                log::error!("Pipeline failure: {}", reason);
                self.pending_load = None;
                self.pipeline.stop();
                self.queue = None;
                self.snapshot.state = PlaybackState::Error(reason);
                self.publisher.clear();
            }
            PipelineEvent::EndOfTrack { .. } => {
                let Some(queue) = &mut self.queue else {
                    return;
                };
                match queue.finish_track() {
                    TrackDecision::RepeatCurrent => {
                        self.pipeline.seek(0.0);
                        self.snapshot.elapsed = 0.0;
                        self.pipeline.play();
                    }
                    TrackDecision::Advance(verse) => self.load_current(verse),
                    TrackDecision::Finished => self.stop_playback(),
                }
            }
        }
    }

    fn handle_fetch_result(&mut self, result: FetchResult) {
        match result {
            FetchResult::Audio {
                verse,
                narrator_id,
                seq,
                result,
            } => {
                // Stale guard: another load or a narrator switch happened
                // while this fetch was in flight.
                if self.pending_load != Some((verse, seq)) || narrator_id != self.narrator.id {
                    log::debug!("Dropping stale audio fetch for {}", verse);
                    return;
                }
                match result {
                    Ok(bytes) => {
                        let cache = self.cache.clone();
                        let blob = bytes.clone();
                        tokio::task::spawn_blocking(move || {
                            if let Err(e) = cache.write(narrator_id, verse, &blob) {
                                log::warn!("Failed to cache {}: {}", verse, e);
                            }
                        });
                        self.load_into_pipeline(MediaSource::Memory(bytes));
                    }
                    Err(e) => {
                        self.pending_load = None;
                        self.queue = None;
                        self.snapshot.state =
                            PlaybackState::Error(format!("Failed to fetch {}: {}", verse, e));
                        self.publisher.clear();
                    }
                }
            }
            FetchResult::Timings {
                verse,
                narrator_id,
                table,
            } => {
                if narrator_id != self.narrator.id {
                    return;
                }
                self.timings.insert(verse, table);
            }
        }
    }

    /// Progress and word-highlight refresh.
    fn tick(&mut self) {
        if !self.snapshot.state.is_playing() {
            return;
        }
        self.snapshot.elapsed = self.pipeline.position();
        if self.snapshot.duration.is_none() {
            self.snapshot.duration = self.pipeline.duration();
        }
        if let Some(verse) = self.snapshot.current {
            if let Some(table) = self.timings.get(verse) {
                // Outside every interval the previous highlight stands.
                if let Some(index) = word_index_at(table, self.snapshot.elapsed) {
                    self.snapshot.highlighted_word = Some(index);
                }
            }
        }
    }

    fn start_queue(&mut self, queue: PlaybackQueue) {
        let Some(verse) = queue.current() else {
            self.snapshot.state = PlaybackState::Error("Empty playback queue".to_string());
            return;
        };
        self.queue = Some(queue);
        self.load_current(verse);
    }

    /// Begins loading a verse: track-local state resets, the timing table
    /// fetch kicks off, and audio comes from cache or the network.
    fn load_current(&mut self, verse: VerseRef) {
        self.load_seq += 1;
        self.pending_load = Some((verse, self.load_seq));

        self.snapshot.state = PlaybackState::Loading;
        self.snapshot.current = Some(verse);
        self.snapshot.elapsed = 0.0;
        self.snapshot.duration = None;
        self.snapshot.highlighted_word = None;

        self.request_timings(verse);

        if self.cache.exists(self.narrator.id, verse) {
            let path = self.cache.path_for(self.narrator.id, verse);
            self.load_into_pipeline(MediaSource::File(path));
        } else {
            let url = audio_url(&self.narrator, verse);
            let client = self.client.clone();
            let tx = self.internal_tx.clone();
            let narrator_id = self.narrator.id;
            let seq = self.load_seq;
            tokio::spawn(async move {
                let result = client.fetch_bytes(&url).await;
                let _ = tx.send(FetchResult::Audio {
                    verse,
                    narrator_id,
                    seq,
                    result,
                });
            });
        }
    }

    fn load_into_pipeline(&mut self, source: MediaSource) {
        if let Err(e) = self.pipeline.load(source, self.load_seq) {
            self.pending_load = None;
            self.queue = None;
            self.snapshot.state = PlaybackState::Error(e.to_string());
            self.publisher.clear();
        }
    }

    /// Fetches the word-timing table for a verse unless it is already in
    /// the store or the narrator has no timing id. Fetch failures degrade
    /// to an empty table; playback never waits on timings.
    fn request_timings(&mut self, verse: VerseRef) {
        let Some(recitation_id) = self.narrator.timing_recitation_id else {
            return;
        };
        if self.timings.contains(verse) {
            return;
        }
        let client = self.client.clone();
        let tx = self.internal_tx.clone();
        let narrator_id = self.narrator.id;
        tokio::spawn(async move {
            let table = match fetch_word_timings(&client, recitation_id, verse).await {
                Ok(table) => table,
                Err(e) => {
                    log::debug!("Timing fetch for {} failed: {}", verse, e);
                    Vec::new()
                }
            };
            let _ = tx.send(FetchResult::Timings {
                verse,
                narrator_id,
                table,
            });
        });
    }

    fn pause(&mut self) {
        if !self.snapshot.state.is_playing() {
            return;
        }
        self.pipeline.pause();
        self.snapshot.state = PlaybackState::Paused;
        self.publish_now_playing();
    }

    fn resume(&mut self) {
        if !self.snapshot.state.is_paused() {
            return;
        }
        self.pipeline.play();
        self.snapshot.state = PlaybackState::Playing;
        self.publish_now_playing();
    }

    /// Restarts the current track when more than a few seconds in (or at
    /// the head of the queue); otherwise retreats to the previous verse.
    fn play_previous(&mut self) {
        if !self.snapshot.state.is_active() {
            return;
        }
        if self.pipeline.position() > PREVIOUS_RESTART_THRESHOLD {
            self.pipeline.seek(0.0);
            self.snapshot.elapsed = 0.0;
            return;
        }
        // Within the threshold at the queue head, nothing to go back to.
        if let Some(verse) = self.queue.as_mut().and_then(|q| q.retreat()) {
            self.load_current(verse);
        }
    }

    fn stop_playback(&mut self) {
        self.pipeline.stop();
        self.queue = None;
        self.pending_load = None;
        self.snapshot.state = PlaybackState::Idle;
        self.snapshot.current = None;
        self.snapshot.elapsed = 0.0;
        self.snapshot.duration = None;
        self.snapshot.highlighted_word = None;
        self.publisher.clear();
    }

    fn publish_now_playing(&self) {
        let Some(verse) = self.snapshot.current else {
            return;
        };
        let mut info = NowPlayingInfo::new(
            verse,
            self.chapter_names.name(verse.chapter()),
            &self.narrator,
        );
        info.rate = if self.snapshot.state.is_playing() {
            self.speed.value()
        } else {
            0.0
        };
        info.elapsed = self.snapshot.elapsed;
        info.duration = self.snapshot.duration;
        self.publisher.publish(&info);
    }

    fn publish(&self) {
        self.watch.send_if_modified(|current| {
            if *current != self.snapshot {
                *current = self.snapshot.clone();
                true
            } else {
                false
            }
        });
    }
}

/// Cloneable handle to a running engine
///
/// Command methods return `false` when the engine has shut down.
#[derive(Clone)]
pub struct EngineHandle {
    commands: UnboundedSender<EngineCommand>,
    snapshot: watch::Receiver<EngineSnapshot>,
}

impl EngineHandle {
    fn send(&self, command: EngineCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn play_verse(&self, verse: VerseRef) -> bool {
        self.send(EngineCommand::PlayVerse(verse))
    }

    /// Plays a whole chapter from its first verse.
    pub fn play_chapter(&self, chapter: u16) -> bool {
        self.send(EngineCommand::PlayChapter { chapter, from: 1 })
    }

    pub fn play_chapter_from(&self, chapter: u16, from: u16) -> bool {
        self.send(EngineCommand::PlayChapter { chapter, from })
    }

    /// Plays an inclusive verse range within one chapter.
    pub fn play_range(&self, chapter: u16, from: u16, to: u16) -> bool {
        self.send(EngineCommand::PlayRange { chapter, from, to })
    }

    pub fn pause(&self) -> bool {
        self.send(EngineCommand::Pause)
    }

    pub fn resume(&self) -> bool {
        self.send(EngineCommand::Resume)
    }

    pub fn toggle_play_pause(&self) -> bool {
        self.send(EngineCommand::TogglePlayPause)
    }

    pub fn stop(&self) -> bool {
        self.send(EngineCommand::Stop)
    }

    pub fn play_next(&self) -> bool {
        self.send(EngineCommand::PlayNext)
    }

    pub fn play_previous(&self) -> bool {
        self.send(EngineCommand::PlayPrevious)
    }

    pub fn seek(&self, seconds: f64) -> bool {
        self.send(EngineCommand::Seek(seconds))
    }

    pub fn set_speed(&self, speed: PlaybackSpeed) -> bool {
        self.send(EngineCommand::SetSpeed(speed))
    }

    pub fn set_repeat(&self, repeat: RepeatTarget) -> bool {
        self.send(EngineCommand::SetRepeat(repeat))
    }

    pub fn set_narrator(&self, narrator: Narrator) -> bool {
        self.send(EngineCommand::SetNarrator(narrator))
    }

    pub fn shutdown(&self) -> bool {
        self.send(EngineCommand::Shutdown)
    }

    /// Translates a platform transport action into an engine command.
    pub fn handle_transport(&self, command: TransportCommand) -> bool {
        match command {
            TransportCommand::Play => self.resume(),
            TransportCommand::Pause => self.pause(),
            TransportCommand::NextTrack => self.play_next(),
            TransportCommand::PreviousTrack => self.play_previous(),
        }
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A watch receiver for following state changes.
    pub fn watch(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshot.clone()
    }
}
