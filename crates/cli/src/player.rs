// FILE: crates/cli/src/player.rs
//! Interactive terminal player
//!
//! Spawns the recitation engine with the real audio pipeline and renders
//! its snapshot stream until playback finishes or the user quits.

use crate::commands;
use anyhow::{Context, Result};
use clap::ArgMatches;
use console::{style, Key, Term};
use murattal_config::Config;
use murattal_core::{verse_count, DefaultChapterNames, PlaybackSpeed, RepeatTarget, VerseRef};
use recitation_engine::{
    EngineConfig, EngineHandle, EngineSnapshot, LogPublisher, PlaybackState, RecitationEngine,
    SymphoniaPipeline,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const SEEK_STEP: f64 = 5.0;
const SPEED_STEP: f32 = 0.1;

pub async fn play(config: &Config, matches: &ArgMatches) -> Result<()> {
    let chapter = commands::parse_chapter(matches)?;
    let narrator = commands::resolve_narrator(config, matches)?;
    let cache = commands::open_cache(config)?;
    let client = commands::build_client(config)?;

    let speed = match matches.get_one::<String>("speed") {
        Some(raw) => {
            let value: f32 = raw
                .parse()
                .with_context(|| format!("Invalid speed: {}", raw))?;
            PlaybackSpeed::new(value).map_err(|e| anyhow::anyhow!(e))?
        }
        None => PlaybackSpeed::new(config.player.speed).unwrap_or(PlaybackSpeed::NORMAL),
    };

    let repeat = match matches.get_one::<String>("repeat") {
        Some(raw) => {
            let n: u32 = raw
                .parse()
                .with_context(|| format!("Invalid repeat count: {}", raw))?;
            if n == 0 {
                RepeatTarget::Infinite
            } else {
                RepeatTarget::count(n)
            }
        }
        None if config.player.repeat == 0 => RepeatTarget::Infinite,
        None => RepeatTarget::count(config.player.repeat),
    };

    let mut engine_config = EngineConfig::new(narrator.clone());
    engine_config.speed = speed;
    engine_config.repeat = repeat;
    engine_config.tick_interval = Duration::from_millis(config.player.tick_ms);

    let handle = RecitationEngine::spawn(
        engine_config,
        cache,
        client,
        Arc::new(DefaultChapterNames),
        Arc::new(LogPublisher),
        |events| Box::new(SymphoniaPipeline::new(events)),
    );

    dispatch_play_intent(&handle, chapter, matches)?;
    run_player_ui(handle).await
}

fn dispatch_play_intent(handle: &EngineHandle, chapter: u16, matches: &ArgMatches) -> Result<()> {
    if let Some(raw) = matches.get_one::<String>("verse") {
        let verse_no: u16 = raw
            .parse()
            .with_context(|| format!("Invalid verse number: {}", raw))?;
        let verse = VerseRef::new(chapter, verse_no)?;
        handle.play_verse(verse);
        return Ok(());
    }

    let from = match matches.get_one::<String>("from") {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid verse number: {}", raw))?,
        None => 1,
    };
    let to = match matches.get_one::<String>("to") {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid verse number: {}", raw))?,
        // Chapter validity was checked by parse_chapter.
        None => verse_count(chapter).unwrap_or(1),
    };
    handle.play_range(chapter, from, to);
    Ok(())
}

async fn run_player_ui(handle: EngineHandle) -> Result<()> {
    let term = Term::stdout();
    let _ = term.hide_cursor();

    // Key reads block, so they live on their own thread.
    let (key_tx, mut key_rx) = mpsc::unbounded_channel();
    let key_term = Term::stdout();
    std::thread::spawn(move || loop {
        match key_term.read_key() {
            Ok(key) => {
                if key_tx.send(key).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });

    let mut watch = handle.watch();
    let mut redraw = tokio::time::interval(Duration::from_millis(200));
    let mut seen_active = false;
    let result = loop {
        let snapshot = handle.snapshot();
        if snapshot.state.is_active() {
            seen_active = true;
        }
        match &snapshot.state {
            PlaybackState::Error(reason) => {
                break Err(anyhow::anyhow!("Playback failed: {}", reason));
            }
            PlaybackState::Idle if seen_active => break Ok(()),
            _ => {}
        }
        draw_ui(&term, &snapshot)?;

        tokio::select! {
            _ = watch.changed() => {}
            _ = redraw.tick() => {}
            key = key_rx.recv() => {
                let Some(key) = key else { break Ok(()) };
                if handle_key(&handle, &snapshot, key) {
                    handle.stop();
                    break Ok(());
                }
            }
        }
    };

    handle.shutdown();
    let _ = term.show_cursor();
    let _ = term.clear_screen();
    result
}

/// Returns true when the user asked to quit.
fn handle_key(handle: &EngineHandle, snapshot: &EngineSnapshot, key: Key) -> bool {
    match key {
        Key::Char(' ') => {
            handle.toggle_play_pause();
        }
        Key::Char('n') => {
            handle.play_next();
        }
        Key::Char('p') => {
            handle.play_previous();
        }
        Key::ArrowLeft => {
            handle.seek((snapshot.elapsed - SEEK_STEP).max(0.0));
        }
        Key::ArrowRight => {
            handle.seek(snapshot.elapsed + SEEK_STEP);
        }
        Key::Char('[') => {
            if let Ok(speed) = PlaybackSpeed::new(snapshot.speed.value() - SPEED_STEP) {
                handle.set_speed(speed);
            }
        }
        Key::Char(']') => {
            if let Ok(speed) = PlaybackSpeed::new(snapshot.speed.value() + SPEED_STEP) {
                handle.set_speed(speed);
            }
        }
        Key::Char('q') | Key::Escape => return true,
        _ => {}
    }
    false
}

fn draw_ui(term: &Term, snapshot: &EngineSnapshot) -> Result<()> {
    term.clear_screen().context("Failed to clear screen")?;

    let title = match snapshot.current {
        Some(verse) => format!("Surah {} — Verse {}", verse.chapter(), verse.verse()),
        None => "Loading...".to_string(),
    };
    term.write_line(&format!("\n  {}", style(&title).bold().cyan()))?;

    let state_label = match &snapshot.state {
        PlaybackState::Playing => style("Playing").green(),
        PlaybackState::Paused => style("Paused").yellow(),
        PlaybackState::Loading => style("Loading").dim(),
        PlaybackState::Idle => style("Idle").dim(),
        PlaybackState::Error(_) => style("Error").red(),
    };
    term.write_line(&format!(
        "  {}  speed {}  repeat {}",
        state_label, snapshot.speed, snapshot.repeat
    ))?;
    term.write_line("")?;

    let duration = snapshot.duration.unwrap_or(0.0);
    term.write_line(&format!(
        "  {} / {}",
        fmt_time(snapshot.elapsed),
        fmt_time(duration)
    ))?;

    let bar_width = 50usize;
    let filled = ((snapshot.progress() * bar_width as f64) as usize).min(bar_width);
    term.write_line(&format!(
        "  [{}{}]",
        "=".repeat(filled),
        " ".repeat(bar_width - filled)
    ))?;

    if let Some(word) = snapshot.highlighted_word {
        term.write_line(&format!("  word {}", word + 1))?;
    }

    term.write_line("")?;
    term.write_line(&format!(
        "  {}",
        style("space pause/resume · n/p verse · ←/→ seek · [/] speed · q quit").dim()
    ))?;
    Ok(())
}

fn fmt_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_time() {
        assert_eq!(fmt_time(0.0), "0:00");
        assert_eq!(fmt_time(65.4), "1:05");
        assert_eq!(fmt_time(-3.0), "0:00");
        assert_eq!(fmt_time(600.0), "10:00");
    }
}
