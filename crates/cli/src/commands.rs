// FILE: crates/cli/src/commands.rs

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use murattal_cache::AudioCache;
use murattal_config::{Config, ConfigManager};
use murattal_core::{verse_count, Narrator};
use murattal_network::{ChapterDownloader, Client, ClientConfig, DownloaderConfig, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;

/// List the builtin narrator catalog
pub fn list_narrators() -> Result<()> {
    println!("\n{}", style("Available narrators").bold().cyan());
    println!("{}", "=".repeat(60));

    for narrator in Narrator::builtin() {
        let highlighting = if narrator.timing_recitation_id.is_some() {
            "word highlighting"
        } else {
            "no word highlighting"
        };
        println!(
            "  {:>3}  {} / {} ({}, {})",
            style(narrator.id).bold(),
            narrator.name,
            narrator.native_name,
            narrator.style,
            highlighting
        );
    }
    println!();
    Ok(())
}

/// Download a whole chapter for offline playback, showing progress.
pub async fn download_chapter(config: &Config, matches: &ArgMatches) -> Result<()> {
    let chapter = parse_chapter(matches)?;
    let narrator = resolve_narrator(config, matches)?;
    let cache = open_cache(config)?;
    let client = build_client(config)?;

    if cache.is_chapter_cached(narrator.id, chapter) {
        println!("Chapter {} is already fully cached.", chapter);
        return Ok(());
    }

    let total = verse_count(chapter).unwrap_or(0);
    println!(
        "Downloading chapter {} ({} verses, narrator: {})...",
        chapter, total, narrator.name
    );

    let downloader = ChapterDownloader::new(
        client,
        cache.clone(),
        DownloaderConfig {
            max_concurrent: config.download.max_concurrent,
        },
    )
    .with_progress_callback(Arc::new(|_chapter, progress| {
        print!("\r  {}/{} verses", progress.completed, progress.total);
        let _ = std::io::Write::flush(&mut std::io::stdout());
    }));

    downloader.start_download(chapter, &narrator);
    downloader.wait_until_finished(chapter).await;
    println!();

    if cache.is_chapter_cached(narrator.id, chapter) {
        println!("{} Chapter {} downloaded.", style("✓").green().bold(), chapter);
        Ok(())
    } else {
        bail!("Some verses failed to download; run the command again to retry them")
    }
}

/// Delete a chapter's cached audio for one narrator.
pub fn delete_chapter(config: &Config, matches: &ArgMatches) -> Result<()> {
    let chapter = parse_chapter(matches)?;
    let narrator = resolve_narrator(config, matches)?;
    let cache = open_cache(config)?;

    let Some(count) = verse_count(chapter) else {
        bail!("Chapter {} does not exist", chapter);
    };

    let mut removed = 0usize;
    for verse_no in 1..=count {
        if let Ok(verse) = murattal_core::VerseRef::new(chapter, verse_no) {
            if cache.exists(narrator.id, verse) {
                cache
                    .delete(narrator.id, verse)
                    .with_context(|| format!("Failed to delete verse {}", verse))?;
                removed += 1;
            }
        }
    }

    println!(
        "{} Removed {} cached verses of chapter {}.",
        style("✓").green().bold(),
        removed,
        chapter
    );
    Ok(())
}

/// Show cache size, or clear it with `--clear`.
pub fn cache_status(config: &Config, matches: &ArgMatches) -> Result<()> {
    let cache = open_cache(config)?;

    if matches.get_flag("clear") {
        cache.clear().context("Failed to clear cache")?;
        println!("{} Cache cleared.", style("✓").green().bold());
        return Ok(());
    }

    let size = cache.total_size().context("Failed to measure cache")?;
    println!("Cache directory: {}", cache.root().display());
    println!("Cache size: {:.1} MiB", size as f64 / (1024.0 * 1024.0));
    Ok(())
}

pub fn open_cache(config: &Config) -> Result<AudioCache> {
    let dir = match &config.app.cache_dir {
        Some(dir) => dir.clone(),
        None => ConfigManager::default_cache_dir().context("Failed to locate cache directory")?,
    };
    AudioCache::new(&dir).with_context(|| format!("Failed to open cache at {}", dir.display()))
}

pub fn build_client(config: &Config) -> Result<Client> {
    let client_config = ClientConfig {
        timeout: Duration::from_secs(config.download.timeout_secs),
        user_agent: format!("Murattal/{}", env!("CARGO_PKG_VERSION")),
        retry_policy: Some(RetryPolicy::new(config.download.max_retries as usize)),
    };
    Client::with_config(client_config).context("Failed to build HTTP client")
}

pub fn parse_chapter(matches: &ArgMatches) -> Result<u16> {
    let raw = matches
        .get_one::<String>("chapter")
        .ok_or_else(|| anyhow::anyhow!("Chapter number is required"))?;
    let chapter: u16 = raw
        .parse()
        .with_context(|| format!("Invalid chapter number: {}", raw))?;
    if verse_count(chapter).is_none() {
        bail!("Chapter {} does not exist (valid range: 1-114)", chapter);
    }
    Ok(chapter)
}

pub fn resolve_narrator(config: &Config, matches: &ArgMatches) -> Result<Narrator> {
    let id = match matches.get_one::<String>("narrator") {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid narrator id: {}", raw))?,
        None => config.player.narrator_id,
    };
    Narrator::find(id)
        .ok_or_else(|| anyhow::anyhow!("Unknown narrator id {} (see 'murattal narrators')", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, Command};
    use tempfile::tempdir;

    fn matches_for(args: &[&str]) -> ArgMatches {
        Command::new("test")
            .arg(Arg::new("chapter").required(true))
            .arg(Arg::new("narrator").long("narrator"))
            .get_matches_from(args.to_vec())
    }

    #[test]
    fn test_parse_chapter_valid() {
        let matches = matches_for(&["test", "36"]);
        assert_eq!(parse_chapter(&matches).unwrap(), 36);
    }

    #[test]
    fn test_parse_chapter_out_of_range() {
        let matches = matches_for(&["test", "115"]);
        assert!(parse_chapter(&matches).is_err());
    }

    #[test]
    fn test_parse_chapter_not_a_number() {
        let matches = matches_for(&["test", "abc"]);
        assert!(parse_chapter(&matches).is_err());
    }

    #[test]
    fn test_resolve_narrator_from_flag() {
        let matches = matches_for(&["test", "1", "--narrator", "1"]);
        let narrator = resolve_narrator(&Config::default(), &matches).unwrap();
        assert_eq!(narrator.id, 1);
    }

    #[test]
    fn test_resolve_narrator_falls_back_to_config() {
        let matches = matches_for(&["test", "1"]);
        let narrator = resolve_narrator(&Config::default(), &matches).unwrap();
        assert_eq!(narrator.id, Config::default().player.narrator_id);
    }

    #[test]
    fn test_resolve_narrator_unknown_id() {
        let matches = matches_for(&["test", "1", "--narrator", "999"]);
        assert!(resolve_narrator(&Config::default(), &matches).is_err());
    }

    #[test]
    fn test_open_cache_with_override() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.app.cache_dir = Some(dir.path().join("audio"));

        let cache = open_cache(&config).unwrap();
        assert!(cache.root().exists());
    }
}
