// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use murattal_config::ConfigManager;

mod commands;
mod player;

fn build_cli() -> Command {
    Command::new("murattal")
        .version("0.1.0")
        .about("Verse-by-verse Quran recitation player")
        .subcommand(Command::new("narrators").about("List the available narrators"))
        .subcommand(
            Command::new("play")
                .about("Play a chapter, a single verse, or a verse range")
                .arg(Arg::new("chapter").required(true).value_name("CHAPTER").help("Chapter number (1-114)"))
                .arg(Arg::new("verse").short('v').long("verse").value_name("VERSE").help("Play a single verse"))
                .arg(Arg::new("from").long("from").value_name("VERSE").help("First verse of a range"))
                .arg(Arg::new("to").long("to").value_name("VERSE").help("Last verse of a range"))
                .arg(Arg::new("narrator").short('n').long("narrator").value_name("ID").help("Narrator id (see 'narrators')"))
                .arg(Arg::new("speed").short('s').long("speed").value_name("RATE").help("Playback speed (0.5-3.0)"))
                .arg(Arg::new("repeat").short('r').long("repeat").value_name("N").help("Times each verse plays; 0 repeats forever")),
        )
        .subcommand(
            Command::new("download")
                .about("Download a whole chapter for offline playback")
                .arg(Arg::new("chapter").required(true).value_name("CHAPTER").help("Chapter number (1-114)"))
                .arg(Arg::new("narrator").short('n').long("narrator").value_name("ID").help("Narrator id")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a chapter's cached audio")
                .arg(Arg::new("chapter").required(true).value_name("CHAPTER").help("Chapter number (1-114)"))
                .arg(Arg::new("narrator").short('n').long("narrator").value_name("ID").help("Narrator id")),
        )
        .subcommand(
            Command::new("cache")
                .about("Inspect or clear the audio cache")
                .arg(
                    Arg::new("clear")
                        .long("clear")
                        .help("Remove every cached file")
                        .action(ArgAction::SetTrue),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let manager = ConfigManager::new().context("Failed to locate config directory")?;
    let config = manager.load_or_default();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_filter.clone()),
    )
    .init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("narrators", _)) => commands::list_narrators(),
        Some(("play", sub_matches)) => player::play(&config, sub_matches).await,
        Some(("download", sub_matches)) => commands::download_chapter(&config, sub_matches).await,
        Some(("delete", sub_matches)) => commands::delete_chapter(&config, sub_matches),
        Some(("cache", sub_matches)) => commands::cache_status(&config, sub_matches),
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
