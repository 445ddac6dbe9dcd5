#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that hosts a tile-merge session in the terminal.

mod config;
mod session;
mod terminal;

use std::{
    io::{self, BufRead, Cursor},
    path::PathBuf,
};

use anyhow::Result;
use clap::Parser;
use tile_merge_persistence::{JsonHighscoreStore, PlainTextHighscoreStore};
use tile_merge_rendering::{palette, Presentation, RenderingBackend};
use tile_merge_system_scoring::HighscoreStore;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{GameConfig, HighscoreFormat},
    session::Session,
    terminal::TerminalBackend,
};

/// Slide numbered tiles around a 4x4 board, merging equal neighbours.
#[derive(Debug, Parser)]
#[command(name = "tile-merge", version, about)]
struct CliArgs {
    /// TOML file with game settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for tile spawning.
    #[arg(long)]
    seed: Option<u64>,
    /// Input script (U D L R move, N new game, T retry, . idle, Q quit); read from stdin when absent.
    #[arg(long)]
    moves: Option<String>,
    /// File holding the high score.
    #[arg(long)]
    highscore: Option<PathBuf>,
    /// Layout of the high score file.
    #[arg(long, value_enum)]
    format: Option<HighscoreFormat>,
    /// Simulated milliseconds per frame.
    #[arg(long = "frame-ms")]
    frame_ms: Option<u64>,
    /// Paint tiles with 24-bit ANSI colours.
    #[arg(long)]
    color: bool,
}

impl CliArgs {
    fn apply_to(&self, config: &mut GameConfig) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(path) = &self.highscore {
            config.highscore_path = path.clone();
        }
        if let Some(format) = self.format {
            config.highscore_format = format;
        }
        if let Some(frame_ms) = self.frame_ms {
            config.frame_millis = frame_ms;
        }
        if self.color {
            config.color = true;
        }
    }
}

/// Entry point for the tile-merge command-line interface.
fn main() -> Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let mut config = GameConfig::load(args.config.as_deref())?;
    args.apply_to(&mut config);
    config.validate()?;

    let store = open_store(&config);
    let mut session = Session::start(&mut config, store);
    let presentation = Presentation::new("tile-merge", palette::BACKGROUND, session.scene());

    let input: Box<dyn BufRead> = match &args.moves {
        Some(script) => Box::new(Cursor::new(script.clone().into_bytes())),
        None => Box::new(io::stdin().lock()),
    };

    let backend = TerminalBackend::new(input, io::stdout().lock(), config.frame_delta())
        .with_color(config.color);
    let outcome = backend.run(presentation, |dt, input, scene| {
        session.frame(dt, input);
        session.refresh_scene(scene);
    });

    session.shutdown();
    outcome
}

fn open_store(config: &GameConfig) -> Box<dyn HighscoreStore> {
    match config.highscore_format {
        HighscoreFormat::Json => Box::new(JsonHighscoreStore::new(&config.highscore_path)),
        HighscoreFormat::Text => Box::new(PlainTextHighscoreStore::new(&config.highscore_path)),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}
