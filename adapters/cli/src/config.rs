//! Game configuration loaded from TOML and refined by command-line flags.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use tile_merge_persistence::DEFAULT_HIGHSCORE_PATH;
use tile_merge_system_animation::Timings;

/// On-disk layout used to keep the high score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum HighscoreFormat {
    /// `player.highscore` inside a JSON document.
    #[default]
    Json,
    /// A text file holding only the decimal score.
    Text,
}

/// Tunables of a play session.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    /// Spawn RNG seed; drawn from system entropy when absent.
    pub(crate) seed: Option<u64>,
    /// Length of the slide animation in milliseconds.
    pub(crate) slide_millis: u64,
    /// Length of the merge-pop animation in milliseconds.
    pub(crate) merge_pop_millis: u64,
    /// Length of the game-over fade-in in milliseconds.
    pub(crate) fade_in_millis: u64,
    /// File holding the high score.
    pub(crate) highscore_path: PathBuf,
    /// Layout of [`Self::highscore_path`].
    pub(crate) highscore_format: HighscoreFormat,
    /// Simulated time step of one frame in milliseconds.
    pub(crate) frame_millis: u64,
    /// Paint the board with 24-bit ANSI colours.
    pub(crate) color: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        let timings = Timings::default();
        Self {
            seed: None,
            slide_millis: duration_millis(timings.slide),
            merge_pop_millis: duration_millis(timings.merge_pop),
            fade_in_millis: duration_millis(timings.fade_in),
            highscore_path: PathBuf::from(DEFAULT_HIGHSCORE_PATH),
            highscore_format: HighscoreFormat::default(),
            frame_millis: 16,
            color: false,
        }
    }
}

impl GameConfig {
    /// Reads the configuration file at `path`, or the defaults when no file is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// Parses TOML configuration text; absent keys keep their defaults.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("invalid config toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the frame loop cannot run with.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.frame_millis == 0 {
            bail!("frame_millis must be positive");
        }
        Ok(())
    }

    /// Animation durations derived from the configured milliseconds.
    #[must_use]
    pub(crate) fn timings(&self) -> Timings {
        Timings {
            slide: Duration::from_millis(self.slide_millis),
            merge_pop: Duration::from_millis(self.merge_pop_millis),
            fade_in: Duration::from_millis(self.fade_in_millis),
        }
    }

    /// Simulated duration of a single frame.
    #[must_use]
    pub(crate) fn frame_delta(&self) -> Duration {
        Duration::from_millis(self.frame_millis)
    }

    /// Seed to hand the spawning system, fixing an entropy-drawn one in place.
    pub(crate) fn resolve_seed(&mut self) -> u64 {
        *self.seed.get_or_insert_with(rand::random)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
