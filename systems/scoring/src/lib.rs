#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Score keeping and high score persistence coordination.
//!
//! The [`Scoreboard`] accumulates the points reported by [`Event::TilesSlid`]
//! and compares the running score with the stored high score whenever a game
//! ends, restarts, or the host shuts down. Storage is reached through the
//! [`HighscoreStore`] trait; its failures are logged and never interrupt play.

use std::error::Error as StdError;

use thiserror::Error;
use tile_merge_core::{Event, Score};
use tracing::{info, warn};

/// Storage backend holding the lifetime high score.
pub trait HighscoreStore {
    /// Reads the stored high score. `Ok(None)` means nothing has been stored yet.
    fn load(&mut self) -> Result<Option<Score>, StoreError>;

    /// Replaces the stored high score.
    fn save(&mut self, highscore: Score) -> Result<(), StoreError>;
}

/// Operation that a [`StoreError`] originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOperation {
    /// Reading the high score.
    Load,
    /// Writing the high score.
    Save,
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Save => write!(f, "save"),
        }
    }
}

/// Failure reported by a [`HighscoreStore`].
#[derive(Debug, Error)]
#[error("failed to {operation} highscore")]
pub struct StoreError {
    operation: StoreOperation,
    #[source]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl StoreError {
    /// Wraps a backend failure raised while performing `operation`.
    pub fn new<E>(operation: StoreOperation, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self {
            operation,
            source: source.into(),
        }
    }

    /// Operation that failed.
    #[must_use]
    pub const fn operation(&self) -> StoreOperation {
        self.operation
    }
}

/// Running score and high score of the current session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scoreboard {
    score: Score,
    highscore: Score,
    save_pending: bool,
}

impl Scoreboard {
    /// Creates a scoreboard with zero score and zero high score.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scoreboard whose high score is read from `store`.
    #[must_use]
    pub fn with_store<S>(store: &mut S) -> Self
    where
        S: HighscoreStore + ?Sized,
    {
        let mut scoreboard = Self::new();
        scoreboard.load_initial_highscore(store);
        scoreboard
    }

    /// Points earned in the current game.
    #[must_use]
    pub const fn score(&self) -> Score {
        self.score
    }

    /// Best score known to this session.
    #[must_use]
    pub const fn highscore(&self) -> Score {
        self.highscore
    }

    /// Reports whether a beaten high score still awaits a successful save.
    #[must_use]
    pub const fn save_pending(&self) -> bool {
        self.save_pending
    }

    /// Reads the stored high score, falling back to zero when unavailable.
    pub fn load_initial_highscore<S>(&mut self, store: &mut S)
    where
        S: HighscoreStore + ?Sized,
    {
        self.highscore = match store.load() {
            Ok(Some(highscore)) => highscore,
            Ok(None) => 0,
            Err(error) => {
                warn!(error = %error, "highscore_load_failed");
                0
            }
        };
        info!(highscore = self.highscore, "highscore_loaded");
    }

    /// Adds the points earned by a move.
    pub fn apply_score_delta(&mut self, delta: Score) {
        self.score = self.score.saturating_add(delta);
    }

    /// Records a finished game, persisting a beaten high score.
    pub fn on_game_over<S>(&mut self, store: &mut S)
    where
        S: HighscoreStore + ?Sized,
    {
        info!(score = self.score, "game_over");
        self.persist_if_beaten(store);
    }

    /// Records a restart, persisting a beaten high score before zeroing the score.
    pub fn on_reset<S>(&mut self, store: &mut S)
    where
        S: HighscoreStore + ?Sized,
    {
        self.persist_if_beaten(store);
        self.score = 0;
    }

    /// Records host shutdown, persisting a beaten high score.
    pub fn on_shutdown<S>(&mut self, store: &mut S)
    where
        S: HighscoreStore + ?Sized,
    {
        self.persist_if_beaten(store);
    }

    /// Consumes world events, updating the score and triggering saves.
    pub fn handle<S>(&mut self, events: &[Event], store: &mut S)
    where
        S: HighscoreStore + ?Sized,
    {
        for event in events {
            match event {
                Event::TilesSlid { score_delta, .. } => self.apply_score_delta(*score_delta),
                Event::GameOver => self.on_game_over(store),
                Event::GameReset => self.on_reset(store),
                _ => {}
            }
        }
    }

    fn persist_if_beaten<S>(&mut self, store: &mut S)
    where
        S: HighscoreStore + ?Sized,
    {
        if self.score > self.highscore {
            self.highscore = self.score;
            self.save_pending = true;
        }

        if !self.save_pending {
            return;
        }

        match store.save(self.highscore) {
            Ok(()) => {
                self.save_pending = false;
                info!(highscore = self.highscore, "highscore_saved");
            }
            Err(error) => {
                warn!(error = %error, highscore = self.highscore, "highscore_save_failed");
            }
        }
    }
}
