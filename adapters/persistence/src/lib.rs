#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! File-backed high score stores.
//!
//! [`JsonHighscoreStore`] keeps the high score inside a larger JSON document
//! under `player.highscore` and leaves every other entry untouched when
//! saving: only the bytes of the stored number change. [`PlainTextHighscoreStore`]
//! holds nothing but the decimal score. Both write through a staged temporary
//! file so a crash never leaves a truncated document behind.

mod atomic_write;
mod splice;

use std::{
    fs, io,
    num::ParseIntError,
    path::{Path, PathBuf},
};

use serde_json::Value;
use thiserror::Error;
use tile_merge_core::Score;
use tile_merge_system_scoring::{HighscoreStore, StoreError, StoreOperation};
use tracing::debug;

/// Default location of the JSON document holding the high score.
pub const DEFAULT_HIGHSCORE_PATH: &str = "assets/data.json";

const PLAYER_KEY: &str = "player";
const HIGHSCORE_KEY: &str = "highscore";

/// Failures raised while reading or writing a high score file.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The file could not be read.
    #[error("failed to read {}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file could not be replaced.
    #[error("failed to write {}", path.display())]
    Write {
        /// File that was being written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The document is not valid JSON.
    #[error("failed to parse {}", path.display())]
    Parse {
        /// Document that failed to parse.
        path: PathBuf,
        /// Underlying parser failure.
        #[source]
        source: serde_json::Error,
    },
    /// The document root is not a JSON object.
    #[error("{} does not hold a JSON object", path.display())]
    NotAnObject {
        /// Offending document.
        path: PathBuf,
    },
    /// The scanner could not find where the high score belongs in the document text.
    #[error("could not locate `player.highscore` in {}", path.display())]
    Unlocated {
        /// Offending document.
        path: PathBuf,
    },
    /// A plain-text file does not contain a decimal score.
    #[error("{} does not contain a decimal score", path.display())]
    InvalidNumber {
        /// Offending file.
        path: PathBuf,
        /// Underlying integer parse failure.
        #[source]
        source: ParseIntError,
    },
}

/// High score stored as `player.highscore` inside a JSON document.
#[derive(Clone, Debug)]
pub struct JsonHighscoreStore {
    path: PathBuf,
}

impl JsonHighscoreStore {
    /// Creates a store backed by the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads `player.highscore`, returning `None` when the file or the field is absent.
    pub fn read_highscore(&self) -> Result<Option<Score>, PersistenceError> {
        let Some(text) = read_optional(&self.path)? else {
            debug!(path = %self.path.display(), "highscore document missing");
            return Ok(None);
        };
        let document = self.parse(&text)?;

        let highscore = document
            .get(PLAYER_KEY)
            .and_then(|player| player.get(HIGHSCORE_KEY))
            .and_then(Value::as_u64);
        if highscore.is_none() {
            debug!(path = %self.path.display(), "highscore field missing or not an unsigned integer");
        }
        Ok(highscore)
    }

    /// Replaces the `player.highscore` value in place, leaving every other byte of the document as it was.
    ///
    /// A missing or non-object `player` entry is replaced by a fresh
    /// `{"highscore": N}` object. The document must already exist; it is never
    /// created from scratch.
    pub fn write_highscore(&self, highscore: Score) -> Result<(), PersistenceError> {
        let text = fs::read_to_string(&self.path).map_err(|source| PersistenceError::Read {
            path: self.path.clone(),
            source,
        })?;
        let document = self.parse(&text)?;
        let Value::Object(root) = &document else {
            return Err(PersistenceError::NotAnObject {
                path: self.path.clone(),
            });
        };

        let edited = if root.get(PLAYER_KEY).is_some_and(Value::is_object) {
            splice::set_member(&text, &[PLAYER_KEY], HIGHSCORE_KEY, &highscore.to_string())
        } else {
            debug!(path = %self.path.display(), "creating player section");
            let player = format!("{{\"{HIGHSCORE_KEY}\": {highscore}}}");
            splice::set_member(&text, &[], PLAYER_KEY, &player)
        };
        let edited = edited.ok_or_else(|| PersistenceError::Unlocated {
            path: self.path.clone(),
        })?;

        atomic_write::replace_with_text(&self.path, &edited).map_err(|source| {
            PersistenceError::Write {
                path: self.path.clone(),
                source,
            }
        })
    }

    fn parse(&self, text: &str) -> Result<Value, PersistenceError> {
        serde_json::from_str(text).map_err(|source| PersistenceError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl Default for JsonHighscoreStore {
    fn default() -> Self {
        Self::new(DEFAULT_HIGHSCORE_PATH)
    }
}

impl HighscoreStore for JsonHighscoreStore {
    fn load(&mut self) -> Result<Option<Score>, StoreError> {
        self.read_highscore()
            .map_err(|error| StoreError::new(StoreOperation::Load, error))
    }

    fn save(&mut self, highscore: Score) -> Result<(), StoreError> {
        self.write_highscore(highscore)
            .map_err(|error| StoreError::new(StoreOperation::Save, error))
    }
}

/// High score stored as the sole decimal contents of a text file.
#[derive(Clone, Debug)]
pub struct PlainTextHighscoreStore {
    path: PathBuf,
}

impl PlainTextHighscoreStore {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored score, returning `None` for a missing or blank file.
    pub fn read_highscore(&self) -> Result<Option<Score>, PersistenceError> {
        let Some(text) = read_optional(&self.path)? else {
            return Ok(None);
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse::<Score>()
            .map(Some)
            .map_err(|source| PersistenceError::InvalidNumber {
                path: self.path.clone(),
                source,
            })
    }

    /// Overwrites the file with `highscore`, creating it when needed.
    pub fn write_highscore(&self, highscore: Score) -> Result<(), PersistenceError> {
        atomic_write::replace_with_text(&self.path, &format!("{highscore}\n")).map_err(|source| {
            PersistenceError::Write {
                path: self.path.clone(),
                source,
            }
        })
    }
}

impl HighscoreStore for PlainTextHighscoreStore {
    fn load(&mut self) -> Result<Option<Score>, StoreError> {
        self.read_highscore()
            .map_err(|error| StoreError::new(StoreOperation::Load, error))
    }

    fn save(&mut self, highscore: Score) -> Result<(), StoreError> {
        self.write_highscore(highscore)
            .map_err(|error| StoreError::new(StoreOperation::Save, error))
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, PersistenceError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PersistenceError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
