#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system that places new tiles and detects the terminal state.
//!
//! The system answers three events:
//! - [`Event::GameReset`] with two seed tiles of exponent [`SEED_EXPONENT`],
//! - [`Event::TilesSlid`] with one new tile of exponent 1 or 2 in a uniformly
//!   chosen empty cell,
//! - [`Event::TileSpawned`] after a move with [`Command::DeclareGameOver`] when
//!   the board is full and no orthogonal neighbours share an exponent.

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tile_merge_core::{
    CellIndex, Command, Direction, Event, Exponent, Grid, SpawnOrigin, SEED_EXPONENT,
};
use tracing::{debug, warn};

const SEED_TILE_COUNT: usize = 2;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided random seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that emits tile placement and game-over commands.
#[derive(Debug)]
pub struct Spawning {
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes world events and the current board to emit placement commands.
    pub fn handle(&mut self, events: &[Event], grid: &Grid, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::GameReset => self.seed_board(grid, out),
                Event::TilesSlid { .. } => {
                    let Some(cell) = self.pick_spawn_cell(grid) else {
                        warn!("move changed the board but left no empty cell");
                        continue;
                    };
                    out.push(Command::SpawnTile {
                        cell,
                        exponent: self.spawn_value(),
                        origin: SpawnOrigin::AfterMove,
                    });
                }
                Event::TileSpawned {
                    origin: SpawnOrigin::AfterMove,
                    ..
                } => {
                    if is_terminal(grid) {
                        debug!("board is full without adjacent pairs");
                        out.push(Command::DeclareGameOver);
                    }
                }
                _ => {}
            }
        }
    }

    /// Picks a uniformly random empty cell, or `None` when the board is full.
    pub fn pick_spawn_cell(&mut self, grid: &Grid) -> Option<CellIndex> {
        grid.empty_cells().choose(&mut self.rng).copied()
    }

    /// Draws the exponent of a post-move tile: 1 or 2 with equal probability.
    pub fn spawn_value(&mut self) -> Exponent {
        self.rng.gen_range(1..=2)
    }

    fn seed_board(&mut self, grid: &Grid, out: &mut Vec<Command>) {
        let mut scratch = *grid;
        for _ in 0..SEED_TILE_COUNT {
            let Some(cell) = self.pick_spawn_cell(&scratch) else {
                return;
            };
            scratch.set(cell, SEED_EXPONENT);
            out.push(Command::SpawnTile {
                cell,
                exponent: SEED_EXPONENT,
                origin: SpawnOrigin::Seed,
            });
        }
    }
}

/// Reports whether any move could still change the board.
///
/// A board with an empty cell always has a legal move; a full board has one
/// only if some cell shares its exponent with an orthogonal neighbour.
#[must_use]
pub fn has_legal_move(grid: &Grid) -> bool {
    if !grid.is_full() {
        return true;
    }

    CellIndex::all().any(|cell| {
        Direction::ALL.iter().any(|direction| {
            cell.neighbor(*direction)
                .is_some_and(|neighbor| grid.get(neighbor) == grid.get(cell))
        })
    })
}

/// Reports whether the board is full and no legal move remains.
#[must_use]
pub fn is_terminal(grid: &Grid) -> bool {
    grid.is_full() && !has_legal_move(grid)
}
