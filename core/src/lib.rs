#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tile Merge engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.
//!
//! The board is a fixed 4×4 [`Grid`] of tile exponents: `0` marks an empty
//! cell and any other value `e` represents a tile worth `2^e`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of tile columns on the board.
pub const GRID_COLUMNS: usize = 4;

/// Number of tile rows on the board.
pub const GRID_ROWS: usize = 4;

/// Total number of cells on the board.
pub const CELL_COUNT: usize = GRID_COLUMNS * GRID_ROWS;

/// Exponent stored in a cell that holds no tile.
pub const EMPTY: Exponent = 0;

/// Exponent of the tiles seeded onto a fresh board.
pub const SEED_EXPONENT: Exponent = 1;

/// Time taken by tiles to slide into their post-move cells.
pub const DEFAULT_SLIDE_DURATION: Duration = Duration::from_millis(120);

/// Time during which freshly merged tiles are emphasised after sliding ends.
pub const DEFAULT_MERGE_POP_DURATION: Duration = Duration::from_millis(100);

/// Time taken by the game-over overlay to fade in.
pub const DEFAULT_GAME_OVER_FADE_DURATION: Duration = Duration::from_secs(1);

/// Per-cell tile exponent. Tile value is `2^exponent`; zero denotes an empty cell.
pub type Exponent = u8;

/// Running and high score values.
pub type Score = u64;

/// Computes the face value of a tile with the provided exponent.
///
/// Empty cells are worth zero. Exponents beyond the representable range
/// saturate instead of wrapping.
#[must_use]
pub fn tile_value(exponent: Exponent) -> Score {
    if exponent == EMPTY {
        return 0;
    }
    1_u64.checked_shl(u32::from(exponent)).unwrap_or(Score::MAX)
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Starts a fresh game, discarding the current board.
    NewGame,
    /// Starts a fresh game from the game-over screen.
    Retry,
    /// Requests that every tile slide toward the provided edge.
    RequestMove {
        /// Edge the tiles slide toward.
        direction: Direction,
    },
    /// Places a new tile into an empty cell.
    SpawnTile {
        /// Cell receiving the tile.
        cell: CellIndex,
        /// Exponent of the new tile.
        exponent: Exponent,
        /// Reason the tile is being placed.
        origin: SpawnOrigin,
    },
    /// Marks the game as finished because no legal move remains.
    DeclareGameOver,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of wall-clock time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the board was cleared for a new game.
    GameReset,
    /// Confirms that a move changed the board.
    TilesSlid {
        /// Edge the tiles slid toward.
        direction: Direction,
        /// Tiles that changed position, in sweep order.
        displacements: Vec<Displacement>,
        /// Cells that absorbed a merge during the move.
        merged: Vec<CellIndex>,
        /// Points earned by the merges of this move.
        score_delta: Score,
    },
    /// Confirms that a tile was placed on the board.
    TileSpawned {
        /// Cell that received the tile.
        cell: CellIndex,
        /// Exponent of the placed tile.
        exponent: Exponent,
        /// Reason the tile was placed.
        origin: SpawnOrigin,
    },
    /// Reports that the slide phase of the latest move completed.
    SlideFinished,
    /// Reports that the merge-pop phase of the latest move completed.
    MergePopFinished,
    /// Announces that no legal move remains.
    GameOver,
    /// Reports that the game-over overlay finished fading in.
    GameOverFadeFinished,
}

/// Reason a tile was placed on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnOrigin {
    /// One of the two tiles seeded onto a fresh board.
    Seed,
    /// The tile added after a move that changed the board.
    AfterMove,
}

/// Edge toward which tiles slide during a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward row zero.
    Up,
    /// Toward the last row.
    Down,
    /// Toward column zero.
    Left,
    /// Toward the last column.
    Right,
}

impl Direction {
    /// Every direction in a stable order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

/// Phase of the per-move animation cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationPhase {
    /// No animation is running and moves are accepted.
    #[default]
    Idle,
    /// Tiles are travelling toward their post-move cells.
    Sliding,
    /// Freshly merged tiles are being emphasised.
    MergePop,
}

/// Row-major index of a single board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellIndex(u8);

impl CellIndex {
    /// Creates a cell index, returning `None` when it lies outside the board.
    #[must_use]
    pub const fn new(index: usize) -> Option<Self> {
        if index < CELL_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Creates a cell index from column and row coordinates.
    #[must_use]
    pub const fn from_coords(column: usize, row: usize) -> Option<Self> {
        if column < GRID_COLUMNS && row < GRID_ROWS {
            Some(Self((row * GRID_COLUMNS + column) as u8))
        } else {
            None
        }
    }

    /// Retrieves the row-major position of the cell.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0 as usize
    }

    /// Zero-based column containing the cell.
    #[must_use]
    pub const fn column(&self) -> usize {
        self.get() % GRID_COLUMNS
    }

    /// Zero-based row containing the cell.
    #[must_use]
    pub const fn row(&self) -> usize {
        self.get() / GRID_COLUMNS
    }

    /// Returns the orthogonal neighbour toward `direction`, if it exists.
    #[must_use]
    pub const fn neighbor(&self, direction: Direction) -> Option<Self> {
        let column = self.column();
        let row = self.row();
        match direction {
            Direction::Up if row > 0 => Self::from_coords(column, row - 1),
            Direction::Down => Self::from_coords(column, row + 1),
            Direction::Left if column > 0 => Self::from_coords(column - 1, row),
            Direction::Right => Self::from_coords(column + 1, row),
            _ => None,
        }
    }

    /// Iterates over every cell of the board in row-major order.
    pub fn all() -> impl Iterator<Item = CellIndex> {
        (0..CELL_COUNT as u8).map(CellIndex)
    }
}

/// Fixed-size board of tile exponents stored in row-major order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    cells: [Exponent; CELL_COUNT],
}

impl Grid {
    /// Creates an empty board.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: [EMPTY; CELL_COUNT],
        }
    }

    /// Creates a board from explicit row-major exponents.
    #[must_use]
    pub const fn from_exponents(cells: [Exponent; CELL_COUNT]) -> Self {
        Self { cells }
    }

    /// Exponent stored in the provided cell.
    #[must_use]
    pub const fn get(&self, cell: CellIndex) -> Exponent {
        self.cells[cell.get()]
    }

    /// Overwrites the exponent stored in the provided cell.
    pub fn set(&mut self, cell: CellIndex, exponent: Exponent) {
        self.cells[cell.get()] = exponent;
    }

    /// Reports whether the provided cell holds no tile.
    #[must_use]
    pub const fn is_empty_cell(&self, cell: CellIndex) -> bool {
        self.get(cell) == EMPTY
    }

    /// Reports whether every cell holds a tile.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&exponent| exponent != EMPTY)
    }

    /// Cells that currently hold no tile, in row-major order.
    #[must_use]
    pub fn empty_cells(&self) -> Vec<CellIndex> {
        CellIndex::all()
            .filter(|cell| self.is_empty_cell(*cell))
            .collect()
    }

    /// Sum of the face values of every tile on the board.
    #[must_use]
    pub fn total_value(&self) -> Score {
        self.cells
            .iter()
            .map(|&exponent| tile_value(exponent))
            .fold(0, Score::saturating_add)
    }

    /// Largest exponent present on the board, or zero when empty.
    #[must_use]
    pub fn max_exponent(&self) -> Exponent {
        self.cells.iter().copied().max().unwrap_or(EMPTY)
    }

    /// Provides read-only access to the raw row-major exponents.
    #[must_use]
    pub const fn exponents(&self) -> &[Exponent; CELL_COUNT] {
        &self.cells
    }
}

/// Source and destination cell of a tile that moved during a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Displacement {
    from: CellIndex,
    to: CellIndex,
}

impl Displacement {
    /// Creates a displacement record.
    #[must_use]
    pub const fn new(from: CellIndex, to: CellIndex) -> Self {
        Self { from, to }
    }

    /// Cell the tile occupied before the move.
    #[must_use]
    pub const fn from(&self) -> CellIndex {
        self.from
    }

    /// Cell the tile occupies after the move.
    #[must_use]
    pub const fn to(&self) -> CellIndex {
        self.to
    }
}

/// One flag per cell recording whether a merge landed there during a move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeFlags {
    flags: [bool; CELL_COUNT],
}

impl MergeFlags {
    /// Creates a flag set with every cell cleared.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flags: [false; CELL_COUNT],
        }
    }

    /// Reports whether a merge landed on the provided cell.
    #[must_use]
    pub const fn is_set(&self, cell: CellIndex) -> bool {
        self.flags[cell.get()]
    }

    /// Records a merge on the provided cell.
    pub fn set(&mut self, cell: CellIndex) {
        self.flags[cell.get()] = true;
    }

    /// Reports whether any merge occurred.
    #[must_use]
    pub fn any(&self) -> bool {
        self.flags.iter().any(|flag| *flag)
    }

    /// Cells that absorbed a merge, in row-major order.
    #[must_use]
    pub fn merged_cells(&self) -> Vec<CellIndex> {
        CellIndex::all().filter(|cell| self.is_set(*cell)).collect()
    }

    /// Rebuilds the flag set from a list of merged cells.
    #[must_use]
    pub fn from_cells(cells: &[CellIndex]) -> Self {
        let mut flags = Self::new();
        for cell in cells {
            flags.set(*cell);
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn cell(index: usize) -> CellIndex {
        CellIndex::new(index).expect("index inside board")
    }

    #[test]
    fn cell_index_rejects_positions_outside_board() {
        assert!(CellIndex::new(CELL_COUNT).is_none());
        assert!(CellIndex::from_coords(GRID_COLUMNS, 0).is_none());
        assert!(CellIndex::from_coords(0, GRID_ROWS).is_none());
        assert_eq!(CellIndex::from_coords(3, 2), Some(cell(11)));
    }

    #[test]
    fn neighbors_stop_at_board_edges() {
        let corner = cell(0);
        assert_eq!(corner.neighbor(Direction::Up), None);
        assert_eq!(corner.neighbor(Direction::Left), None);
        assert_eq!(corner.neighbor(Direction::Right), Some(cell(1)));
        assert_eq!(corner.neighbor(Direction::Down), Some(cell(4)));

        let opposite = cell(15);
        assert_eq!(opposite.neighbor(Direction::Down), None);
        assert_eq!(opposite.neighbor(Direction::Right), None);
        assert_eq!(opposite.neighbor(Direction::Up), Some(cell(11)));

        assert_eq!(cell(4).neighbor(Direction::Left), None);
        assert_eq!(cell(3).neighbor(Direction::Right), None);
    }

    #[test]
    fn tile_value_treats_zero_as_empty() {
        assert_eq!(tile_value(EMPTY), 0);
        assert_eq!(tile_value(1), 2);
        assert_eq!(tile_value(11), 2048);
        assert_eq!(tile_value(200), Score::MAX);
    }

    #[test]
    fn grid_reports_empty_cells_and_fullness() {
        let mut grid = Grid::new();
        assert_eq!(grid.empty_cells().len(), CELL_COUNT);
        assert!(!grid.is_full());

        for index in CellIndex::all() {
            grid.set(index, 1);
        }
        assert!(grid.is_full());
        assert!(grid.empty_cells().is_empty());
        assert_eq!(grid.total_value(), 32);
    }

    #[test]
    fn merge_flags_round_trip_through_cell_list() {
        let mut flags = MergeFlags::new();
        assert!(!flags.any());
        flags.set(cell(2));
        flags.set(cell(9));

        let cells = flags.merged_cells();
        assert_eq!(cells, vec![cell(2), cell(9)]);
        assert_eq!(MergeFlags::from_cells(&cells), flags);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn grid_round_trips_through_bincode() {
        let grid = Grid::from_exponents([1, 0, 2, 0, 0, 3, 0, 0, 11, 0, 0, 0, 0, 0, 0, 4]);
        assert_round_trip(&grid);
    }

    #[test]
    fn displacement_round_trips_through_bincode() {
        assert_round_trip(&Displacement::new(cell(7), cell(4)));
    }
}
