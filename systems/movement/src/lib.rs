#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic move engine that slides and merges tiles on a board snapshot.
//!
//! [`slide`] never mutates its input. Cells are swept starting next to the
//! target edge so that nearer tiles are fully resolved before farther ones are
//! processed. Every tile then steps one cell at a time toward the edge until it
//! hits the boundary, an unequal tile, or a cell that already absorbed a merge
//! during this move. Landing on an equal tile merges the pair and ends that
//! tile's travel.

use tile_merge_core::{
    tile_value, CellIndex, Direction, Displacement, Grid, MergeFlags, Score, EMPTY, GRID_COLUMNS,
    GRID_ROWS,
};

/// Result of applying one directional move to a board snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlideOutcome {
    grid: Grid,
    displacements: Vec<Displacement>,
    merge_flags: MergeFlags,
    score_delta: Score,
}

impl SlideOutcome {
    /// Reports whether at least one tile ended in a different cell.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.displacements.is_empty()
    }

    /// Board after sliding and merging.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Tiles that changed position, in sweep order.
    #[must_use]
    pub fn displacements(&self) -> &[Displacement] {
        &self.displacements
    }

    /// Cells that absorbed a merge during the move.
    #[must_use]
    pub const fn merge_flags(&self) -> &MergeFlags {
        &self.merge_flags
    }

    /// Points earned by the merges of this move.
    #[must_use]
    pub const fn score_delta(&self) -> Score {
        self.score_delta
    }

    /// Consumes the outcome, yielding its parts.
    #[must_use]
    pub fn into_parts(self) -> (Grid, Vec<Displacement>, MergeFlags, Score) {
        (
            self.grid,
            self.displacements,
            self.merge_flags,
            self.score_delta,
        )
    }
}

/// Applies a single move toward `direction` to a copy of `grid`.
#[must_use]
pub fn slide(grid: &Grid, direction: Direction) -> SlideOutcome {
    let mut outcome = SlideOutcome {
        grid: *grid,
        displacements: Vec::new(),
        merge_flags: MergeFlags::new(),
        score_delta: 0,
    };

    for start in sweep(direction).cells() {
        let end = travel(&mut outcome, start, direction);
        if end != start {
            outcome.displacements.push(Displacement::new(start, end));
        }
    }

    outcome
}

/// Steps the tile at `start` toward the edge and returns the cell it settles in.
fn travel(outcome: &mut SlideOutcome, start: CellIndex, direction: Direction) -> CellIndex {
    let grid = &mut outcome.grid;
    let mut current = start;

    while let Some(next) = current.neighbor(direction) {
        let moving = grid.get(current);
        if moving == EMPTY || outcome.merge_flags.is_set(next) {
            break;
        }

        let resident = grid.get(next);
        if resident == EMPTY {
            grid.set(next, moving);
            grid.set(current, EMPTY);
            current = next;
            continue;
        }

        if resident != moving {
            break;
        }

        let merged = resident.saturating_add(1);
        grid.set(next, merged);
        grid.set(current, EMPTY);
        outcome.merge_flags.set(next);
        outcome.score_delta = outcome.score_delta.saturating_add(tile_value(merged));
        current = next;
        break;
    }

    current
}

#[derive(Clone, Copy, Debug)]
enum Axis {
    /// Depth counts rows; lanes are columns.
    Rows,
    /// Depth counts columns; lanes are rows.
    Columns,
}

#[derive(Clone, Copy, Debug)]
struct Sweep {
    axis: Axis,
    /// Whether the target edge sits at depth zero.
    toward_origin: bool,
}

const fn sweep(direction: Direction) -> Sweep {
    match direction {
        Direction::Up => Sweep {
            axis: Axis::Rows,
            toward_origin: true,
        },
        Direction::Down => Sweep {
            axis: Axis::Rows,
            toward_origin: false,
        },
        Direction::Left => Sweep {
            axis: Axis::Columns,
            toward_origin: true,
        },
        Direction::Right => Sweep {
            axis: Axis::Columns,
            toward_origin: false,
        },
    }
}

impl Sweep {
    /// Visit order: every lane at the depth next to the edge, then the next depth outward.
    /// Cells already on the target edge are skipped.
    fn cells(self) -> impl Iterator<Item = CellIndex> {
        let (depth_extent, lane_extent) = match self.axis {
            Axis::Rows => (GRID_ROWS, GRID_COLUMNS),
            Axis::Columns => (GRID_COLUMNS, GRID_ROWS),
        };

        let depths: Vec<usize> = if self.toward_origin {
            (1..depth_extent).collect()
        } else {
            (0..depth_extent - 1).rev().collect()
        };

        depths.into_iter().flat_map(move |depth| {
            (0..lane_extent).filter_map(move |lane| match self.axis {
                Axis::Rows => CellIndex::from_coords(lane, depth),
                Axis::Columns => CellIndex::from_coords(depth, lane),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(direction: Direction) -> Vec<usize> {
        sweep(direction).cells().map(|cell| cell.get()).collect()
    }

    #[test]
    fn up_sweeps_rows_top_to_bottom_from_second_row() {
        assert_eq!(indices(Direction::Up), (4..16).collect::<Vec<_>>());
    }

    #[test]
    fn down_sweeps_rows_bottom_to_top_from_second_to_last_row() {
        assert_eq!(
            indices(Direction::Down),
            vec![8, 9, 10, 11, 4, 5, 6, 7, 0, 1, 2, 3]
        );
    }

    #[test]
    fn left_sweeps_columns_left_to_right_from_second_column() {
        assert_eq!(
            indices(Direction::Left),
            vec![1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15]
        );
    }

    #[test]
    fn right_sweeps_columns_right_to_left_from_second_to_last_column() {
        assert_eq!(
            indices(Direction::Right),
            vec![2, 6, 10, 14, 1, 5, 9, 13, 0, 4, 8, 12]
        );
    }
}
