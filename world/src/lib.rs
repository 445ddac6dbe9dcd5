#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state management for Tile Merge.
//!
//! The [`World`] owns the board, the bookkeeping of the latest move, and the
//! animation timers. It changes only through [`apply`], which reports every
//! accepted mutation as an [`Event`]. Commands that arrive at the wrong time
//! (a move during the slide lock, a retry before the game-over overlay has
//! faded in) are dropped without producing events.

use std::time::Duration;

use tile_merge_core::{
    AnimationPhase, CellIndex, Command, Direction, Displacement, Event, Exponent, Grid,
    MergeFlags, SpawnOrigin, EMPTY,
};
use tile_merge_system_animation::{AnimationClock, FadeTimer, Timings};
use tile_merge_system_movement::slide;
use tracing::{debug, info, warn};

/// Bookkeeping of the most recent move that changed the board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LastMove {
    direction: Option<Direction>,
    displacements: Vec<Displacement>,
    merge_flags: MergeFlags,
}

impl LastMove {
    /// Direction of the move, or `None` before the first move of a game.
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Tiles that changed position during the move.
    #[must_use]
    pub fn displacements(&self) -> &[Displacement] {
        &self.displacements
    }

    /// Cells that absorbed a merge during the move.
    #[must_use]
    pub const fn merge_flags(&self) -> &MergeFlags {
        &self.merge_flags
    }
}

/// Represents the authoritative Tile Merge simulation state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    last_move: LastMove,
    appearing: Option<CellIndex>,
    clock: AnimationClock,
    fade: FadeTimer,
    game_over: bool,
}

impl World {
    /// Creates an empty world using the default animation timings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timings(Timings::default())
    }

    /// Creates an empty world using the provided animation timings.
    #[must_use]
    pub fn with_timings(timings: Timings) -> Self {
        Self {
            grid: Grid::new(),
            last_move: LastMove::default(),
            appearing: None,
            clock: AnimationClock::new(timings),
            fade: FadeTimer::new(timings.fade_in),
            game_over: false,
        }
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        self.grid = Grid::new();
        self.last_move = LastMove::default();
        self.appearing = None;
        self.clock.reset();
        self.fade.reset();
        self.game_over = false;
        info!("game_reset");
        out_events.push(Event::GameReset);
    }

    fn request_move(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.game_over {
            debug!(?direction, "move ignored after game over");
            return;
        }
        if !self.clock.accepts_moves() {
            debug!(?direction, "move ignored while tiles are sliding");
            return;
        }

        let outcome = slide(&self.grid, direction);
        if !outcome.changed() {
            debug!(?direction, "move left the board unchanged");
            return;
        }

        let (grid, displacements, merge_flags, score_delta) = outcome.into_parts();
        self.grid = grid;
        self.appearing = None;
        self.last_move = LastMove {
            direction: Some(direction),
            displacements: displacements.clone(),
            merge_flags,
        };

        out_events.push(Event::TilesSlid {
            direction,
            displacements,
            merged: merge_flags.merged_cells(),
            score_delta,
        });
        self.clock.begin_slide(merge_flags.any(), out_events);
        self.settle_finished_slide();
    }

    fn spawn_tile(
        &mut self,
        cell: CellIndex,
        exponent: Exponent,
        origin: SpawnOrigin,
        out_events: &mut Vec<Event>,
    ) {
        if exponent == EMPTY {
            warn!(cell = cell.get(), "spawn ignored: empty exponent");
            return;
        }
        if !self.grid.is_empty_cell(cell) {
            warn!(cell = cell.get(), "spawn ignored: cell occupied");
            return;
        }

        self.grid.set(cell, exponent);
        if origin == SpawnOrigin::AfterMove && self.clock.phase() == AnimationPhase::Sliding {
            self.appearing = Some(cell);
        }
        out_events.push(Event::TileSpawned {
            cell,
            exponent,
            origin,
        });
    }

    fn declare_game_over(&mut self, out_events: &mut Vec<Event>) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.fade.start();
        info!(max_exponent = self.grid.max_exponent(), "no legal move remains");
        out_events.push(Event::GameOver);
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });
        self.clock.advance(dt, out_events);
        self.settle_finished_slide();
        self.fade.advance(dt, out_events);
    }

    fn settle_finished_slide(&mut self) {
        if self.clock.phase() != AnimationPhase::Sliding {
            self.appearing = None;
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::NewGame => {
            if world.fade.is_running() {
                debug!("new game ignored while the game-over overlay fades in");
                return;
            }
            world.reset(out_events);
        }
        Command::Retry => {
            if !(world.game_over && world.fade.is_complete()) {
                debug!("retry ignored outside the settled game-over screen");
                return;
            }
            world.reset(out_events);
        }
        Command::RequestMove { direction } => world.request_move(direction, out_events),
        Command::SpawnTile {
            cell,
            exponent,
            origin,
        } => world.spawn_tile(cell, exponent, origin, out_events),
        Command::DeclareGameOver => world.declare_game_over(out_events),
        Command::Tick { dt } => world.tick(dt, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{LastMove, World};
    use tile_merge_core::{AnimationPhase, CellIndex, Grid};

    /// Provides read-only access to the board.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Provides read-only access to the bookkeeping of the latest move.
    #[must_use]
    pub fn last_move(world: &World) -> &LastMove {
        &world.last_move
    }

    /// Cell holding the tile spawned by the latest move while it is still appearing.
    #[must_use]
    pub fn appearing_tile(world: &World) -> Option<CellIndex> {
        world.appearing
    }

    /// Phase of the per-move animation cycle.
    #[must_use]
    pub fn animation_phase(world: &World) -> AnimationPhase {
        world.clock.phase()
    }

    /// Normalised slide progress in `0.0..=1.0`.
    #[must_use]
    pub fn slide_progress(world: &World) -> f32 {
        world.clock.slide_progress()
    }

    /// Normalised merge-pop progress in `0.0..=1.0`.
    #[must_use]
    pub fn pop_progress(world: &World) -> f32 {
        world.clock.pop_progress()
    }

    /// Reports whether the game reached the terminal state.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.game_over
    }

    /// Normalised fade-in progress of the game-over overlay.
    #[must_use]
    pub fn game_over_fade_progress(world: &World) -> f32 {
        world.fade.progress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_merge_core::CELL_COUNT;

    fn cell(index: usize) -> CellIndex {
        CellIndex::new(index).expect("index inside board")
    }

    fn world_with(cells: [Exponent; CELL_COUNT]) -> World {
        let mut world = World::new();
        world.grid = Grid::from_exponents(cells);
        world
    }

    fn tick(world: &mut World, millis: u64) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(millis),
            },
            &mut events,
        );
        events
    }

    #[test]
    fn new_game_clears_board_and_announces_reset() {
        let mut world = world_with([3; CELL_COUNT]);
        let mut events = Vec::new();
        apply(&mut world, Command::NewGame, &mut events);

        assert_eq!(events, vec![Event::GameReset]);
        assert_eq!(query::grid(&world), &Grid::new());
        assert!(!query::is_game_over(&world));
    }

    #[test]
    fn changed_move_commits_board_and_starts_slide() {
        let mut cells = [EMPTY; CELL_COUNT];
        cells[0] = 1;
        cells[1] = 1;
        let mut world = world_with(cells);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::RequestMove {
                direction: Direction::Right,
            },
            &mut events,
        );

        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::TilesSlid {
                direction,
                displacements,
                merged,
                score_delta,
            } => {
                assert_eq!(*direction, Direction::Right);
                assert_eq!(
                    displacements,
                    &vec![
                        Displacement::new(cell(1), cell(3)),
                        Displacement::new(cell(0), cell(3)),
                    ]
                );
                assert_eq!(merged, &vec![cell(3)]);
                assert_eq!(*score_delta, 4);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(query::grid(&world).get(cell(3)), 2);
        assert_eq!(query::animation_phase(&world), AnimationPhase::Sliding);
        assert_eq!(query::last_move(&world).direction(), Some(Direction::Right));
    }

    #[test]
    fn no_op_move_emits_nothing_and_keeps_clock_idle() {
        let mut cells = [EMPTY; CELL_COUNT];
        cells[3] = 1;
        let mut world = world_with(cells);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::RequestMove {
                direction: Direction::Right,
            },
            &mut events,
        );

        assert!(events.is_empty());
        assert_eq!(query::grid(&world), &Grid::from_exponents(cells));
        assert_eq!(query::animation_phase(&world), AnimationPhase::Idle);
        assert!(query::last_move(&world).displacements().is_empty());
    }

    #[test]
    fn moves_are_rejected_while_sliding() {
        let mut cells = [EMPTY; CELL_COUNT];
        cells[0] = 1;
        cells[15] = 2;
        let mut world = world_with(cells);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::RequestMove {
                direction: Direction::Right,
            },
            &mut events,
        );
        let after_first = *query::grid(&world);
        events.clear();

        apply(
            &mut world,
            Command::RequestMove {
                direction: Direction::Left,
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(query::grid(&world), &after_first);

        let finished = tick(&mut world, 120);
        assert!(finished.contains(&Event::SlideFinished));
        assert_ne!(query::animation_phase(&world), AnimationPhase::Sliding);
    }

    #[test]
    fn merge_pop_follows_slide_when_tiles_merged() {
        let mut cells = [EMPTY; CELL_COUNT];
        cells[0] = 2;
        cells[4] = 2;
        let mut world = world_with(cells);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RequestMove {
                direction: Direction::Up,
            },
            &mut events,
        );

        let events = tick(&mut world, 120);
        assert_eq!(
            events,
            vec![
                Event::TimeAdvanced {
                    dt: Duration::from_millis(120)
                },
                Event::SlideFinished
            ]
        );
        assert_eq!(query::animation_phase(&world), AnimationPhase::MergePop);
        assert!(query::last_move(&world).merge_flags().is_set(cell(0)));

        let events = tick(&mut world, 100);
        assert!(events.contains(&Event::MergePopFinished));
        assert_eq!(query::animation_phase(&world), AnimationPhase::Idle);
    }

    #[test]
    fn spawn_after_move_marks_appearing_tile_until_slide_ends() {
        let mut cells = [EMPTY; CELL_COUNT];
        cells[1] = 1;
        let mut world = world_with(cells);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RequestMove {
                direction: Direction::Left,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnTile {
                cell: cell(9),
                exponent: 2,
                origin: SpawnOrigin::AfterMove,
            },
            &mut events,
        );

        assert_eq!(query::appearing_tile(&world), Some(cell(9)));
        let _ = tick(&mut world, 120);
        assert_eq!(query::appearing_tile(&world), None);
        assert_eq!(query::grid(&world).get(cell(9)), 2);
    }

    #[test]
    fn spawn_into_occupied_cell_is_ignored() {
        let mut cells = [EMPTY; CELL_COUNT];
        cells[5] = 3;
        let mut world = world_with(cells);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnTile {
                cell: cell(5),
                exponent: 1,
                origin: SpawnOrigin::AfterMove,
            },
            &mut events,
        );

        assert!(events.is_empty());
        assert_eq!(query::grid(&world).get(cell(5)), 3);
    }

    #[test]
    fn game_over_blocks_moves_and_gates_restart_on_fade() {
        let mut world = world_with([1, 2, 1, 2, 2, 1, 2, 1, 1, 2, 1, 2, 2, 1, 2, 1]);
        let mut events = Vec::new();
        apply(&mut world, Command::DeclareGameOver, &mut events);
        assert_eq!(events, vec![Event::GameOver]);
        assert!(query::is_game_over(&world));

        events.clear();
        apply(&mut world, Command::NewGame, &mut events);
        apply(&mut world, Command::Retry, &mut events);
        assert!(events.is_empty(), "restart gated while the overlay fades in");

        let faded = tick(&mut world, 1_000);
        assert!(faded.contains(&Event::GameOverFadeFinished));
        assert_eq!(query::game_over_fade_progress(&world), 1.0);

        apply(&mut world, Command::Retry, &mut events);
        assert_eq!(events, vec![Event::GameReset]);
        assert!(!query::is_game_over(&world));
        assert_eq!(query::game_over_fade_progress(&world), 0.0);
    }

    #[test]
    fn retry_is_ignored_during_play() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::Retry, &mut events);
        assert!(events.is_empty());
    }
}
