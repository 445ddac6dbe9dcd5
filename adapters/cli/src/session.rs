//! Frame loop host wiring the world to its systems.

use std::time::Duration;

use tile_merge_core::{Command, Event};
use tile_merge_rendering::{FrameInput, Scene};
use tile_merge_system_scoring::{HighscoreStore, Scoreboard};
use tile_merge_system_spawning::{Config as SpawningConfig, Spawning};
use tile_merge_world::{self as world, query, World};
use tracing::info;

use crate::config::GameConfig;

/// Live game: authoritative world, spawning, scoring and the high score store.
pub(crate) struct Session {
    world: World,
    spawning: Spawning,
    scoreboard: Scoreboard,
    store: Box<dyn HighscoreStore>,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl Session {
    /// Builds a session from `config` and starts the first game.
    pub(crate) fn start(config: &mut GameConfig, mut store: Box<dyn HighscoreStore>) -> Self {
        let seed = config.resolve_seed();
        info!(seed, "session starting");

        let scoreboard = Scoreboard::with_store(store.as_mut());
        let mut session = Self {
            world: World::with_timings(config.timings()),
            spawning: Spawning::new(SpawningConfig::new(seed)),
            scoreboard,
            store,
            events: Vec::new(),
            commands: Vec::new(),
        };
        session.submit(Command::NewGame);
        session
    }

    /// Runs one frame: timers first, then the frame's input.
    pub(crate) fn frame(&mut self, dt: Duration, input: FrameInput) {
        self.submit(Command::Tick { dt });
        for command in commands_for(input) {
            self.submit(command);
        }
    }

    /// Applies `command` and pumps systems until no follow-up commands remain.
    pub(crate) fn submit(&mut self, command: Command) {
        self.commands.push(command);
        while !self.commands.is_empty() {
            self.events.clear();
            for command in self.commands.drain(..) {
                world::apply(&mut self.world, command, &mut self.events);
            }

            self.scoreboard.handle(&self.events, self.store.as_mut());
            self.spawning
                .handle(&self.events, query::grid(&self.world), &mut self.commands);
        }
    }

    /// Persists a beaten high score before the host exits.
    pub(crate) fn shutdown(&mut self) {
        info!(score = self.scoreboard.score(), "session ending");
        self.scoreboard.on_shutdown(self.store.as_mut());
    }

    /// Current scoreboard.
    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Copies the renderer-facing state into `scene`.
    pub(crate) fn refresh_scene(&self, scene: &mut Scene) {
        let last_move = query::last_move(&self.world);
        scene.grid = *query::grid(&self.world);
        scene.displacements.clear();
        scene
            .displacements
            .extend_from_slice(last_move.displacements());
        scene.merged = *last_move.merge_flags();
        scene.appearing = query::appearing_tile(&self.world);
        scene.phase = query::animation_phase(&self.world);
        scene.slide_progress = query::slide_progress(&self.world);
        scene.pop_progress = query::pop_progress(&self.world);
        scene.score = self.scoreboard.score();
        scene.highscore = self.scoreboard.highscore();
        scene.game_over = query::is_game_over(&self.world);
        scene.fade_progress = query::game_over_fade_progress(&self.world);
    }

    /// Fresh scene describing the current state.
    pub(crate) fn scene(&self) -> Scene {
        let mut scene = Scene::default();
        self.refresh_scene(&mut scene);
        scene
    }
}

fn commands_for(input: FrameInput) -> impl Iterator<Item = Command> {
    let new_game = input.new_game.then_some(Command::NewGame);
    let retry = input.retry.then_some(Command::Retry);
    let movement = input
        .direction
        .map(|direction| Command::RequestMove { direction });
    new_game.into_iter().chain(retry).chain(movement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};
    use tile_merge_core::{AnimationPhase, Direction, Score, CELL_COUNT};
    use tile_merge_system_scoring::StoreError;

    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<Vec<Score>>>);

    impl HighscoreStore for SharedStore {
        fn load(&mut self) -> Result<Option<Score>, StoreError> {
            Ok(self.0.borrow().last().copied())
        }

        fn save(&mut self, highscore: Score) -> Result<(), StoreError> {
            self.0.borrow_mut().push(highscore);
            Ok(())
        }
    }

    fn config(seed: u64) -> GameConfig {
        GameConfig {
            seed: Some(seed),
            ..GameConfig::default()
        }
    }

    fn press(direction: Direction) -> FrameInput {
        FrameInput {
            direction: Some(direction),
            ..FrameInput::default()
        }
    }

    #[test]
    fn start_seeds_two_tiles() {
        let session = Session::start(&mut config(3), Box::new(SharedStore::default()));
        let scene = session.scene();
        assert_eq!(scene.grid.empty_cells().len(), CELL_COUNT - 2);
        assert_eq!(scene.score, 0);
        assert!(!scene.game_over);
    }

    #[test]
    fn move_is_locked_until_slide_finishes() {
        let mut session = Session::start(&mut config(11), Box::new(SharedStore::default()));
        let dt = Duration::from_millis(16);

        let moved = Direction::ALL.into_iter().find(|direction| {
            session.frame(dt, press(*direction));
            session.scene().phase == AnimationPhase::Sliding
        });
        assert!(moved.is_some(), "some direction changes a two-tile board");

        let before = session.scene().grid;
        for direction in Direction::ALL {
            session.frame(Duration::ZERO, press(direction));
        }
        assert_eq!(session.scene().grid, before, "moves ignored while sliding");
        assert!(session.scene().appearing.is_some());

        session.frame(Duration::from_millis(500), FrameInput::default());
        let scene = session.scene();
        assert_eq!(scene.phase, AnimationPhase::Idle);
        assert_eq!(scene.appearing, None);
    }

    #[test]
    fn tick_runs_before_input_in_a_frame() {
        let mut session = Session::start(&mut config(21), Box::new(SharedStore::default()));
        for direction in Direction::ALL {
            session.frame(Duration::from_secs(1), press(direction));
            if session.scene().phase == AnimationPhase::Sliding {
                // a slide started this frame has not been decremented yet
                assert_eq!(session.scene().slide_progress, 0.0);
                return;
            }
        }
        panic!("no direction moved the seeded board");
    }

    #[test]
    fn deterministic_replay_yields_identical_frames() {
        let run = |seed: u64| {
            let mut session = Session::start(&mut config(seed), Box::new(SharedStore::default()));
            let mut frames = Vec::new();
            for step in 0..400 {
                let direction = Direction::ALL[(step / 3) % Direction::ALL.len()];
                let input = if step % 3 == 0 {
                    press(direction)
                } else {
                    FrameInput::default()
                };
                session.frame(Duration::from_millis(70), input);
                frames.push(session.scene());
            }
            frames
        };

        assert_eq!(run(0x2048), run(0x2048));
        assert_ne!(run(0x2048), run(0x4096));
    }

    #[test]
    fn shutdown_saves_a_beaten_highscore() {
        let store = SharedStore::default();
        let saves = Rc::clone(&store.0);
        let mut session = Session::start(&mut config(5), Box::new(store));

        let mut step = 0usize;
        while session.scoreboard().score() == 0 && step < 1_000 {
            let direction = Direction::ALL[step % Direction::ALL.len()];
            session.frame(Duration::from_millis(250), press(direction));
            step += 1;
        }
        assert!(session.scoreboard().score() > 0, "a merge eventually scores");

        session.shutdown();
        let saved = saves.borrow().last().copied();
        assert_eq!(saved, Some(session.scoreboard().highscore()));
    }

    #[test]
    fn input_maps_to_commands_in_fixed_order() {
        let input = FrameInput {
            direction: Some(Direction::Up),
            new_game: true,
            retry: true,
            quit: false,
        };
        let commands: Vec<Command> = commands_for(input).collect();
        assert_eq!(
            commands,
            vec![
                Command::NewGame,
                Command::Retry,
                Command::RequestMove {
                    direction: Direction::Up
                },
            ]
        );
        assert_eq!(commands_for(FrameInput::default()).count(), 0);
    }
}
