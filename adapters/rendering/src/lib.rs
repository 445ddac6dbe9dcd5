#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for tile-merge adapters.
//!
//! A [`Scene`] is a plain snapshot of everything a renderer needs for one
//! frame. Positions are expressed in tile units with the board's top-left
//! corner at the origin, leaving pixel layout to the backend.

use anyhow::Result as AnyResult;
use glam::Vec2;
use std::time::Duration;
use tile_merge_core::{
    AnimationPhase, CellIndex, Direction, Displacement, Exponent, Grid, MergeFlags, Score, EMPTY,
};

/// Extra size, relative to a tile, reached at the peak of the merge-pop.
pub const MERGE_POP_GROWTH: f32 = 0.2;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self::from_rgba_u8(red, green, blue, 255)
    }

    /// Creates a color from byte RGBA values.
    #[must_use]
    pub const fn from_rgba_u8(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: alpha as f32 / 255.0,
        }
    }

    /// Blends towards `other`; `t` is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            red: self.red + (other.red - self.red) * t,
            green: self.green + (other.green - self.green) * t,
            blue: self.blue + (other.blue - self.blue) * t,
            alpha: self.alpha + (other.alpha - self.alpha) * t,
        }
    }

    /// Byte RGB channels, rounded; alpha is dropped.
    #[must_use]
    pub fn to_rgb_u8(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
            .map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Returns the color with its alpha multiplied by `factor`.
    #[must_use]
    pub fn fade(self, factor: f32) -> Self {
        Self {
            alpha: self.alpha * factor.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Fixed colors of the board.
pub mod palette {
    use super::Color;
    use tile_merge_core::Exponent;

    /// Window background.
    pub const BACKGROUND: Color = Color::from_rgb_u8(250, 248, 239);
    /// Board frame behind the tiles.
    pub const BOARD: Color = Color::from_rgb_u8(187, 173, 160);
    /// Digits on light tiles and general text.
    pub const TEXT: Color = Color::from_rgb_u8(119, 110, 101);
    /// Digits on dark tiles.
    pub const TEXT_ALT: Color = Color::from_rgb_u8(249, 246, 242);
    /// Game-over overlay at full opacity.
    pub const GAME_OVER_OVERLAY: Color = Color::from_rgba_u8(245, 235, 225, 170);

    const TILES: [Color; 13] = [
        Color::from_rgb_u8(205, 193, 180),
        Color::from_rgb_u8(238, 228, 218),
        Color::from_rgb_u8(238, 225, 201),
        Color::from_rgb_u8(243, 178, 122),
        Color::from_rgb_u8(246, 150, 100),
        Color::from_rgb_u8(247, 124, 95),
        Color::from_rgb_u8(247, 95, 59),
        Color::from_rgb_u8(234, 207, 118),
        Color::from_rgb_u8(237, 203, 103),
        Color::from_rgb_u8(236, 200, 90),
        Color::from_rgb_u8(231, 194, 87),
        Color::from_rgb_u8(232, 190, 78),
        Color::from_rgb_u8(60, 58, 50),
    ];

    /// Fill color of a tile; exponents past 2048 share the last entry.
    #[must_use]
    pub fn tile(exponent: Exponent) -> Color {
        TILES[usize::from(exponent).min(TILES.len() - 1)]
    }

    /// Digit color drawn on top of a tile.
    #[must_use]
    pub fn tile_text(exponent: Exponent) -> Color {
        if exponent > 2 {
            TEXT_ALT
        } else {
            TEXT
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Direction pressed on this frame, if any.
    pub direction: Option<Direction>,
    /// Whether the "new game" control was activated.
    pub new_game: bool,
    /// Whether the "try again" control was activated.
    pub retry: bool,
    /// Whether the player asked to leave.
    pub quit: bool,
}

/// Single tile quad the renderer should draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSprite {
    /// Exponent whose value is printed on the tile.
    pub exponent: Exponent,
    /// Centre of the tile in tile units.
    pub center: Vec2,
    /// Edge length relative to a regular tile.
    pub scale: f32,
    /// Fill color.
    pub color: Color,
}

/// Snapshot of the board and its animations for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    /// Committed board after the most recent move and spawn.
    pub grid: Grid,
    /// Movements produced by the most recent move.
    pub displacements: Vec<Displacement>,
    /// Cells that received a merge during the most recent move.
    pub merged: MergeFlags,
    /// Tile spawned after the most recent move, while it is still appearing.
    pub appearing: Option<CellIndex>,
    /// Animation phase currently running.
    pub phase: AnimationPhase,
    /// Normalised slide progress.
    pub slide_progress: f32,
    /// Normalised merge-pop progress.
    pub pop_progress: f32,
    /// Points earned in the current game.
    pub score: Score,
    /// Best score known to the session.
    pub highscore: Score,
    /// Whether the game has ended.
    pub game_over: bool,
    /// Normalised progress of the game-over fade-in.
    pub fade_progress: f32,
}

impl Scene {
    /// Reports whether `cell` is the destination of a tile that is still sliding.
    #[must_use]
    pub fn is_cell_in_motion(&self, cell: CellIndex) -> bool {
        self.phase == AnimationPhase::Sliding
            && self
                .displacements
                .iter()
                .any(|displacement| displacement.to() == cell)
    }

    /// Reports whether `cell` holds the freshly spawned tile that is still growing.
    #[must_use]
    pub fn is_cell_appearing(&self, cell: CellIndex) -> bool {
        self.phase == AnimationPhase::Sliding && self.appearing == Some(cell)
    }

    /// Reports whether a move animation or the game-over fade is still playing.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.phase != AnimationPhase::Idle || (self.game_over && self.fade_progress < 1.0)
    }

    /// Tiles to draw this frame, in painting order.
    ///
    /// Resting tiles come first, followed by sliding tiles and finally the
    /// appearing tile.
    #[must_use]
    pub fn tiles(&self) -> Vec<TileSprite> {
        let mut sprites = Vec::new();
        self.push_resting_tiles(&mut sprites);
        if self.phase == AnimationPhase::Sliding {
            self.push_sliding_tiles(&mut sprites);
            self.push_appearing_tile(&mut sprites);
        }
        sprites
    }

    /// Overlay drawn over the board once the game has ended.
    #[must_use]
    pub fn overlay_color(&self) -> Option<Color> {
        self.game_over
            .then(|| palette::GAME_OVER_OVERLAY.fade(self.fade_progress))
    }

    fn push_resting_tiles(&self, sprites: &mut Vec<TileSprite>) {
        for cell in CellIndex::all() {
            let exponent = self.grid.get(cell);
            if exponent == EMPTY || self.is_cell_in_motion(cell) || self.is_cell_appearing(cell) {
                continue;
            }

            let scale = if self.phase == AnimationPhase::MergePop && self.merged.is_set(cell) {
                1.0 + MERGE_POP_GROWTH * pop_curve(self.pop_progress)
            } else {
                1.0
            };
            sprites.push(TileSprite {
                exponent,
                center: cell_center(cell),
                scale,
                color: palette::tile(exponent),
            });
        }
    }

    fn push_sliding_tiles(&self, sprites: &mut Vec<TileSprite>) {
        let t = self.slide_progress.clamp(0.0, 1.0);
        for displacement in &self.displacements {
            let destination = displacement.to();
            let settled = self.grid.get(destination);
            let merged = self.merged.is_set(destination);
            let exponent = if merged {
                settled.saturating_sub(1)
            } else {
                settled
            };
            let color = palette::tile(exponent).lerp(palette::tile(settled), t);

            if merged && self.arrivals(destination) == 1 {
                sprites.push(TileSprite {
                    exponent,
                    center: cell_center(destination),
                    scale: 1.0,
                    color,
                });
            }

            let from = cell_center(displacement.from());
            let to = cell_center(destination);
            sprites.push(TileSprite {
                exponent,
                center: from.lerp(to, t),
                scale: 1.0,
                color,
            });
        }
    }

    fn push_appearing_tile(&self, sprites: &mut Vec<TileSprite>) {
        let Some(cell) = self.appearing else {
            return;
        };
        let exponent = self.grid.get(cell);
        if exponent == EMPTY {
            return;
        }
        sprites.push(TileSprite {
            exponent,
            center: cell_center(cell),
            scale: self.slide_progress.clamp(0.0, 1.0),
            color: palette::tile(exponent),
        });
    }

    fn arrivals(&self, cell: CellIndex) -> usize {
        self.displacements
            .iter()
            .filter(|displacement| displacement.to() == cell)
            .count()
    }
}

/// Centre of `cell` in tile units.
#[must_use]
pub fn cell_center(cell: CellIndex) -> Vec2 {
    Vec2::new(cell.column() as f32 + 0.5, cell.row() as f32 + 0.5)
}

fn pop_curve(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    -4.0 * t * (t - 1.0)
}

/// Static presentation data required to start a backend.
#[derive(Clone, Debug)]
pub struct Presentation {
    /// Title used by the created window or banner.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed first.
    pub scene: Scene,
}

impl Presentation {
    /// Creates a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backends capable of presenting tile-merge scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta, per-frame
    /// input captured by the adapter, and refreshes the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_merge_core::CELL_COUNT;

    fn cell(index: usize) -> CellIndex {
        CellIndex::new(index).expect("index inside board")
    }

    fn merged_row_scene(progress: f32) -> Scene {
        // [1,1,0,0] slid left into [2,0,0,0]
        let mut cells = [EMPTY; CELL_COUNT];
        cells[0] = 2;
        Scene {
            grid: Grid::from_exponents(cells),
            displacements: vec![Displacement::new(cell(1), cell(0))],
            merged: MergeFlags::from_cells(&[cell(0)]),
            phase: AnimationPhase::Sliding,
            slide_progress: progress,
            ..Scene::default()
        }
    }

    #[test]
    fn palette_clamps_large_exponents() {
        assert_eq!(palette::tile(12), palette::tile(40));
        assert_ne!(palette::tile(11), palette::tile(12));
        assert_eq!(palette::tile_text(2), palette::TEXT);
        assert_eq!(palette::tile_text(3), palette::TEXT_ALT);
        assert_eq!(palette::tile(1).to_rgb_u8(), [238, 228, 218]);
        assert_eq!(palette::BOARD.fade(0.0).to_rgb_u8(), [187, 173, 160]);
    }

    #[test]
    fn cell_center_uses_tile_units() {
        assert_eq!(cell_center(cell(0)), Vec2::new(0.5, 0.5));
        assert_eq!(cell_center(cell(7)), Vec2::new(3.5, 1.5));
    }

    #[test]
    fn destinations_are_in_motion_only_while_sliding() {
        let mut scene = merged_row_scene(0.3);
        assert!(scene.is_cell_in_motion(cell(0)));
        assert!(!scene.is_cell_in_motion(cell(1)));

        scene.phase = AnimationPhase::MergePop;
        assert!(!scene.is_cell_in_motion(cell(0)));
    }

    #[test]
    fn sliding_tile_interpolates_between_cells() {
        let scene = merged_row_scene(0.5);
        let sprites = scene.tiles();

        // stationary merge partner plus the mover
        assert_eq!(sprites.len(), 2);
        assert_eq!(sprites[0].center, cell_center(cell(0)));
        assert_eq!(sprites[0].exponent, 1);
        assert_eq!(sprites[1].center, Vec2::new(1.0, 0.5));
        assert_eq!(
            sprites[1].color,
            palette::tile(1).lerp(palette::tile(2), 0.5)
        );
    }

    #[test]
    fn two_movers_into_one_cell_draw_no_partner() {
        let mut cells = [EMPTY; CELL_COUNT];
        cells[0] = 2;
        let scene = Scene {
            grid: Grid::from_exponents(cells),
            displacements: vec![
                Displacement::new(cell(2), cell(0)),
                Displacement::new(cell(3), cell(0)),
            ],
            merged: MergeFlags::from_cells(&[cell(0)]),
            phase: AnimationPhase::Sliding,
            slide_progress: 0.0,
            ..Scene::default()
        };

        let sprites = scene.tiles();
        assert_eq!(sprites.len(), 2);
        assert_eq!(sprites[0].center, cell_center(cell(2)));
        assert_eq!(sprites[1].center, cell_center(cell(3)));
    }

    #[test]
    fn merge_pop_peaks_halfway() {
        let mut scene = merged_row_scene(1.0);
        scene.phase = AnimationPhase::MergePop;
        scene.pop_progress = 0.5;

        let sprites = scene.tiles();
        assert_eq!(sprites.len(), 1);
        assert!((sprites[0].scale - (1.0 + MERGE_POP_GROWTH)).abs() < 1e-6);
        assert_eq!(sprites[0].exponent, 2);
    }

    #[test]
    fn appearing_tile_grows_with_slide() {
        let mut cells = [EMPTY; CELL_COUNT];
        cells[5] = 1;
        let mut scene = Scene {
            grid: Grid::from_exponents(cells),
            appearing: Some(cell(5)),
            phase: AnimationPhase::Sliding,
            slide_progress: 0.25,
            ..Scene::default()
        };

        let sprites = scene.tiles();
        assert_eq!(sprites.len(), 1);
        assert!((sprites[0].scale - 0.25).abs() < 1e-6);

        scene.phase = AnimationPhase::Idle;
        let sprites = scene.tiles();
        assert_eq!(sprites[0].scale, 1.0);
    }

    #[test]
    fn overlay_fades_in_with_progress() {
        let mut scene = Scene::default();
        assert_eq!(scene.overlay_color(), None);

        scene.game_over = true;
        scene.fade_progress = 0.5;
        let overlay = scene.overlay_color().expect("overlay while game over");
        assert!((overlay.alpha - palette::GAME_OVER_OVERLAY.alpha * 0.5).abs() < 1e-6);
        assert!(scene.is_animating(), "fade still running");

        scene.fade_progress = 1.0;
        assert!(!scene.is_animating());
    }
}
