//! Line-oriented terminal backend driven by a key script.
//!
//! Each script character is one frame of input: `U`, `D`, `L` and `R` slide
//! the board, `N` starts a new game, `T` retries after a game over, `.` is an
//! idle frame and `Q` quits. After every input the backend keeps feeding
//! idle frames until the scene stops animating, then prints the board.
//!
//! The board is drawn from [`Scene::tiles`], so a tile caught mid-slide is
//! shown in the cell its centre currently covers. With colour enabled, tiles
//! and the game-over banner are painted with 24-bit ANSI escapes taken from
//! the palette.

use std::{
    fmt::Write as _,
    io::{BufRead, Write},
    time::Duration,
};

use anyhow::{bail, Context, Result as AnyResult};
use tile_merge_core::{CellIndex, Direction, CELL_COUNT, EMPTY, GRID_COLUMNS, GRID_ROWS};
use tile_merge_rendering::{
    palette, Color, FrameInput, Presentation, RenderingBackend, Scene, TileSprite,
};
use tracing::{debug, warn};

const CELL_WIDTH: usize = 6;
const SETTLE_FRAME_LIMIT: usize = 10_000;
const RESET: &str = "\x1b[0m";

/// Terminal presenter reading scripted input from `input` and writing boards to `output`.
pub(crate) struct TerminalBackend<R, W> {
    input: R,
    output: W,
    frame_delta: Duration,
    colored: bool,
}

impl<R, W> TerminalBackend<R, W>
where
    R: BufRead,
    W: Write,
{
    /// Creates a backend stepping the simulation by `frame_delta` per frame.
    pub(crate) fn new(input: R, output: W, frame_delta: Duration) -> Self {
        Self {
            input,
            output,
            frame_delta,
            colored: false,
        }
    }

    /// Paints tiles and banners with ANSI colours when `colored` is set.
    #[must_use]
    pub(crate) fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    fn print_board(&mut self, scene: &Scene) -> AnyResult<()> {
        self.output
            .write_all(render_board(scene, self.colored).as_bytes())
            .context("failed to write board")
    }

    fn settle<F>(&mut self, scene: &mut Scene, update_scene: &mut F)
    where
        F: FnMut(Duration, FrameInput, &mut Scene),
    {
        let mut frames = 0;
        while scene.is_animating() {
            if frames == SETTLE_FRAME_LIMIT {
                warn!(frames, "animation did not settle");
                return;
            }
            update_scene(self.frame_delta, FrameInput::default(), scene);
            frames += 1;
        }
        debug!(frames, "animation settled");
    }
}

impl<R, W> RenderingBackend for TerminalBackend<R, W>
where
    R: BufRead,
    W: Write,
{
    fn run<F>(mut self, presentation: Presentation, mut update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene),
    {
        let mut scene = presentation.scene;
        let title = if self.colored {
            format!(
                "{}{}{}{RESET}",
                background(presentation.clear_color),
                foreground(palette::TEXT),
                presentation.window_title
            )
        } else {
            presentation.window_title
        };
        writeln!(self.output, "{title}").context("failed to write title")?;
        self.print_board(&scene)?;

        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .input
                .read_line(&mut line)
                .context("failed to read input script")?;
            if read == 0 {
                break;
            }

            for input in parse_script(&line)? {
                if input.quit {
                    return self.output.flush().context("failed to flush output");
                }
                update_scene(self.frame_delta, input, &mut scene);
                self.settle(&mut scene, &mut update_scene);
                self.print_board(&scene)?;
            }
        }

        self.output.flush().context("failed to flush output")
    }
}

/// Translates script characters into per-frame inputs; whitespace is skipped.
pub(crate) fn parse_script(script: &str) -> AnyResult<Vec<FrameInput>> {
    let mut inputs = Vec::new();
    for (position, key) in script.chars().enumerate() {
        if key.is_whitespace() {
            continue;
        }
        let mut input = FrameInput::default();
        match key.to_ascii_uppercase() {
            'U' => input.direction = Some(Direction::Up),
            'D' => input.direction = Some(Direction::Down),
            'L' => input.direction = Some(Direction::Left),
            'R' => input.direction = Some(Direction::Right),
            'N' => input.new_game = true,
            'T' => input.retry = true,
            'Q' => input.quit = true,
            '.' => {}
            other => bail!("unknown script key `{other}` at position {position}"),
        }
        inputs.push(input);
    }
    Ok(inputs)
}

/// Formats the score line and the board as text.
pub(crate) fn render_board(scene: &Scene, colored: bool) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "score {}  best {}", scene.score, scene.highscore);
    let separator = format!("+{}\n", format!("{}+", "-".repeat(CELL_WIDTH)).repeat(GRID_COLUMNS));
    let sprites = sprites_by_cell(scene);

    text.push_str(&separator);
    for row in 0..GRID_ROWS {
        text.push('|');
        for column in 0..GRID_COLUMNS {
            let sprite = CellIndex::from_coords(column, row).and_then(|cell| sprites[cell.get()]);
            let label = sprite
                .map(|sprite| tile_label(sprite.exponent))
                .unwrap_or_default();
            let label = format!("{label:>width$} ", width = CELL_WIDTH - 1);
            if colored {
                let (fill, ink) = match sprite {
                    Some(sprite) => (sprite.color, palette::tile_text(sprite.exponent)),
                    None => (palette::tile(EMPTY), palette::TEXT),
                };
                let _ = write!(text, "{}{}{label}{RESET}|", background(fill), foreground(ink));
            } else {
                text.push_str(&label);
                text.push('|');
            }
        }
        text.push('\n');
        text.push_str(&separator);
    }

    if let Some(overlay) = scene.overlay_color() {
        if colored {
            let shade = palette::BACKGROUND.lerp(overlay, overlay.alpha);
            let _ = writeln!(
                text,
                "{}{}game over{RESET}",
                background(shade),
                foreground(palette::TEXT)
            );
        } else {
            text.push_str("game over\n");
        }
    }
    text
}

/// Last sprite painted over each cell, keyed by the cell its centre falls in.
fn sprites_by_cell(scene: &Scene) -> [Option<TileSprite>; CELL_COUNT] {
    let mut cells = [None; CELL_COUNT];
    for sprite in scene.tiles() {
        let column = sprite.center.x.floor() as usize;
        let row = sprite.center.y.floor() as usize;
        if let Some(cell) = CellIndex::from_coords(column, row) {
            cells[cell.get()] = Some(sprite);
        }
    }
    cells
}

fn background(color: Color) -> String {
    let [red, green, blue] = color.to_rgb_u8();
    format!("\x1b[48;2;{red};{green};{blue}m")
}

fn foreground(color: Color) -> String {
    let [red, green, blue] = color.to_rgb_u8();
    format!("\x1b[38;2;{red};{green};{blue}m")
}

fn tile_label(exponent: u8) -> String {
    match 1u64.checked_shl(u32::from(exponent)) {
        Some(value) => value.to_string(),
        None => format!("2^{exponent}"),
    }
}
