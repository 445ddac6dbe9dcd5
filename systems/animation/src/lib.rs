#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Countdown timers that sequence the slide and merge-pop phases of a move.
//!
//! The [`AnimationClock`] cycles `Idle → Sliding → (MergePop) → Idle`. While
//! sliding the clock holds the move lock; the world consults
//! [`AnimationClock::accepts_moves`] before running the move engine. Timers are
//! driven exclusively by the `dt` supplied to [`AnimationClock::advance`], so the
//! animation length does not depend on frame rate and tests can feed synthetic
//! time steps.

use std::time::Duration;

use tile_merge_core::{
    AnimationPhase, Event, DEFAULT_GAME_OVER_FADE_DURATION, DEFAULT_MERGE_POP_DURATION,
    DEFAULT_SLIDE_DURATION,
};
use tracing::debug;

/// Fixed durations used by the animation timers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timings {
    /// Length of the slide phase.
    pub slide: Duration,
    /// Length of the merge-pop phase.
    pub merge_pop: Duration,
    /// Length of the game-over fade-in.
    pub fade_in: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            slide: DEFAULT_SLIDE_DURATION,
            merge_pop: DEFAULT_MERGE_POP_DURATION,
            fade_in: DEFAULT_GAME_OVER_FADE_DURATION,
        }
    }
}

/// Phase machine sequencing per-move animations.
#[derive(Clone, Debug)]
pub struct AnimationClock {
    slide_duration: Duration,
    merge_pop_duration: Duration,
    phase: AnimationPhase,
    remaining: Duration,
    pop_pending: bool,
}

impl AnimationClock {
    /// Creates an idle clock using the provided phase durations.
    #[must_use]
    pub fn new(timings: Timings) -> Self {
        Self {
            slide_duration: timings.slide,
            merge_pop_duration: timings.merge_pop,
            phase: AnimationPhase::Idle,
            remaining: Duration::ZERO,
            pop_pending: false,
        }
    }

    /// Phase currently running.
    #[must_use]
    pub const fn phase(&self) -> AnimationPhase {
        self.phase
    }

    /// Reports whether a new move may start. Moves are locked out while sliding.
    #[must_use]
    pub fn accepts_moves(&self) -> bool {
        self.phase != AnimationPhase::Sliding
    }

    /// Starts the slide phase of a move that changed the board.
    ///
    /// `merged` records whether the move produced a merge, which decides if the
    /// merge-pop phase follows. A zero slide duration finishes the slide at once.
    pub fn begin_slide(&mut self, merged: bool, out: &mut Vec<Event>) {
        self.phase = AnimationPhase::Sliding;
        self.remaining = self.slide_duration;
        self.pop_pending = merged;
        if self.remaining.is_zero() {
            self.finish_slide(Duration::ZERO, out);
        }
    }

    /// Advances the running countdown by `dt`, emitting phase completion events.
    ///
    /// Time left over after the slide ends carries into the merge-pop phase.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Event>) {
        match self.phase {
            AnimationPhase::Idle => {}
            AnimationPhase::Sliding => {
                if dt < self.remaining {
                    self.remaining -= dt;
                    return;
                }
                let overshoot = dt - self.remaining;
                self.finish_slide(overshoot, out);
            }
            AnimationPhase::MergePop => self.count_down_pop(dt, out),
        }
    }

    /// Normalised slide progress in `0.0..=1.0`; complete outside the slide phase.
    #[must_use]
    pub fn slide_progress(&self) -> f32 {
        match self.phase {
            AnimationPhase::Sliding => progress(self.remaining, self.slide_duration),
            AnimationPhase::Idle | AnimationPhase::MergePop => 1.0,
        }
    }

    /// Normalised merge-pop progress in `0.0..=1.0`; zero before the phase starts.
    #[must_use]
    pub fn pop_progress(&self) -> f32 {
        match self.phase {
            AnimationPhase::MergePop => progress(self.remaining, self.merge_pop_duration),
            AnimationPhase::Sliding => 0.0,
            AnimationPhase::Idle => 1.0,
        }
    }

    /// Returns the clock to idle, dropping any running phase.
    pub fn reset(&mut self) {
        self.phase = AnimationPhase::Idle;
        self.remaining = Duration::ZERO;
        self.pop_pending = false;
    }

    fn finish_slide(&mut self, overshoot: Duration, out: &mut Vec<Event>) {
        out.push(Event::SlideFinished);
        if !self.pop_pending {
            debug!("slide finished without merges");
            self.reset();
            return;
        }

        self.pop_pending = false;
        self.phase = AnimationPhase::MergePop;
        self.remaining = self.merge_pop_duration;
        self.count_down_pop(overshoot, out);
    }

    fn count_down_pop(&mut self, dt: Duration, out: &mut Vec<Event>) {
        self.remaining = self.remaining.saturating_sub(dt);
        if self.remaining.is_zero() {
            out.push(Event::MergePopFinished);
            self.reset();
        }
    }
}

/// One-shot countdown for the game-over overlay.
#[derive(Clone, Debug)]
pub struct FadeTimer {
    duration: Duration,
    remaining: Option<Duration>,
}

impl FadeTimer {
    /// Creates an inactive fade timer.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self {
            duration,
            remaining: None,
        }
    }

    /// Starts the fade from the beginning.
    pub fn start(&mut self) {
        self.remaining = Some(self.duration);
    }

    /// Stops the fade and forgets its progress.
    pub fn reset(&mut self) {
        self.remaining = None;
    }

    /// Reports whether the fade was started and has not completed yet.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.remaining.is_some_and(|remaining| !remaining.is_zero())
    }

    /// Reports whether the fade was started and ran to completion.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining.is_some_and(|remaining| remaining.is_zero())
    }

    /// Normalised fade progress; zero while inactive.
    #[must_use]
    pub fn progress(&self) -> f32 {
        match self.remaining {
            Some(remaining) => progress(remaining, self.duration),
            None => 0.0,
        }
    }

    /// Advances the fade, emitting [`Event::GameOverFadeFinished`] on completion.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let Some(remaining) = self.remaining else {
            return;
        };
        if remaining.is_zero() {
            return;
        }

        let remaining = remaining.saturating_sub(dt);
        self.remaining = Some(remaining);
        if remaining.is_zero() {
            out.push(Event::GameOverFadeFinished);
        }
    }
}

fn progress(remaining: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        return 1.0;
    }
    (1.0 - remaining.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
}
