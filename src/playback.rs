//! Playback: advancing the viewport one frame at a time.
//!
//! Everything runs on one thread. The host owns a [`FrameScheduler`] and
//! runs one frame per tick; the [`Animator`] holds at most one pending
//! [`FrameHandle`] and cancels it whenever playback stops.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::model::{PlaybackState, clamp_speed};

/// Position advanced per frame at speed 1.0.
pub const DEFAULT_BASE_STEP: f64 = 0.001;

/// A scheduled frame. Cancelling is idempotent.
#[derive(Debug, Clone)]
pub struct FrameHandle {
    id: u64,
    cancelled: Rc<Cell<bool>>,
}

impl FrameHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl PartialEq for FrameHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// The host's cooperative frame queue.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    queue: VecDeque<FrameHandle>,
}

impl FrameScheduler {
    pub fn schedule(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle {
            id: self.next_id,
            cancelled: Rc::new(Cell::new(false)),
        };
        self.queue.push_back(handle.clone());
        handle
    }

    /// Pops the next frame that has not been cancelled.
    pub fn next_frame(&mut self) -> Option<FrameHandle> {
        while let Some(handle) = self.queue.pop_front() {
            if !handle.is_cancelled() {
                return Some(handle);
            }
        }
        None
    }

    /// Frames still waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.iter().filter(|h| !h.is_cancelled()).count()
    }
}

/// What a frame did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Moved to this position; another frame is scheduled.
    Advanced(f64),
    /// Reached the end and stopped.
    Finished,
    /// The frame was stale or playback is stopped.
    Skipped,
}

/// Two-state machine: stopped or playing.
#[derive(Debug)]
pub struct Animator {
    state: PlaybackState,
    base_step: f64,
    frame: Option<FrameHandle>,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_STEP)
    }
}

impl Animator {
    /// A non-positive or non-finite `base_step` falls back to [`DEFAULT_BASE_STEP`];
    /// steps above 1 are capped at 1.
    pub fn new(base_step: f64) -> Self {
        let base_step = if base_step.is_finite() && base_step > 0.0 {
            base_step.min(1.0)
        } else {
            warn!(base_step, "invalid playback step, using default");
            DEFAULT_BASE_STEP
        };
        Self {
            state: PlaybackState::default(),
            base_step,
            frame: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    /// Starts playing. Returns `false` if already playing; no second frame is queued.
    pub fn play(&mut self, scheduler: &mut FrameScheduler) -> bool {
        if self.state.is_playing {
            return false;
        }
        self.state.is_playing = true;
        self.frame = Some(scheduler.schedule());
        debug!(speed = self.state.play_speed, "playback started");
        true
    }

    /// Stops playing and cancels the pending frame. Returns `false` if already stopped.
    pub fn pause(&mut self) -> bool {
        if let Some(frame) = self.frame.take() {
            frame.cancel();
        }
        if !self.state.is_playing {
            return false;
        }
        self.state.is_playing = false;
        debug!("playback paused");
        true
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.state.play_speed = clamp_speed(speed);
    }

    /// Runs one frame from `position`.
    ///
    /// Only the animator's own pending frame is honoured. Reaching 1 stops
    /// playback without scheduling another frame.
    pub fn step(
        &mut self,
        frame: &FrameHandle,
        position: f64,
        scheduler: &mut FrameScheduler,
    ) -> Step {
        if !self.state.is_playing || frame.is_cancelled() || self.frame.as_ref() != Some(frame) {
            return Step::Skipped;
        }
        self.frame = None;

        let next = position + self.base_step * self.state.play_speed;
        if next >= 1.0 {
            self.state.is_playing = false;
            debug!("playback reached the end");
            return Step::Finished;
        }

        self.frame = Some(scheduler.schedule());
        Step::Advanced(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{MAX_PLAY_SPEED, MIN_PLAY_SPEED};

    fn run_to_end(animator: &mut Animator, scheduler: &mut FrameScheduler, start: f64) -> usize {
        let mut position = start;
        let mut frames = 0;
        while let Some(frame) = scheduler.next_frame() {
            frames += 1;
            match animator.step(&frame, position, scheduler) {
                Step::Advanced(p) => position = p,
                Step::Finished => break,
                Step::Skipped => {}
            }
        }
        frames
    }

    #[test]
    fn play_is_idempotent() {
        let mut scheduler = FrameScheduler::default();
        let mut animator = Animator::default();

        assert!(animator.play(&mut scheduler));
        assert!(!animator.play(&mut scheduler));
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn pause_cancels_pending_frame() {
        let mut scheduler = FrameScheduler::default();
        let mut animator = Animator::default();
        animator.play(&mut scheduler);

        assert!(animator.pause());
        assert!(!animator.pause());
        assert_eq!(scheduler.pending(), 0);
        assert!(scheduler.next_frame().is_none());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut scheduler = FrameScheduler::default();
        let handle = scheduler.schedule();
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(scheduler.next_frame().is_none());
    }

    #[test]
    fn step_advances_by_base_times_speed() {
        let mut scheduler = FrameScheduler::default();
        let mut animator = Animator::new(0.01);
        animator.set_speed(2.0);
        animator.play(&mut scheduler);

        let frame = scheduler.next_frame().unwrap();
        let Step::Advanced(p) = animator.step(&frame, 0.5, &mut scheduler) else {
            panic!("expected to advance");
        };
        assert!((p - 0.52).abs() < 1e-12);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn reaching_the_end_auto_pauses() {
        let mut scheduler = FrameScheduler::default();
        let mut animator = Animator::new(0.1);
        animator.play(&mut scheduler);

        let frame = scheduler.next_frame().unwrap();
        assert_eq!(animator.step(&frame, 0.95, &mut scheduler), Step::Finished);
        assert!(!animator.is_playing());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn stale_frames_are_skipped() {
        let mut scheduler = FrameScheduler::default();
        let mut animator = Animator::default();
        animator.play(&mut scheduler);
        let stale = scheduler.schedule();

        assert_eq!(animator.step(&stale, 0.0, &mut scheduler), Step::Skipped);
    }

    #[test]
    fn frames_to_finish_scale_with_speed() {
        for (speed, start) in [(1.0, 0.0), (2.0, 0.0), (3.0, 0.5), (0.5, 0.9)] {
            let mut scheduler = FrameScheduler::default();
            let mut animator = Animator::new(0.01);
            animator.set_speed(speed);
            animator.play(&mut scheduler);

            let frames = run_to_end(&mut animator, &mut scheduler, start);
            #[allow(clippy::cast_precision_loss)]
            let expected = (1.0 - start) / (0.01 * speed);
            assert!((frames as f64) <= expected.ceil() + 1.0, "speed {speed}: {frames} frames");
            assert!(!animator.is_playing());
        }
    }

    #[test]
    fn invalid_base_step_still_reaches_the_end() {
        for base_step in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            let mut scheduler = FrameScheduler::default();
            let mut animator = Animator::new(base_step);
            animator.set_speed(MAX_PLAY_SPEED);
            animator.play(&mut scheduler);

            let frames = run_to_end(&mut animator, &mut scheduler, 0.99);
            assert!(frames <= 5, "base step {base_step}: {frames} frames");
            assert!(!animator.is_playing());
        }
    }

    #[test]
    fn speed_is_clamped() {
        let mut animator = Animator::default();
        animator.set_speed(0.0);
        assert!((animator.state().play_speed - MIN_PLAY_SPEED).abs() < f64::EPSILON);
        animator.set_speed(99.0);
        assert!((animator.state().play_speed - MAX_PLAY_SPEED).abs() < f64::EPSILON);
    }
}
