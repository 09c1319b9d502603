//! Transition Animator - horizontal slide between two step surfaces
//!
//! The animator owns no wizard state. It moves two surfaces in parallel and
//! hides the outgoing one when the slide completes. Frames are driven by the
//! caller through [`TransitionAnimator::tick`] on the UI thread.

use crate::error::{Result, WizardError};
use std::time::{Duration, Instant};

/// A step panel that can be positioned horizontally
pub trait Surface {
    fn width(&self) -> i32;
    fn x(&self) -> i32;
    fn move_to(&mut self, x: i32);
    fn set_visible(&mut self, visible: bool);
}

/// Direction the outgoing surface travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlideDirection {
    #[default]
    Left,
    Right,
}

impl SlideDirection {
    fn sign(self) -> i32 {
        match self {
            SlideDirection::Left => -1,
            SlideDirection::Right => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStatus {
    Idle,
    Running,
    Finished,
}

struct Slide<S> {
    outgoing: S,
    incoming: S,
    origin: i32,
    distance: i32,
    started: Instant,
    duration: Duration,
}

impl<S: Surface> Slide<S> {
    fn fraction(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    fn apply(&mut self, fraction: f64) {
        let offset = (self.distance as f64 * fraction).round() as i32;
        self.outgoing.move_to(self.origin + offset);
        self.incoming.move_to(self.origin - self.distance + offset);
    }
}

pub struct TransitionAnimator<S> {
    direction: SlideDirection,
    active: Option<Slide<S>>,
}

impl<S: Surface> TransitionAnimator<S> {
    pub fn new(direction: SlideDirection) -> Self {
        Self {
            direction,
            active: None,
        }
    }

    pub fn direction(&self) -> SlideDirection {
        self.direction
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Start sliding `outgoing` away and `incoming` into its place.
    ///
    /// Refuses to start while another slide is in flight. A zero duration
    /// completes immediately.
    pub fn begin(
        &mut self,
        mut outgoing: S,
        mut incoming: S,
        duration: Duration,
        now: Instant,
    ) -> Result<AnimationStatus> {
        if self.active.is_some() {
            return Err(WizardError::TransitionInFlight);
        }

        let width = outgoing.width();
        if incoming.width() != width {
            tracing::debug!(
                "Sliding surfaces of different widths ({} vs {})",
                width,
                incoming.width()
            );
        }

        let origin = outgoing.x();
        let distance = width * self.direction.sign();

        incoming.move_to(origin - distance);
        incoming.set_visible(true);
        outgoing.set_visible(true);

        self.active = Some(Slide {
            outgoing,
            incoming,
            origin,
            distance,
            started: now,
            duration,
        });

        Ok(self.tick(now))
    }

    /// Advance the slide to `now`. Returns `Finished` exactly once per slide.
    pub fn tick(&mut self, now: Instant) -> AnimationStatus {
        let Some(slide) = self.active.as_mut() else {
            return AnimationStatus::Idle;
        };

        let fraction = slide.fraction(now);
        slide.apply(fraction);

        if fraction >= 1.0 {
            self.release();
            AnimationStatus::Finished
        } else {
            AnimationStatus::Running
        }
    }

    /// Jump an in-flight slide to its end state. Returns whether one was running.
    pub fn finish_now(&mut self) -> bool {
        match self.active.as_mut() {
            Some(slide) => {
                slide.apply(1.0);
                self.release();
                true
            }
            None => false,
        }
    }

    fn release(&mut self) {
        if let Some(mut slide) = self.active.take() {
            slide.outgoing.set_visible(false);
        }
    }
}

impl<S: Surface> Default for TransitionAnimator<S> {
    fn default() -> Self {
        Self::new(SlideDirection::default())
    }
}
