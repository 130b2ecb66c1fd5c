use std::time::{Duration, Instant};

use crate::engine::PlaybackEngine;
use crate::seek::{percent_for, SeekControl};

/// What a single poll did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not due yet
    Skipped,
    /// The user is dragging the slider; the display was left alone
    Suspended,
    /// Duration unknown, nothing to show
    Idle,
    /// The display was updated to this percent
    Updated(u8),
    /// End of media reached on this tick; no further ticks this session
    Finished(u8),
    /// Already finished earlier
    Stopped,
}

/// Periodic task syncing the time slider with the engine position.
///
/// Runs on the UI loop: the caller invokes [`ProgressPoller::poll`] every
/// frame and the poller decides whether an interval has elapsed.
#[derive(Debug)]
pub struct ProgressPoller {
    interval: Duration,
    last_tick: Option<Instant>,
    finished: bool,
}

impl ProgressPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
            finished: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Re-arm after a new session was opened or playback started over.
    pub fn restart(&mut self) {
        if self.finished {
            tracing::debug!("progress poller restarted");
        }
        self.finished = false;
        self.last_tick = None;
    }

    pub fn due(&self, now: Instant) -> bool {
        self.last_tick
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    pub fn poll<E: PlaybackEngine>(
        &mut self,
        now: Instant,
        engine: &E,
        seek: &mut SeekControl,
    ) -> TickOutcome {
        if !self.due(now) {
            return TickOutcome::Skipped;
        }
        self.last_tick = Some(now);
        self.tick(engine, seek)
    }

    /// One tick, regardless of timing.
    pub fn tick<E: PlaybackEngine>(&mut self, engine: &E, seek: &mut SeekControl) -> TickOutcome {
        if self.finished {
            return TickOutcome::Stopped;
        }
        if seek.is_dragging() {
            return TickOutcome::Suspended;
        }

        let duration = engine.duration();
        if duration == 0 {
            return TickOutcome::Idle;
        }
        let position = engine.position();
        let percent = percent_for(position, duration);
        seek.set_display(percent);

        if position >= duration {
            tracing::info!(duration, "end of media, progress poller stopped");
            self.finished = true;
            return TickOutcome::Finished(percent);
        }
        TickOutcome::Updated(percent)
    }
}
