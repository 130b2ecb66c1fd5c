use std::path::{Path, PathBuf};

use crate::error::Result;

/// Player state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
}

/// What the engine reports about a freshly opened file.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionInfo {
    pub path: PathBuf,
    /// Container duration in seconds, 0.0 when unknown
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

impl SessionInfo {
    pub fn duration_secs(&self) -> u64 {
        whole_seconds(self.duration)
    }
}

/// Handle to a media playback engine holding at most one session.
///
/// Every call returns immediately. Getters report 0 when nothing is loaded
/// or the value is not known yet; setters are no-ops without a session.
pub trait PlaybackEngine {
    /// Open `path`, replacing the current session only on success.
    fn open(&mut self, path: &Path) -> Result<SessionInfo>;

    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);

    /// Out-of-range input is clamped to 0..=100.
    fn set_volume(&mut self, percent: i32);
    fn volume(&self) -> u8;

    /// Ignored when nothing is loaded or `seconds` is outside the known duration.
    fn seek_to(&mut self, seconds: i64);

    fn position(&self) -> u64;
    fn duration(&self) -> u64;

    fn state(&self) -> PlayerState;
    fn session(&self) -> Option<&SessionInfo>;

    /// Release the current session, if any.
    fn close(&mut self);
}

pub(crate) fn clamp_volume(percent: i32) -> u8 {
    percent.clamp(0, 100) as u8
}

/// Validated seek target in seconds, or `None` when `seconds` is negative or
/// past the known duration (whole seconds, 0 when unknown).
pub(crate) fn seek_target(seconds: i64, duration: u64) -> Option<f64> {
    let seconds = u64::try_from(seconds).ok()?;
    (seconds <= duration).then_some(seconds as f64)
}

pub(crate) fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    }
}
