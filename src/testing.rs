//! In-memory engine used by the unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::{clamp_volume, seek_target, PlaybackEngine, PlayerState, SessionInfo};
use crate::error::{PlayerError, Result};

/// Every call the coordination layer made, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineCall {
    Open(PathBuf),
    Play,
    Pause,
    Stop,
    SetVolume(i32),
    SeekTo(i64),
}

/// Files the fake knows about: path -> duration in seconds.
/// Anything ending in `.bin` is treated as undecodable.
pub struct FakeEngine {
    library: HashMap<PathBuf, f64>,
    pub calls: Vec<EngineCall>,
    session: Option<SessionInfo>,
    state: PlayerState,
    position_ms: u64,
    volume: u8,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            library: HashMap::new(),
            calls: Vec::new(),
            session: None,
            state: PlayerState::Stopped,
            position_ms: 0,
            volume: 100,
        }
    }

    pub fn with_file(mut self, path: &str, duration: f64) -> Self {
        self.library.insert(PathBuf::from(path), duration);
        self
    }

    /// Simulate wall-clock progress while playing.
    pub fn advance(&mut self, elapsed: Duration) {
        if self.state != PlayerState::Playing {
            return;
        }
        let duration_ms = self.duration() * 1000;
        self.position_ms = (self.position_ms + elapsed.as_millis() as u64).min(duration_ms);
        if self.position_ms >= duration_ms {
            self.state = PlayerState::Stopped;
        }
    }

    pub fn seeks(&self) -> Vec<i64> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::SeekTo(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl PlaybackEngine for FakeEngine {
    fn open(&mut self, path: &Path) -> Result<SessionInfo> {
        self.calls.push(EngineCall::Open(path.to_path_buf()));
        let Some(&duration) = self.library.get(path) else {
            return Err(PlayerError::MediaNotFound {
                path: path.to_path_buf(),
            });
        };
        if path.extension().is_some_and(|ext| ext == "bin") {
            return Err(PlayerError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: "no video stream".into(),
            });
        }
        let info = SessionInfo {
            path: path.to_path_buf(),
            duration,
            width: 640,
            height: 360,
        };
        self.session = Some(info.clone());
        self.state = PlayerState::Stopped;
        self.position_ms = 0;
        Ok(info)
    }

    fn play(&mut self) {
        self.calls.push(EngineCall::Play);
        if self.session.is_some() {
            self.state = PlayerState::Playing;
        }
    }

    fn pause(&mut self) {
        self.calls.push(EngineCall::Pause);
        if self.state == PlayerState::Playing {
            self.state = PlayerState::Paused;
        }
    }

    fn stop(&mut self) {
        self.calls.push(EngineCall::Stop);
        if self.session.is_some() {
            self.state = PlayerState::Stopped;
            self.position_ms = 0;
        }
    }

    fn set_volume(&mut self, percent: i32) {
        self.calls.push(EngineCall::SetVolume(percent));
        self.volume = clamp_volume(percent);
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn seek_to(&mut self, seconds: i64) {
        self.calls.push(EngineCall::SeekTo(seconds));
        let Some(session) = &self.session else {
            return;
        };
        if let Some(target) = seek_target(seconds, session.duration_secs()) {
            self.position_ms = (target * 1000.0) as u64;
        }
    }

    fn position(&self) -> u64 {
        self.position_ms / 1000
    }

    fn duration(&self) -> u64 {
        self.session.as_ref().map_or(0, SessionInfo::duration_secs)
    }

    fn state(&self) -> PlayerState {
        self.state
    }

    fn session(&self) -> Option<&SessionInfo> {
        self.session.as_ref()
    }

    fn close(&mut self) {
        self.session = None;
        self.state = PlayerState::Stopped;
        self.position_ms = 0;
    }
}
