use std::path::Path;
use std::time::Instant;

use crate::config::PlayerConfig;
use crate::engine::{clamp_volume, PlaybackEngine, PlayerState};
use crate::error::PlayerError;
use crate::poller::{ProgressPoller, TickOutcome};
use crate::seek::{seconds_for, SeekControl};
use crate::transport::{TransportAction, TransportController};

pub const NO_FILE_PROMPT: &str = "Choose a file to play";

/// Toolkit-independent state of the player window.
///
/// Owns the engine (absent if it failed to initialize), the seek control and
/// the progress poller. Every UI event lands on one of the methods below; the
/// egui layer only draws and forwards.
pub struct PlayerShell<E> {
    engine: Option<E>,
    seek: SeekControl,
    poller: ProgressPoller,
    volume: u8,
    file_label: String,
    notice: Option<String>,
}

impl<E: PlaybackEngine> PlayerShell<E> {
    /// `engine` is the outcome of engine construction; an init failure leaves
    /// the shell up with inert controls and the error on display.
    pub fn new(engine: Result<E, PlayerError>, config: &PlayerConfig) -> Self {
        let (engine, notice) = match engine {
            Ok(mut engine) => {
                engine.set_volume(i32::from(config.default_volume));
                (Some(engine), None)
            }
            Err(e) => {
                tracing::error!("{e}");
                (None, Some(e.to_string()))
            }
        };
        Self {
            engine,
            seek: SeekControl::new(),
            poller: ProgressPoller::new(config.poll_interval),
            volume: clamp_volume(i32::from(config.default_volume)),
            file_label: NO_FILE_PROMPT.to_owned(),
            notice,
        }
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    pub fn file_label(&self) -> &str {
        &self.file_label
    }

    /// Last user-visible error, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn seek(&self) -> &SeekControl {
        &self.seek
    }

    pub fn poller(&self) -> &ProgressPoller {
        &self.poller
    }

    pub fn has_media(&self) -> bool {
        self.engine.as_ref().is_some_and(|e| e.session().is_some())
    }

    pub fn state(&self) -> PlayerState {
        self.engine.as_ref().map_or(PlayerState::Stopped, E::state)
    }

    pub fn position(&self) -> u64 {
        self.engine.as_ref().map_or(0, E::position)
    }

    pub fn duration(&self) -> u64 {
        self.engine.as_ref().map_or(0, E::duration)
    }

    /// Open a file. On failure the previous session stays loaded and the
    /// error becomes the notice.
    pub fn open(&mut self, path: &Path) {
        let Some(engine) = self.engine.as_mut() else {
            self.notice = Some("No playback engine available".to_owned());
            return;
        };
        match engine.open(path) {
            Ok(info) => {
                tracing::info!(path = %info.path.display(), duration = info.duration, "opened media");
                self.file_label = format!("File: {}", info.path.display());
                self.notice = None;
                self.seek.reset();
                self.poller.restart();
            }
            Err(e) => {
                tracing::warn!("open failed: {e}");
                self.notice = Some(e.to_string());
            }
        }
    }

    /// Button clicks and shortcuts.
    pub fn apply(&mut self, action: TransportAction) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if matches!(action, TransportAction::Play | TransportAction::SeekTo(_)) {
            self.poller.restart();
        }
        TransportController::apply(engine, action);
    }

    pub fn set_volume(&mut self, percent: i32) {
        self.volume = clamp_volume(percent);
        self.apply(TransportAction::SetVolume(i32::from(self.volume)));
    }

    pub fn begin_seek_drag(&mut self) {
        self.seek.begin_drag();
    }

    pub fn drag_seek(&mut self, percent: u8) {
        self.seek.drag_to(percent);
    }

    /// Release of the time slider: one seek to where it was let go.
    pub fn end_seek_drag(&mut self) {
        if let Some(percent) = self.seek.end_drag() {
            let seconds = seconds_for(percent, self.duration());
            self.apply(TransportAction::SeekTo(seconds));
        }
    }

    /// Per-frame pointer state of the time slider. The drag starts on press,
    /// before the toolkit reports a drag, so the poller cannot pull the handle
    /// back; release seeks once. A click is a zero-length drag.
    pub fn seek_slider_input(&mut self, pressed: bool, percent: u8) {
        if pressed {
            self.begin_seek_drag();
            self.drag_seek(percent);
        } else if self.seek.is_dragging() {
            self.drag_seek(percent);
            self.end_seek_drag();
        }
    }

    /// Drive the progress poller; call once per UI frame.
    pub fn poll(&mut self, now: Instant) -> TickOutcome {
        match self.engine.as_ref() {
            Some(engine) => self.poller.poll(now, engine, &mut self.seek),
            None => TickOutcome::Idle,
        }
    }

    /// Release the session ahead of the surface it renders into.
    pub fn shutdown(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCall, FakeEngine};
    use std::path::PathBuf;
    use std::time::Duration;

    fn shell(engine: FakeEngine) -> PlayerShell<FakeEngine> {
        PlayerShell::new(Ok(engine), &PlayerConfig::default())
    }

    fn library() -> FakeEngine {
        FakeEngine::new()
            .with_file("/media/a.mp4", 60.0)
            .with_file("/media/b.mkv", 120.0)
            .with_file("/media/broken.bin", 10.0)
    }

    #[test]
    fn starts_with_placeholder_and_default_volume() {
        let shell = shell(library());
        assert_eq!(shell.file_label(), NO_FILE_PROMPT);
        assert_eq!(shell.volume(), 50);
        assert_eq!(shell.engine().unwrap().volume(), 50);
        assert!(!shell.has_media());
    }

    #[test]
    fn volume_reaches_engine_clamped() {
        let mut shell = shell(library());
        for (input, expected) in [(-5, 0), (0, 0), (73, 73), (100, 100), (180, 100)] {
            shell.set_volume(input);
            assert_eq!(shell.volume(), expected);
            assert_eq!(shell.engine().unwrap().volume(), expected);
        }
    }

    #[test]
    fn open_sets_label() {
        let mut shell = shell(library());
        shell.open(Path::new("/media/a.mp4"));
        assert_eq!(shell.file_label(), "File: /media/a.mp4");
        assert_eq!(shell.duration(), 60);
        assert!(shell.notice().is_none());
    }

    #[test]
    fn stop_right_after_open_stays_at_zero() {
        let mut shell = shell(library());
        shell.open(Path::new("/media/a.mp4"));
        shell.apply(TransportAction::Stop);
        assert_eq!(shell.position(), 0);
        assert_eq!(shell.state(), PlayerState::Stopped);
        assert!(shell.notice().is_none());
    }

    #[test]
    fn failed_open_keeps_previous_session() {
        let mut shell = shell(library());
        shell.open(Path::new("/media/a.mp4"));
        shell.apply(TransportAction::Play);

        shell.open(Path::new("/media/missing.mp4"));
        assert!(shell.notice().unwrap().contains("not found"));
        assert_eq!(shell.file_label(), "File: /media/a.mp4");

        let engine = shell.engine().unwrap();
        assert_eq!(engine.session().unwrap().path, PathBuf::from("/media/a.mp4"));
        assert_eq!(engine.state(), PlayerState::Playing);

        shell.apply(TransportAction::Pause);
        shell.apply(TransportAction::Play);
        assert_eq!(shell.state(), PlayerState::Playing);
    }

    #[test]
    fn undecodable_file_is_reported() {
        let mut shell = shell(library());
        shell.open(Path::new("/media/broken.bin"));
        assert!(shell.notice().unwrap().starts_with("Unsupported format"));
        assert!(!shell.has_media());
    }

    #[test]
    fn drag_release_issues_exactly_one_seek() {
        let mut shell = shell(library());
        shell.open(Path::new("/media/a.mp4"));
        shell.apply(TransportAction::Play);
        let start = Instant::now();

        shell.begin_seek_drag();
        for (i, percent) in [10, 30, 45, 50].into_iter().enumerate() {
            shell.drag_seek(percent);
            let now = start + Duration::from_millis(100 * i as u64);
            assert_eq!(shell.poll(now), TickOutcome::Suspended);
        }
        assert!(shell.engine().unwrap().seeks().is_empty());

        shell.end_seek_drag();
        shell.end_seek_drag();
        assert_eq!(shell.engine().unwrap().seeks(), vec![30]);
        assert_eq!(shell.position(), 30);

        let next = start + Duration::from_millis(500);
        assert_eq!(shell.poll(next), TickOutcome::Updated(50));
    }

    #[test]
    fn click_seeks_once() {
        let mut shell = shell(library());
        shell.open(Path::new("/media/b.mkv"));
        shell.seek_slider_input(true, 25);
        shell.seek_slider_input(false, 25);
        shell.seek_slider_input(false, 25);
        assert_eq!(shell.engine().unwrap().seeks(), vec![30]);
    }

    #[test]
    fn press_holds_the_slider_against_the_poller() {
        let mut shell = shell(library());
        shell.open(Path::new("/media/a.mp4"));
        shell.apply(TransportAction::Play);
        shell.engine_mut().unwrap().advance(Duration::from_secs(6));
        let start = Instant::now();

        // pressed on the track, toolkit has not reported a drag yet
        shell.seek_slider_input(true, 75);
        assert_eq!(shell.poll(start), TickOutcome::Suspended);
        assert_eq!(shell.seek().value(), 75);

        shell.seek_slider_input(true, 80);
        assert_eq!(shell.seek().value(), 80);
        assert!(shell.engine().unwrap().seeks().is_empty());

        shell.seek_slider_input(false, 80);
        assert_eq!(shell.engine().unwrap().seeks(), vec![48]);
        assert!(!shell.seek().is_dragging());
    }

    #[test]
    fn over_range_seek_keeps_position_in_bounds() {
        let mut shell = shell(library());
        shell.open(Path::new("/media/a.mp4"));
        shell.apply(TransportAction::SeekTo(10));
        shell.apply(TransportAction::SeekTo(600));
        shell.apply(TransportAction::SeekTo(-4));
        assert_eq!(shell.position(), 10);
        assert!(shell.position() <= shell.duration());
    }

    #[test]
    fn reopening_revives_a_finished_poller() {
        let mut shell = shell(library());
        shell.open(Path::new("/media/a.mp4"));
        shell.apply(TransportAction::Play);
        shell.engine_mut().unwrap().advance(Duration::from_secs(60));
        assert_eq!(shell.poll(Instant::now()), TickOutcome::Finished(100));
        assert!(shell.poller().is_finished());

        shell.open(Path::new("/media/b.mkv"));
        assert!(!shell.poller().is_finished());
        assert_eq!(shell.seek().value(), 0);
        assert_eq!(shell.poll(Instant::now()), TickOutcome::Updated(0));
    }

    #[test]
    fn engine_init_failure_is_not_fatal() {
        let mut shell: PlayerShell<FakeEngine> = PlayerShell::new(
            Err(PlayerError::EngineInit("no audio device".into())),
            &PlayerConfig::default(),
        );
        assert!(shell.notice().unwrap().contains("no audio device"));

        shell.apply(TransportAction::Play);
        shell.seek_slider_input(true, 40);
        shell.seek_slider_input(false, 40);
        shell.open(Path::new("/media/a.mp4"));
        assert_eq!(shell.poll(Instant::now()), TickOutcome::Idle);
        assert_eq!(shell.file_label(), NO_FILE_PROMPT);
        assert!(shell.engine().is_none());
    }

    #[test]
    fn transport_calls_are_forwarded_in_order() {
        let mut shell = shell(library());
        shell.open(Path::new("/media/a.mp4"));
        shell.engine_mut().unwrap().clear_calls();

        shell.apply(TransportAction::Play);
        shell.apply(TransportAction::Pause);
        shell.apply(TransportAction::Stop);
        assert_eq!(
            shell.engine().unwrap().calls,
            vec![EngineCall::Play, EngineCall::Pause, EngineCall::Stop]
        );
    }
}
