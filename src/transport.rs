use egui::Key;

use crate::engine::PlaybackEngine;

/// A user intent coming from a button, slider or shortcut.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportAction {
    Play,
    Pause,
    Stop,
    SetVolume(i32),
    SeekTo(i64),
}

/// Window-wide keyboard shortcuts, active while the window has focus.
pub const SHORTCUTS: [(Key, TransportAction); 3] = [
    (Key::Space, TransportAction::Play),
    (Key::P, TransportAction::Pause),
    (Key::Escape, TransportAction::Stop),
];

pub fn shortcut_action(key: Key) -> Option<TransportAction> {
    SHORTCUTS
        .iter()
        .find(|(bound, _)| *bound == key)
        .map(|(_, action)| *action)
}

/// Stateless mapping from user intents to engine calls.
pub struct TransportController;

impl TransportController {
    /// Forward one action as exactly one engine call.
    pub fn apply<E: PlaybackEngine>(engine: &mut E, action: TransportAction) {
        tracing::debug!(?action, "transport");
        match action {
            TransportAction::Play => engine.play(),
            TransportAction::Pause => engine.pause(),
            TransportAction::Stop => engine.stop(),
            TransportAction::SetVolume(percent) => engine.set_volume(percent),
            TransportAction::SeekTo(seconds) => engine.seek_to(seconds),
        }
    }
}
