pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod player;
pub mod poller;
pub mod seek;
pub mod shell;
pub mod transport;
pub mod ui;

#[cfg(test)]
mod testing;

pub use app::VideoPlayerApp;
pub use config::PlayerConfig;
pub use engine::{PlaybackEngine, PlayerState, SessionInfo};
pub use error::PlayerError;
pub use player::{FfmpegEngine, RenderSurface};
pub use shell::PlayerShell;
pub use transport::{TransportAction, TransportController};
pub use ui::controls::PlayerControls;
