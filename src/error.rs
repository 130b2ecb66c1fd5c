use std::path::PathBuf;

/// Errors surfaced to the user by the playback layer.
///
/// None of these are fatal: the shell turns them into a notice and keeps the
/// window usable.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("File not found: {}", path.display())]
    MediaNotFound { path: PathBuf },

    #[error("Unsupported format ({}): {reason}", path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("Playback engine failed to initialize: {0}")]
    EngineInit(String),
}

pub type Result<T> = std::result::Result<T, PlayerError>;
