//! FFmpeg + rodio playback engine.
//!
//! ```text
//! UI thread (egui)                 Decode thread
//! ┌──────────────────┐            ┌──────────────────┐
//! │ FfmpegEngine     │── cmds ───►│ DecodeWorker     │
//! │  MediaSession    │            │  demux / decode  │
//! │   FrameQueue  ◄──┼── frames ──│  scale to RGBA   │
//! │   Sink ◄ ring ◄──┼── samples ─│  resample f32    │
//! └──────────────────┘            └──────────────────┘
//! ```
//!
//! The audio output drives the clock; video frames are shown when the clock
//! reaches their timestamp.

mod audio;
mod decoder;
mod frames;
mod session;

use egui::{Color32, ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use rodio::{OutputStream, OutputStreamHandle};
use std::path::Path;

use crate::engine::{clamp_volume, seek_target, PlaybackEngine, PlayerState, SessionInfo};
use crate::error::{PlayerError, Result};
use session::MediaSession;

/// The area decoded video is drawn into: a texture owned by the egui
/// context of the window.
pub struct RenderSurface {
    ctx: Context,
    texture: TextureHandle,
}

impl RenderSurface {
    pub fn new(ctx: &Context) -> Self {
        let texture = ctx.load_texture(
            "video_frame",
            ColorImage::new([1, 1], Color32::BLACK),
            TextureOptions::LINEAR,
        );
        Self {
            ctx: ctx.clone(),
            texture,
        }
    }

    pub fn texture_id(&self) -> TextureId {
        self.texture.id()
    }

    pub fn blank(&mut self) {
        self.texture
            .set(ColorImage::new([1, 1], Color32::BLACK), TextureOptions::LINEAR);
    }
}

/// Playback engine backed by FFmpeg decoding and a rodio audio sink.
///
/// Field order matters: the session is dropped before the audio output it
/// plays through and the surface it renders into.
pub struct FfmpegEngine {
    session: Option<MediaSession>,
    volume: u8,
    output: OutputStreamHandle,
    _stream: OutputStream,
    surface: RenderSurface,
}

impl FfmpegEngine {
    /// Initialise FFmpeg and the default audio device, taking ownership of
    /// the render surface.
    pub fn new(surface: RenderSurface) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| PlayerError::EngineInit(format!("FFmpeg: {e}")))?;
        let (stream, output) = OutputStream::try_default()
            .map_err(|e| PlayerError::EngineInit(format!("audio device: {e}")))?;
        tracing::info!("playback engine ready");
        Ok(Self {
            session: None,
            volume: 100,
            output,
            _stream: stream,
            surface,
        })
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    /// Advance presentation; call once per UI frame.
    pub fn update(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.present(&mut self.surface.texture);
        // A paused seek shows its frame on the app's regular poll repaint.
        if session.state() == PlayerState::Playing {
            self.surface.ctx.request_repaint();
        }
    }
}

impl PlaybackEngine for FfmpegEngine {
    fn open(&mut self, path: &Path) -> Result<SessionInfo> {
        let session = MediaSession::open(path, &self.output, self.volume)?;
        let info = session.info().clone();
        if let Some(previous) = self.session.replace(session) {
            tracing::info!(path = %previous.info().path.display(), "released previous session");
        }
        tracing::info!(
            path = %info.path.display(),
            duration = info.duration,
            width = info.width,
            height = info.height,
            "session opened"
        );
        Ok(info)
    }

    fn play(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.play();
        }
    }

    fn pause(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.stop();
        }
    }

    fn set_volume(&mut self, percent: i32) {
        self.volume = clamp_volume(percent);
        if let Some(session) = self.session.as_ref() {
            session.set_volume(self.volume);
        }
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn seek_to(&mut self, seconds: i64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let duration = session.info().duration_secs();
        match seek_target(seconds, duration) {
            Some(target) => session.seek(target),
            None => tracing::debug!(seconds, duration, "ignoring out-of-range seek"),
        }
    }

    fn position(&self) -> u64 {
        self.session.as_ref().map_or(0, MediaSession::position_secs)
    }

    fn duration(&self) -> u64 {
        self.session
            .as_ref()
            .map_or(0, |s| s.info().duration_secs())
    }

    fn state(&self) -> PlayerState {
        self.session
            .as_ref()
            .map_or(PlayerState::Stopped, MediaSession::state)
    }

    fn session(&self) -> Option<&SessionInfo> {
        self.session.as_ref().map(MediaSession::info)
    }

    fn close(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(path = %session.info().path.display(), "session closed");
            drop(session);
            self.surface.blank();
        }
    }
}

impl Drop for FfmpegEngine {
    fn drop(&mut self) {
        self.close();
    }
}
