use crossbeam_channel::bounded;
use egui::{ColorImage, TextureHandle, TextureOptions};
use rodio::{OutputStreamHandle, Sink};
use std::path::Path;

use super::audio::{AudioClock, ClockedSource, SampleRing};
use super::decoder::{self, DecoderCommand, DecoderThread, OUTPUT_CHANNELS};
use super::frames::{FrameQueue, VideoFrame};
use crate::engine::{whole_seconds, PlayerState, SessionInfo};
use crate::error::{PlayerError, Result};

/// Decoded frames buffered between the decoder and the UI
const FRAME_BUFFER: usize = 30;
/// Treat the clock as finished this close to the end (seconds)
const END_SLACK: f64 = 0.1;

/// Everything tied to one open file.
///
/// Field order matters: the decoder thread is joined before the sink and
/// frame queue it feeds are dropped.
pub struct MediaSession {
    decoder: DecoderThread,
    sink: Sink,
    clock: AudioClock,
    frames: FrameQueue,
    info: SessionInfo,
    state: PlayerState,
    /// Target of an in-flight seek, until the first frame after it arrives
    seeking: Option<f64>,
}

impl MediaSession {
    pub fn open(path: &Path, output: &OutputStreamHandle, volume: u8) -> Result<Self> {
        let probe = decoder::probe(path)?;

        let clock = AudioClock::new(probe.sample_rate, OUTPUT_CHANNELS);
        // about a second of audio
        let ring = SampleRing::new(probe.sample_rate as usize * usize::from(OUTPUT_CHANNELS));

        let (frame_tx, frame_rx) = bounded(FRAME_BUFFER);
        let decoder = DecoderThread::spawn(path, frame_tx, ring.clone(), clock.clone())?;

        let sink = Sink::try_new(output)
            .map_err(|e| PlayerError::EngineInit(format!("audio output unavailable: {e}")))?;
        if decoder.has_audio() {
            sink.append(ClockedSource::new(ring, clock.clone()));
        } else {
            sink.append(ClockedSource::silent(clock.clone()));
        }
        sink.set_volume(f32::from(volume) / 100.0);
        sink.pause();

        let mut session = Self {
            decoder,
            sink,
            clock,
            frames: FrameQueue::new(frame_rx, FRAME_BUFFER),
            info: SessionInfo {
                path: path.to_path_buf(),
                duration: probe.duration,
                width: probe.width,
                height: probe.height,
            },
            state: PlayerState::Stopped,
            seeking: None,
        };

        // The decoder pre-rolls up to the first frame so something is on
        // screen; the paused sink keeps the clock at zero.
        session.seek(0.0);

        Ok(session)
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn play(&mut self) {
        if self.state == PlayerState::Playing {
            return;
        }
        if self.at_end() {
            self.seek(0.0);
        }
        self.state = PlayerState::Playing;
        self.decoder.send(DecoderCommand::Resume);
        if self.seeking.is_none() {
            self.sink.play();
        }
    }

    pub fn pause(&mut self) {
        if self.state != PlayerState::Playing {
            return;
        }
        self.state = PlayerState::Paused;
        self.sink.pause();
        self.decoder.send(DecoderCommand::Pause);
    }

    /// Halt and rewind to the start.
    pub fn stop(&mut self) {
        self.state = PlayerState::Stopped;
        self.sink.pause();
        self.seek(0.0);
        self.decoder.send(DecoderCommand::Pause);
    }

    pub fn seek(&mut self, seconds: f64) {
        let target = seconds.clamp(0.0, self.info.duration.max(0.0));
        self.seeking = Some(target);
        self.sink.pause();
        self.frames.clear();
        self.clock.jump_to(target);
        self.decoder.send(DecoderCommand::Seek(target));
    }

    pub fn set_volume(&self, percent: u8) {
        self.sink.set_volume(f32::from(percent) / 100.0);
    }

    /// Seconds into the file, never past the duration.
    pub fn position(&self) -> f64 {
        let position = self.seeking.unwrap_or_else(|| self.clock.position());
        if self.info.duration > 0.0 {
            position.min(self.info.duration)
        } else {
            position
        }
    }

    pub fn position_secs(&self) -> u64 {
        whole_seconds(self.position())
    }

    fn at_end(&self) -> bool {
        self.info.duration > 0.0 && self.position() >= self.info.duration - END_SLACK
    }

    /// Pull the frame due now into `texture`. Called once per UI frame.
    pub fn present(&mut self, texture: &mut TextureHandle) {
        if let Some(target) = self.seeking {
            if let Some(frame) = self.frames.first_after_seek(target) {
                upload(texture, frame);
                self.clock.jump_to(frame.pts.max(0.0));
                self.seeking = None;
                if self.state == PlayerState::Playing {
                    self.sink.play();
                }
            }
            return;
        }

        if self.state != PlayerState::Playing {
            return;
        }

        let now = self.clock.position();
        if let Some(frame) = self.frames.next_due(now) {
            upload(texture, frame);
        }

        if self.frames.is_drained() && self.at_end() {
            tracing::debug!(path = %self.info.path.display(), "playback reached the end");
            self.state = PlayerState::Stopped;
            self.sink.pause();
            self.clock.jump_to(self.info.duration);
        }
    }
}

fn upload(texture: &mut TextureHandle, frame: &VideoFrame) {
    let image = ColorImage::from_rgba_unmultiplied(
        [frame.width as usize, frame.height as usize],
        &frame.rgba,
    );
    texture.set(image, TextureOptions::LINEAR);
}
