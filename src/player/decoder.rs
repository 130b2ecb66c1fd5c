//! FFmpeg decode thread: demuxes the file, converts video to RGBA frames
//! for the [`FrameQueue`](super::frames::FrameQueue) and audio to packed
//! stereo f32 for the [`SampleRing`].

use anyhow::{anyhow, Context as _};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame::{Audio as AudioFrame, Video as RawVideoFrame};
use ffmpeg_next::media::Type;
use ffmpeg_next::software::resampling::Context as Resampler;
use ffmpeg_next::software::scaling::{Context as Scaler, Flags};
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::{Sample, Type as SampleType};
use ffmpeg_next::{codec, decoder, format, Packet, Rational};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::audio::{AudioClock, SampleRing};
use super::frames::{VideoFrame, SEEK_TOLERANCE};
use crate::error::{PlayerError, Result};

/// Audio is always resampled to interleaved stereo
pub const OUTPUT_CHANNELS: u16 = 2;
/// Sample rate assumed when the file has no audio stream
const FALLBACK_SAMPLE_RATE: u32 = 44_100;
/// Sleep between command checks while paused or at end of file
const IDLE_WAIT: Duration = Duration::from_millis(10);
/// Retry delay when the frame channel is full
const BACKPRESSURE_WAIT: Duration = Duration::from_millis(1);
/// Consecutive failed packet reads before the input counts as ended
const MAX_READ_FAILURES: u32 = 64;

/// Commands sent from the UI thread to the decode thread
#[derive(Debug)]
pub enum DecoderCommand {
    Seek(f64),
    Pause,
    Resume,
    Shutdown,
}

/// Stream parameters read before playback starts.
#[derive(Clone, Debug)]
pub struct MediaProbe {
    pub width: u32,
    pub height: u32,
    /// Seconds, 0.0 if the container does not say
    pub duration: f64,
    pub sample_rate: u32,
}

fn unsupported(path: &Path, reason: impl ToString) -> PlayerError {
    PlayerError::UnsupportedFormat {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Inspect `path` without decoding anything.
///
/// An audio stream that cannot be decoded is not an error; the file then
/// plays without sound, the same way the decode thread treats it.
pub fn probe(path: &Path) -> Result<MediaProbe> {
    if !path.is_file() {
        return Err(PlayerError::MediaNotFound {
            path: path.to_path_buf(),
        });
    }

    let input = format::input(path).map_err(|e| unsupported(path, e))?;
    let video_stream = input
        .streams()
        .best(Type::Video)
        .ok_or_else(|| unsupported(path, "no video stream"))?;
    let video = codec::Context::from_parameters(video_stream.parameters())
        .and_then(|ctx| ctx.decoder().video())
        .map_err(|e| unsupported(path, e))?;

    let sample_rate = match input.streams().best(Type::Audio) {
        Some(stream) => codec::Context::from_parameters(stream.parameters())
            .and_then(|ctx| ctx.decoder().audio())
            .map(|audio| audio.rate())
            .ok()
            .filter(|rate| *rate > 0),
        None => None,
    };

    let duration = if input.duration() > 0 {
        input.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
    } else {
        0.0
    };

    Ok(MediaProbe {
        width: video.width(),
        height: video.height(),
        duration,
        sample_rate: sample_rate.unwrap_or(FALLBACK_SAMPLE_RATE),
    })
}

/// Owns the decode thread; dropping it shuts the thread down and joins it.
pub struct DecoderThread {
    commands: Sender<DecoderCommand>,
    handle: Option<JoinHandle<()>>,
    has_audio: bool,
}

impl DecoderThread {
    /// Start decoding `path`. Returns once the worker has opened its
    /// decoders, so a file the worker cannot handle fails here.
    pub fn spawn(
        path: &Path,
        frames: Sender<VideoFrame>,
        ring: Arc<SampleRing>,
        clock: AudioClock,
    ) -> Result<Self> {
        let (commands, inbox) = bounded(16);
        let (ready_tx, ready) = bounded(1);
        let source = path.to_path_buf();

        let handle = thread::Builder::new()
            .name("decoder".into())
            .spawn(move || {
                let mut worker = match DecodeWorker::open(&source, frames, ring, clock, inbox) {
                    Ok(worker) => {
                        let _ = ready_tx.send(Ok(worker.audio.is_some()));
                        worker
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("{e:#}")));
                        return;
                    }
                };
                if let Err(e) = worker.run() {
                    tracing::error!("decoder stopped: {e:#}");
                }
            })
            .map_err(|e| PlayerError::EngineInit(format!("cannot start decode thread: {e}")))?;

        // dropping `decoder` on failure joins the finished thread
        let outcome = ready.recv();
        let mut decoder = Self {
            commands,
            handle: Some(handle),
            has_audio: false,
        };
        match outcome {
            Ok(Ok(has_audio)) => {
                decoder.has_audio = has_audio;
                Ok(decoder)
            }
            Ok(Err(reason)) => Err(unsupported(path, reason)),
            Err(_) => Err(PlayerError::EngineInit(
                "decode thread exited during startup".into(),
            )),
        }
    }

    /// Whether the worker decodes an audio stream. Without one the session
    /// paces its clock on silence.
    pub fn has_audio(&self) -> bool {
        self.has_audio
    }

    pub fn send(&self, command: DecoderCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!("decode thread is gone, command dropped");
        }
    }
}

impl Drop for DecoderThread {
    fn drop(&mut self) {
        let _ = self.commands.send(DecoderCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("decode thread panicked");
            }
        }
    }
}

/// Decides when the worker pulls packets from the demuxer.
#[derive(Debug)]
struct ReadGate {
    paused: bool,
    at_eof: bool,
    /// Seek target still waiting for its first frame; read even while paused
    preroll: Option<f64>,
    read_failures: u32,
}

impl ReadGate {
    fn new() -> Self {
        Self {
            paused: true,
            at_eof: false,
            preroll: None,
            read_failures: 0,
        }
    }

    fn should_read(&self) -> bool {
        !self.at_eof && (!self.paused || self.preroll.is_some())
    }

    /// Paused with no seek left to show.
    fn holding(&self) -> bool {
        self.paused && self.preroll.is_none()
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn seeked(&mut self, target: f64) {
        self.at_eof = false;
        self.preroll = Some(target);
        self.read_failures = 0;
    }

    /// A frame at `pts` went to the UI. Ends the pre-roll once the frame is
    /// one the UI will accept for the seek.
    fn frame_pushed(&mut self, pts: f64) {
        if self.preroll.is_some_and(|target| pts >= target - SEEK_TOLERANCE) {
            self.preroll = None;
        }
    }

    fn read_ok(&mut self) {
        self.read_failures = 0;
    }

    /// Count a failed packet read; true once the run is long enough to stop
    /// reading as if the file had ended.
    fn read_failed(&mut self) -> bool {
        self.read_failures += 1;
        if self.read_failures < MAX_READ_FAILURES {
            return false;
        }
        self.reached_eof();
        true
    }

    fn reached_eof(&mut self) {
        self.at_eof = true;
        self.preroll = None;
        self.read_failures = 0;
    }
}

#[derive(PartialEq)]
enum Flow {
    Continue,
    /// A seek arrived while frames were being pushed
    Interrupted,
    Exit,
}

struct AudioPipeline {
    index: usize,
    decoder: decoder::Audio,
    resampler: Resampler,
}

impl AudioPipeline {
    fn open(input: &format::context::Input, clock: &AudioClock) -> anyhow::Result<Option<Self>> {
        let Some(stream) = input.streams().best(Type::Audio) else {
            return Ok(None);
        };
        let decoder = codec::Context::from_parameters(stream.parameters())?
            .decoder()
            .audio()?;
        let resampler = Resampler::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            Sample::F32(SampleType::Packed),
            ChannelLayout::STEREO,
            clock.sample_rate(),
        )
        .context("no resampler for the audio stream")?;
        Ok(Some(Self {
            index: stream.index(),
            decoder,
            resampler,
        }))
    }
}

struct DecodeWorker {
    input: format::context::Input,
    video_index: usize,
    time_base: Rational,
    video: decoder::Video,
    scaler: Scaler,
    audio: Option<AudioPipeline>,
    frames: Sender<VideoFrame>,
    ring: Arc<SampleRing>,
    clock: AudioClock,
    inbox: Receiver<DecoderCommand>,
    gate: ReadGate,
    pending_seek: Option<f64>,
}

impl DecodeWorker {
    fn open(
        path: &Path,
        frames: Sender<VideoFrame>,
        ring: Arc<SampleRing>,
        clock: AudioClock,
        inbox: Receiver<DecoderCommand>,
    ) -> anyhow::Result<Self> {
        let input = format::input(path)?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| anyhow!("no video stream"))?;
        let video_index = stream.index();
        let time_base = stream.time_base();
        let video = codec::Context::from_parameters(stream.parameters())?
            .decoder()
            .video()?;

        let scaler = Scaler::get(
            video.format(),
            video.width(),
            video.height(),
            Pixel::RGBA,
            video.width(),
            video.height(),
            Flags::BILINEAR,
        )
        .context("no RGBA conversion for the video stream")?;

        let audio = AudioPipeline::open(&input, &clock).unwrap_or_else(|e| {
            tracing::warn!("playing without sound: {e:#}");
            None
        });

        Ok(Self {
            input,
            video_index,
            time_base,
            video,
            scaler,
            audio,
            frames,
            ring,
            clock,
            inbox,
            gate: ReadGate::new(),
            pending_seek: None,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        loop {
            if self.drain_inbox() == Flow::Exit {
                return Ok(());
            }
            self.apply_seek();

            if !self.gate.should_read() {
                thread::sleep(IDLE_WAIT);
                continue;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    self.gate.read_ok();
                    if self.decode_packet(&packet)? == Flow::Exit {
                        return Ok(());
                    }
                }
                Err(ffmpeg_next::Error::Eof) => {
                    tracing::debug!("decoder reached end of file");
                    self.gate.reached_eof();
                    if self.drain_video_tail()? == Flow::Exit {
                        return Ok(());
                    }
                }
                Err(e) => {
                    tracing::trace!("skipping unreadable packet: {e}");
                    if self.gate.read_failed() {
                        tracing::warn!("giving up on input after repeated read errors: {e}");
                    }
                }
            }
        }
    }

    fn handle(&mut self, command: DecoderCommand) -> Flow {
        match command {
            DecoderCommand::Shutdown => return Flow::Exit,
            DecoderCommand::Pause => {
                self.gate.set_paused(true);
                self.clock.set_paused(true);
            }
            DecoderCommand::Resume => {
                self.gate.set_paused(false);
                self.clock.set_paused(false);
            }
            DecoderCommand::Seek(target) => {
                self.pending_seek = Some(target);
                return Flow::Interrupted;
            }
        }
        Flow::Continue
    }

    fn drain_inbox(&mut self) -> Flow {
        loop {
            match self.inbox.try_recv() {
                Ok(command) => {
                    if self.handle(command) == Flow::Exit {
                        return Flow::Exit;
                    }
                }
                Err(TryRecvError::Empty) => return Flow::Continue,
                Err(TryRecvError::Disconnected) => return Flow::Exit,
            }
        }
    }

    fn apply_seek(&mut self) {
        let Some(target) = self.pending_seek.take() else {
            return;
        };
        let ts = (target * f64::from(ffmpeg_next::ffi::AV_TIME_BASE)) as i64;
        match self.input.seek(ts, ..ts) {
            Ok(()) => {
                self.video.flush();
                if let Some(audio) = self.audio.as_mut() {
                    audio.decoder.flush();
                }
                self.clock.jump_to(target);
                self.gate.seeked(target);
            }
            Err(e) => tracing::warn!("seek to {target:.2}s failed: {e}"),
        }
    }

    fn decode_packet(&mut self, packet: &Packet) -> anyhow::Result<Flow> {
        let stream = packet.stream();
        if stream == self.video_index {
            if let Err(e) = self.video.send_packet(packet) {
                tracing::trace!("video packet rejected: {e}");
                return Ok(Flow::Continue);
            }
            return self.receive_video();
        }
        if let Some(audio) = self.audio.as_mut().filter(|a| a.index == stream) {
            if let Err(e) = audio.decoder.send_packet(packet) {
                tracing::trace!("audio packet rejected: {e}");
                return Ok(Flow::Continue);
            }
            let mut decoded = AudioFrame::empty();
            while audio.decoder.receive_frame(&mut decoded).is_ok() {
                let mut resampled = AudioFrame::empty();
                if audio.resampler.run(&decoded, &mut resampled).is_err() {
                    continue;
                }
                let count = resampled.samples() * usize::from(OUTPUT_CHANNELS);
                let samples: Vec<f32> = resampled
                    .data(0)
                    .chunks_exact(4)
                    .take(count)
                    .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
                    .collect();
                self.ring.extend(&samples);
            }
        }
        Ok(Flow::Continue)
    }

    fn receive_video(&mut self) -> anyhow::Result<Flow> {
        let mut decoded = RawVideoFrame::empty();
        let mut rgba = RawVideoFrame::empty();
        while self.video.receive_frame(&mut decoded).is_ok() {
            self.scaler.run(&decoded, &mut rgba)?;
            let pts = decoded.pts().unwrap_or(0) as f64 * f64::from(self.time_base);
            let frame = VideoFrame {
                rgba: packed_rgba(&rgba),
                width: rgba.width(),
                height: rgba.height(),
                pts,
            };
            match self.push(frame) {
                Flow::Continue => self.gate.frame_pushed(pts),
                other => return Ok(other),
            }
            if self.gate.holding() {
                // paused pre-roll is done; the rest waits in the decoder
                break;
            }
        }
        Ok(Flow::Continue)
    }

    fn drain_video_tail(&mut self) -> anyhow::Result<Flow> {
        self.video.send_eof()?;
        let flow = self.receive_video()?;
        Ok(if flow == Flow::Interrupted {
            Flow::Continue
        } else {
            flow
        })
    }

    /// Hand a frame to the UI, watching for commands while the queue is full.
    fn push(&mut self, mut frame: VideoFrame) -> Flow {
        loop {
            match self.inbox.try_recv() {
                Ok(command) => match self.handle(command) {
                    Flow::Continue => {}
                    other => return other,
                },
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => return Flow::Exit,
            }

            match self.frames.try_send(frame) {
                Ok(()) => return Flow::Continue,
                Err(TrySendError::Full(back)) => {
                    frame = back;
                    thread::sleep(BACKPRESSURE_WAIT);
                }
                Err(TrySendError::Disconnected(_)) => return Flow::Exit,
            }
        }
    }
}

/// Copy plane 0 of an RGBA frame, dropping any row padding.
fn packed_rgba(frame: &RawVideoFrame) -> Vec<u8> {
    let row = frame.width() as usize * 4;
    let rows = frame.height() as usize;
    let stride = frame.stride(0);
    let data = frame.data(0);
    if stride == row {
        return data[..row * rows].to_vec();
    }
    data.chunks(stride)
        .take(rows)
        .flat_map(|line| &line[..row])
        .copied()
        .collect()
}
