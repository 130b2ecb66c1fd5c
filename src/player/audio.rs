//! Audio side of a session: the sample ring the decoder fills, the clock
//! that counts consumed samples, and the rodio source tying them together.

use parking_lot::Mutex;
use rodio::Source;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Samples between clock updates
const CLOCK_BATCH: u64 = 256;

/// Bounded sample queue that drops the oldest samples instead of blocking
/// the decoder when playback falls behind.
pub struct SampleRing {
    samples: Mutex<VecDeque<f32>>,
    capacity: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        })
    }

    pub fn extend(&self, incoming: &[f32]) {
        let mut samples = self.samples.lock();
        let overflow = (samples.len() + incoming.len())
            .saturating_sub(self.capacity)
            .min(samples.len());
        samples.drain(..overflow);
        let skip = incoming.len().saturating_sub(self.capacity);
        samples.extend(&incoming[skip..]);
    }

    pub fn pop(&self) -> Option<f32> {
        self.samples.lock().pop_front()
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }
}

/// Playback clock driven by the audio output; the video follows it.
#[derive(Clone)]
pub struct AudioClock {
    position_us: Arc<AtomicU64>,
    paused: Arc<AtomicBool>,
    /// Set on seek so the source drops stale samples
    flush: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
}

impl AudioClock {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            position_us: Arc::new(AtomicU64::new(0)),
            paused: Arc::new(AtomicBool::new(true)),
            flush: Arc::new(AtomicBool::new(false)),
            sample_rate,
            channels,
        }
    }

    /// Position in seconds
    pub fn position(&self) -> f64 {
        self.position_us.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    /// Jump to `seconds` and ask the source to flush buffered samples.
    pub fn jump_to(&self, seconds: f64) {
        let us = (seconds.max(0.0) * 1_000_000.0) as u64;
        self.position_us.store(us, Ordering::Relaxed);
        self.flush.store(true, Ordering::Relaxed);
    }

    fn take_flush(&self) -> bool {
        self.flush.swap(false, Ordering::Relaxed)
    }

    fn consumed(&self, samples: u64) {
        if self.paused.load(Ordering::Relaxed) {
            return;
        }
        let per_second = f64::from(self.sample_rate) * f64::from(self.channels);
        let delta_us = (samples as f64 * 1_000_000.0 / per_second) as u64;
        self.position_us.fetch_add(delta_us, Ordering::Relaxed);
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

/// Endless rodio source reading from a [`SampleRing`]; yields silence on
/// underrun and advances the [`AudioClock`] as samples are played.
pub struct ClockedSource {
    ring: Arc<SampleRing>,
    clock: AudioClock,
    played: u64,
    /// Files without audio still need a running clock
    pace_on_silence: bool,
}

impl ClockedSource {
    pub fn new(ring: Arc<SampleRing>, clock: AudioClock) -> Self {
        Self {
            ring,
            clock,
            played: 0,
            pace_on_silence: false,
        }
    }

    /// A source that plays silence and counts it, for video-only files.
    pub fn silent(clock: AudioClock) -> Self {
        Self {
            pace_on_silence: true,
            ..Self::new(SampleRing::new(0), clock)
        }
    }

    fn count(&mut self) {
        self.played += 1;
        if self.played % CLOCK_BATCH == 0 {
            self.clock.consumed(CLOCK_BATCH);
        }
    }
}

impl Iterator for ClockedSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.clock.take_flush() {
            self.ring.clear();
            self.played = 0;
            return Some(0.0);
        }

        match self.ring.pop() {
            Some(sample) => {
                self.count();
                Some(sample)
            }
            None => {
                if self.pace_on_silence {
                    self.count();
                }
                Some(0.0)
            }
        }
    }
}

impl Source for ClockedSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.clock.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.clock.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
