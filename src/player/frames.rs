use crossbeam_channel::Receiver;
use std::collections::VecDeque;

/// Frames more than this far behind the clock are dropped (seconds)
const LATE_TOLERANCE: f64 = 0.02;
/// Frames up to this far ahead of the clock are shown early (seconds)
const EARLY_TOLERANCE: f64 = 0.02;
/// How far before a seek target a keyframe may land and still be accepted
pub(super) const SEEK_TOLERANCE: f64 = 0.5;

/// A decoded RGBA frame
pub struct VideoFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Presentation time in seconds
    pub pts: f64,
}

/// Buffers decoded frames and hands them out in step with the audio clock.
pub struct FrameQueue {
    receiver: Receiver<VideoFrame>,
    pending: VecDeque<VideoFrame>,
    shown: Option<VideoFrame>,
    capacity: usize,
}

impl FrameQueue {
    pub fn new(receiver: Receiver<VideoFrame>, capacity: usize) -> Self {
        Self {
            receiver,
            pending: VecDeque::with_capacity(capacity),
            shown: None,
            capacity,
        }
    }

    fn fill(&mut self) {
        while self.pending.len() < self.capacity {
            match self.receiver.try_recv() {
                Ok(frame) => self.pending.push_back(frame),
                Err(_) => break,
            }
        }
    }

    /// The frame to present at `clock`, if it differs from the one on screen.
    pub fn next_due(&mut self, clock: f64) -> Option<&VideoFrame> {
        self.fill();
        while self
            .pending
            .front()
            .is_some_and(|f| f.pts < clock - LATE_TOLERANCE)
        {
            self.pending.pop_front();
        }
        if self
            .pending
            .front()
            .is_some_and(|f| f.pts <= clock + EARLY_TOLERANCE)
        {
            self.shown = self.pending.pop_front();
            return self.shown.as_ref();
        }
        None
    }

    /// First frame at or near `target` after a seek. Less strict than
    /// [`FrameQueue::next_due`] since the decoder lands on keyframes.
    pub fn first_after_seek(&mut self, target: f64) -> Option<&VideoFrame> {
        self.fill();
        while self
            .pending
            .front()
            .is_some_and(|f| f.pts < target - SEEK_TOLERANCE)
        {
            self.pending.pop_front();
        }
        let frame = self.pending.pop_front()?;
        self.shown = Some(frame);
        self.shown.as_ref()
    }

    /// Discard everything, including frames still in the channel.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.shown = None;
        while self.receiver.try_recv().is_ok() {}
    }

    /// Nothing buffered or in flight.
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.receiver.is_empty()
    }
}
