/// Whether the user currently holds the seek slider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragMode {
    #[default]
    Idle,
    Dragging,
}

/// State behind the time slider.
///
/// The displayed value is a percentage of the media duration. Only the drag
/// handlers change the mode; the poller reads it and writes the display
/// through [`SeekControl::set_display`], which never counts as user input.
#[derive(Clone, Debug, Default)]
pub struct SeekControl {
    mode: DragMode,
    value: u8,
}

impl SeekControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        self.mode == DragMode::Dragging
    }

    /// Current slider value in percent.
    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn begin_drag(&mut self) {
        self.mode = DragMode::Dragging;
    }

    /// User moved the handle. Ignored unless a drag is in progress.
    pub fn drag_to(&mut self, percent: u8) {
        if self.is_dragging() {
            self.value = percent.min(100);
        }
    }

    /// Finish the drag, yielding the value to seek to. Returns `None` if no
    /// drag was in progress, so a release only ever produces one seek.
    pub fn end_drag(&mut self) -> Option<u8> {
        match self.mode {
            DragMode::Dragging => {
                self.mode = DragMode::Idle;
                Some(self.value)
            }
            DragMode::Idle => None,
        }
    }

    /// Programmatic update from the poller. Returns false while dragging.
    pub fn set_display(&mut self, percent: u8) -> bool {
        if self.is_dragging() {
            return false;
        }
        self.value = percent.min(100);
        true
    }

    /// Drop back to the start, e.g. when a new file is opened.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Seconds corresponding to `percent` of `duration`, rounded to the nearest second.
pub fn seconds_for(percent: u8, duration: u64) -> i64 {
    (duration as f64 * f64::from(percent.min(100)) / 100.0).round() as i64
}

/// Displayed percent for a position, rounded. 0 when the duration is unknown.
pub fn percent_for(position: u64, duration: u64) -> u8 {
    if duration == 0 {
        return 0;
    }
    let percent = (position as f64 / duration as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_writes_are_ignored_while_dragging() {
        let mut seek = SeekControl::new();
        assert!(seek.set_display(10));

        seek.begin_drag();
        seek.drag_to(80);
        assert!(!seek.set_display(11));
        assert_eq!(seek.value(), 80);
    }

    #[test]
    fn release_yields_final_value_once() {
        let mut seek = SeekControl::new();
        seek.begin_drag();
        seek.drag_to(20);
        seek.drag_to(50);
        assert_eq!(seek.end_drag(), Some(50));
        assert_eq!(seek.end_drag(), None);
        assert_eq!(seek.mode(), DragMode::Idle);
    }

    #[test]
    fn moves_outside_a_drag_do_nothing() {
        let mut seek = SeekControl::new();
        seek.drag_to(90);
        assert_eq!(seek.value(), 0);
    }

    #[test]
    fn percent_conversions() {
        assert_eq!(percent_for(3, 60), 5);
        assert_eq!(percent_for(60, 60), 100);
        assert_eq!(percent_for(5, 0), 0);
        assert_eq!(seconds_for(50, 60), 30);
        assert_eq!(seconds_for(100, 61), 61);
        assert_eq!(seconds_for(33, 0), 0);
    }
}
