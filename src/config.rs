use std::time::Duration;

/// A named filter shown in the native file dialog.
#[derive(Clone, Debug)]
pub struct FileFilter {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
}

/// Compiled-in defaults for the player window.
///
/// There is no config file; everything the shell needs to know up front
/// lives here.
#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub title: &'static str,
    pub inner_size: [f32; 2],
    pub position: [f32; 2],
    pub min_inner_size: [f32; 2],
    pub poll_interval: Duration,
    /// Initial volume in percent
    pub default_volume: u8,
    pub file_filters: Vec<FileFilter>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            title: "VLC Video Player",
            inner_size: [800.0, 600.0],
            position: [100.0, 100.0],
            min_inner_size: [480.0, 360.0],
            poll_interval: Duration::from_millis(100),
            default_volume: 50,
            file_filters: vec![
                FileFilter {
                    name: "Video files",
                    extensions: &["mp4", "avi", "mkv"],
                },
                FileFilter {
                    name: "All files",
                    extensions: &["*"],
                },
            ],
        }
    }
}

impl PlayerConfig {
    pub fn native_options(&self) -> eframe::NativeOptions {
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_title(self.title)
                .with_inner_size(self.inner_size)
                .with_position(self.position)
                .with_min_inner_size(self.min_inner_size),
            ..Default::default()
        }
    }

    /// Build the file dialog with the configured filters, primary filter first.
    pub fn file_dialog(&self) -> rfd::FileDialog {
        self.file_filters
            .iter()
            .fold(rfd::FileDialog::new().set_title("Choose a video"), |dialog, filter| {
                dialog.add_filter(filter.name, filter.extensions)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_window_layout() {
        let config = PlayerConfig::default();
        assert_eq!(config.title, "VLC Video Player");
        assert_eq!(config.inner_size, [800.0, 600.0]);
        assert_eq!(config.position, [100.0, 100.0]);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.default_volume, 50);
    }

    #[test]
    fn video_filter_comes_first() {
        let config = PlayerConfig::default();
        assert_eq!(config.file_filters[0].extensions, &["mp4", "avi", "mkv"]);
        assert_eq!(config.file_filters.last().map(|f| f.extensions), Some(&["*"][..]));
    }
}
