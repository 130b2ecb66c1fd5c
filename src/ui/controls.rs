use egui::{Button, Slider, Ui};

use crate::engine::{PlaybackEngine, PlayerState};
use crate::shell::PlayerShell;
use crate::transport::TransportAction;

pub struct PlayerControls;

impl PlayerControls {
    pub fn show<E: PlaybackEngine>(ui: &mut Ui, shell: &mut PlayerShell<E>) {
        let has_media = shell.has_media();

        ui.horizontal(|ui| {
            let state = shell.state();
            let buttons = [
                ("▶ Play", TransportAction::Play, state != PlayerState::Playing),
                ("⏸ Pause", TransportAction::Pause, state == PlayerState::Playing),
                ("⏹ Stop", TransportAction::Stop, true),
            ];
            for (label, action, enabled) in buttons {
                if ui
                    .add_enabled(has_media && enabled, Button::new(label))
                    .clicked()
                {
                    shell.apply(action);
                }
            }

            ui.separator();

            ui.label("Volume");
            let mut volume = shell.volume();
            if ui
                .add(Slider::new(&mut volume, 0..=100).suffix("%"))
                .changed()
            {
                shell.set_volume(i32::from(volume));
            }
        });

        ui.horizontal(|ui| {
            ui.label("Time");
            ui.label(format_time(shell.position()));

            // Programmatic poller updates only change the value passed in here;
            // the pointer state below reflects user input alone.
            let mut percent = shell.seek().value();
            let response = ui.add_enabled(
                has_media,
                Slider::new(&mut percent, 0..=100)
                    .show_value(false)
                    .trailing_fill(true),
            );

            shell.seek_slider_input(response.is_pointer_button_down_on(), percent);

            ui.label(format_time(shell.duration()));
        });
    }
}

pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_hours() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(75), "01:15");
        assert_eq!(format_time(3 * 3600 + 62), "03:01:02");
    }
}
