use egui::{CentralPanel, Color32, TopBottomPanel, Vec2};
use std::path::Path;
use std::time::Instant;

use crate::config::PlayerConfig;
use crate::engine::PlaybackEngine;
use crate::player::{FfmpegEngine, RenderSurface};
use crate::shell::PlayerShell;
use crate::transport::SHORTCUTS;
use crate::ui::controls::PlayerControls;

/// The player window.
pub struct VideoPlayerApp {
    shell: PlayerShell<FfmpegEngine>,
    config: PlayerConfig,
    /// Ask for a file on the first frame
    prompt_on_start: bool,
}

impl VideoPlayerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: PlayerConfig) -> Self {
        let surface = RenderSurface::new(&cc.egui_ctx);
        let shell = PlayerShell::new(FfmpegEngine::new(surface), &config);
        Self {
            shell,
            config,
            prompt_on_start: true,
        }
    }

    fn open_dialog(&mut self) {
        match self.config.file_dialog().pick_file() {
            Some(path) => self.open(&path),
            None => tracing::info!("file selection cancelled"),
        }
    }

    fn open(&mut self, path: &Path) {
        self.shell.open(path);
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        let (actions, dropped) = ctx.input(|i| {
            let actions: Vec<_> = if i.focused {
                SHORTCUTS
                    .iter()
                    .filter(|(key, _)| i.key_pressed(*key))
                    .map(|(_, action)| *action)
                    .collect()
            } else {
                Vec::new()
            };
            let dropped = i.raw.dropped_files.first().and_then(|f| f.path.clone());
            (actions, dropped)
        });

        for action in actions {
            self.shell.apply(action);
        }
        if let Some(path) = dropped {
            self.open(&path);
        }
    }

    fn header(&mut self, ui: &mut egui::Ui) {
        let mut open_requested = false;
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open...").clicked() {
                    ui.close_menu();
                    open_requested = true;
                }
                if ui.button("Quit").clicked() {
                    ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });

        ui.label(self.shell.file_label());

        let mut dismiss = false;
        if let Some(notice) = self.shell.notice() {
            ui.horizontal(|ui| {
                ui.colored_label(Color32::RED, notice);
                dismiss = ui.small_button("✖").clicked();
            });
        }
        if dismiss {
            self.shell.dismiss_notice();
        }
        if open_requested {
            self.open_dialog();
        }
    }

    fn video(&mut self, ui: &mut egui::Ui) {
        let Some(engine) = self.shell.engine() else {
            return;
        };
        let Some(info) = engine.session() else {
            let mut open_requested = false;
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 3.0);
                ui.heading("No video loaded");
                ui.add_space(10.0);
                open_requested = ui.button("Open Video File...").clicked();
                ui.add_space(10.0);
                ui.label("Or drag and drop a video file");
            });
            if open_requested {
                self.open_dialog();
            }
            return;
        };

        let texture = engine.surface().texture_id();
        let available = ui.available_size();
        let aspect = info.width.max(1) as f32 / info.height.max(1) as f32;
        let size = if aspect > available.x / available.y {
            Vec2::new(available.x, available.x / aspect)
        } else {
            Vec2::new(available.y * aspect, available.y)
        };
        ui.centered_and_justified(|ui| {
            ui.image((texture, size));
        });
    }
}

impl eframe::App for VideoPlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if std::mem::take(&mut self.prompt_on_start) {
            self.open_dialog();
        }

        self.handle_input(ctx);
        self.shell.poll(Instant::now());
        if let Some(engine) = self.shell.engine_mut() {
            engine.update();
        }

        TopBottomPanel::top("header").show(ctx, |ui| self.header(ui));
        TopBottomPanel::bottom("controls").show(ctx, |ui| {
            PlayerControls::show(ui, &mut self.shell);
        });
        CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| self.video(ui));

        // keeps the progress poller ticking while idle
        ctx.request_repaint_after(self.shell.poller().interval());
    }
}

impl Drop for VideoPlayerApp {
    fn drop(&mut self) {
        self.shell.shutdown();
    }
}
