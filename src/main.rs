use egui_clip_player::{PlayerConfig, VideoPlayerApp};

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = PlayerConfig::default();
    let options = config.native_options();
    let title = config.title;
    tracing::info!(title, "starting player");

    eframe::run_native(
        title,
        options,
        Box::new(|cc| Ok(Box::new(VideoPlayerApp::new(cc, config)))),
    )
}
