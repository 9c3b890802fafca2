mod app;
mod config;
mod document;
mod error;
mod export;
mod hit;
mod host;
mod pin;
mod render;
mod session;
mod store;
mod view;
mod workspace;

use eframe::egui;
use std::path::PathBuf;

use app::PinAnnotateApp;
use config::AppConfig;

// ── Main ────────────────────────────────────────────────────────────────────

fn main() -> eframe::Result {
    // The logger goes up first so config warnings are recorded; the
    // configured level is applied afterwards unless RUST_LOG is set.
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Trace)
        .parse_default_env()
        .init();
    let rust_log_set = std::env::var_os("RUST_LOG").is_some();
    if !rust_log_set {
        log::set_max_level(log::LevelFilter::Info);
    }

    let config = AppConfig::load_or_default();
    if let Some(level) = config.max_log_level(rust_log_set) {
        log::set_max_level(level);
    }

    let arg = std::env::args().nth(1);
    if arg.as_deref() == Some("--init-config") {
        let Some(path) = AppConfig::default_path() else {
            eprintln!("No config directory available");
            std::process::exit(1);
        };
        if let Err(e) = config.save_to(&path) {
            eprintln!("Cannot write {}: {}", path.display(), e);
            std::process::exit(1);
        }
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let image_path = arg.map(PathBuf::from);
    if let Some(path) = &image_path {
        if !path.exists() {
            eprintln!("File not found: {}", path.display());
            std::process::exit(1);
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("pin-annotate"),
        ..Default::default()
    };

    eframe::run_native(
        "pin-annotate",
        options,
        Box::new(move |_cc| Ok(Box::new(PinAnnotateApp::new(config, image_path)))),
    )
}
