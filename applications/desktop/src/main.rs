#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("AudioChef failed to start: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = data_dir()?;
    fs::create_dir_all(&data_dir)?;
    init_logging(&data_dir)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let pool = runtime.block_on(chef_storage::open(&data_dir.join("audiochef.db")))?;
    info!(dir = %data_dir.display(), "starting");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 720.0])
            .with_title("AudioChef")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "AudioChef",
        native_options,
        Box::new(|_cc| Ok(Box::new(app::ChefApp::new(runtime, pool)))),
    )?;
    Ok(())
}

/// Platform data dir; the database and the log file live here
fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base = dirs::data_dir().ok_or("no platform data directory")?;
    Ok(base.join("audiochef"))
}

fn init_logging(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("audiochef.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}
