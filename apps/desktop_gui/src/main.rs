mod backend_bridge;
mod controller;
mod ui;

use anyhow::anyhow;
use clap::Parser;
use client_core::{config::normalize_base_url, load_settings};
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::DesktopGuiApp;

#[derive(Parser, Debug)]
#[command(about = "Desktop front end for the legal document analysis service")]
struct Args {
    /// Overrides the analysis service base URL from settings and environment.
    #[arg(long)]
    api_base_url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings()?.with_api_base_url(args.api_base_url);
    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    let api_base_url = settings.api_base_url.clone();
    tracing::info!(api_base_url = %api_base_url, "starting desktop gui");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("LegalDoc Analyzer")
            .with_inner_size([1024.0, 760.0])
            .with_min_inner_size([720.0, 560.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "LegalDoc Analyzer",
        options,
        Box::new(|_cc| Ok(Box::new(DesktopGuiApp::new(cmd_tx, ui_rx, api_base_url)))),
    )
    .map_err(|err| anyhow!("failed to run desktop gui: {err}"))
}
