//! Marketing Intelligence Dashboard
//!
//! Joins daily business results with Facebook, Google and TikTok marketing
//! data and shows KPIs, platform, tactic, state and campaign charts.
//!
//! Usage: `marketing_dashboard [--config <file>] [--data-dir <dir>]` (`--help` for details)

mod charts;
mod config;
mod data;
mod gui;
mod stats;

use anyhow::Context;
use clap::Parser;
use config::{CliArgs, DashboardConfig};
use eframe::egui;
use env_logger::Env;
use gui::DashboardApp;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let config = DashboardConfig::from_cli(&args).context("Invalid configuration")?;
    log::info!("Starting dashboard with data from {}", config.data_dir.display());

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Marketing Intelligence Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Marketing Intelligence Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run dashboard window: {}", e))
}
