//! Marketing Dashboard Main Application
//! Main window with filter panel and dashboard viewer.

use crate::charts::StaticChartRenderer;
use crate::config::DashboardConfig;
use crate::data::{DataLoader, DataProcessor, Dataset, TableExporter};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::stats::DashboardView;
use egui::SidePanel;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver};
use std::thread;

/// Data loading result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete(Dataset),
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    dataset: Option<Dataset>,
    view: Option<DashboardView>,
    load_error: Option<String>,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let mut app = Self {
            control_panel: ControlPanel::new(config.data_dir.clone()),
            chart_viewer: ChartViewer::new(),
            config,
            dataset: None,
            view: None,
            load_error: None,
            load_rx: None,
            is_loading: false,
        };
        app.start_load();
        app
    }

    /// Load all sources in a background thread.
    fn start_load(&mut self) {
        if self.is_loading {
            return;
        }

        self.control_panel.data_dir = self.config.data_dir.clone();
        self.control_panel.set_progress(5.0, "Loading data...");
        self.is_loading = true;
        self.load_error = None;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let config = self.config.clone();

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress(
                20.0,
                format!("Reading CSV files from {}...", config.data_dir.display()),
            ));

            match DataLoader::new(config).load() {
                Ok(dataset) => {
                    let _ = tx.send(LoadResult::Complete(dataset));
                }
                Err(e) => {
                    let _ = tx.send(LoadResult::Error(e.to_string()));
                }
            }
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadResult::Complete(dataset) => {
                        let status = format!(
                            "Loaded {} business days, {} marketing rows ({} dropped)",
                            dataset.business.len(),
                            dataset.marketing.len(),
                            dataset.rows_dropped()
                        );
                        for file in &dataset.report {
                            log::debug!(
                                "{}: {} rows read, {} dropped",
                                file.source,
                                file.rows_read,
                                file.rows_dropped
                            );
                        }
                        if let Some((first, last)) = dataset.date_bounds() {
                            log::info!("Business data covers {} to {}", first, last);
                        }
                        self.control_panel
                            .set_dataset_options(dataset.dates(), dataset.platforms.clone());
                        self.dataset = Some(dataset);
                        self.rebuild_view();
                        self.control_panel.set_progress(100.0, &status);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        log::error!("Failed to load dashboard data: {}", error);
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", error));
                        // The previous dataset, if any, stays on screen
                        self.load_error = Some(error);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Recompute the dashboard for the current filters.
    fn rebuild_view(&mut self) {
        let Some(dataset) = &self.dataset else {
            return;
        };

        // Platform options follow the date range, state options follow
        // the date range and platform selection
        let platforms = DataProcessor::platform_options(
            &dataset.marketing,
            &dataset.platforms,
            self.control_panel.filters().date_range,
        );
        self.control_panel.update_platform_options(platforms);
        let states =
            DataProcessor::state_options(&dataset.marketing, &self.control_panel.filters());
        self.control_panel.update_state_options(states);

        let filters = self.control_panel.filters();
        let view = DashboardView::build(
            dataset,
            &filters,
            self.control_panel.breakdown,
            &self.config,
        );
        self.control_panel.export_enabled = !view.is_empty();
        self.view = Some(view);
    }

    fn handle_browse_data_dir(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config.data_dir)
            .pick_folder()
        {
            log::info!("Data directory changed to {}", dir.display());
            self.config.data_dir = dir;
            self.start_load();
        }
    }

    /// Export charts and tables for the current view into a chosen folder.
    fn handle_export(&mut self) {
        let Some(view) = &self.view else {
            self.control_panel.set_progress(0.0, "Nothing to export");
            return;
        };

        let dir = match rfd::FileDialog::new().pick_folder() {
            Some(dir) => dir,
            None => return, // User cancelled
        };

        self.control_panel.set_progress(10.0, "Rendering charts...");
        let result = Self::export_to(view, &dir);
        match result {
            Ok(count) => {
                self.control_panel.set_progress(
                    100.0,
                    &format!("Exported {} files to {}", count, dir.display()),
                );
                if let Err(e) = open::that(&dir) {
                    log::warn!("Could not open {}: {}", dir.display(), e);
                }
            }
            Err(e) => {
                log::error!("Export failed: {:#}", e);
                self.control_panel
                    .set_progress(0.0, &format!("Export error: {}", e));
            }
        }
    }

    fn export_to(view: &DashboardView, dir: &Path) -> anyhow::Result<usize> {
        let charts = StaticChartRenderer::export_dashboard(view, dir)?;
        let tables = TableExporter::export_tables(view, dir)?;
        Ok(charts.len() + tables.len())
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Filters
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseDataDir => self.handle_browse_data_dir(),
                        ControlPanelAction::Reload => self.start_load(),
                        ControlPanelAction::FiltersChanged => self.rebuild_view(),
                        ControlPanelAction::Export => self.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer
                .show(ui, self.view.as_ref(), self.load_error.as_deref());
        });
    }
}
