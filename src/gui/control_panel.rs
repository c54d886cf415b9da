//! Control Panel Widget
//! Left side panel with data source, filters and export controls.

use crate::data::{DateRange, FilterState};
use crate::stats::Dimension;
use chrono::NaiveDate;
use egui::{Color32, ComboBox, RichText, ScrollArea};
use std::path::PathBuf;

/// A multiselect list: options plus a checked flag per option.
#[derive(Default, Clone)]
pub struct Selection {
    pub options: Vec<String>,
    pub checked: Vec<bool>,
}

impl Selection {
    /// Replace options, keeping the flag of options seen before. New options
    /// start checked.
    pub fn set_options(&mut self, options: Vec<String>) {
        let checked = options
            .iter()
            .map(|o| {
                self.options
                    .iter()
                    .position(|prev| prev == o)
                    .map(|i| self.checked[i])
                    .unwrap_or(true)
            })
            .collect();
        self.options = options;
        self.checked = checked;
    }

    pub fn selected(&self) -> Vec<String> {
        self.options
            .iter()
            .zip(self.checked.iter())
            .filter(|(_, &checked)| checked)
            .map(|(o, _)| o.clone())
            .collect()
    }

    fn set_all(&mut self, value: bool) {
        self.checked.iter_mut().for_each(|v| *v = value);
    }

    /// Checkbox list with Select All / Clear All. Returns true on change.
    fn show(&mut self, ui: &mut egui::Ui, id: &str) -> bool {
        let mut changed = false;
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .id_salt(id)
                    .max_height(140.0)
                    .show(ui, |ui| {
                        for (option, checked) in self.options.iter().zip(self.checked.iter_mut()) {
                            changed |= ui.checkbox(checked, option.as_str()).changed();
                        }
                    });
            });

        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                self.set_all(true);
                changed = true;
            }
            if ui.small_button("Clear All").clicked() {
                self.set_all(false);
                changed = true;
            }
        });
        changed
    }
}

/// Left side control panel with data source and filter controls.
pub struct ControlPanel {
    pub data_dir: PathBuf,
    pub dates: Vec<NaiveDate>,
    pub start_idx: usize,
    pub end_idx: usize,
    pub platforms: Selection,
    pub states: Selection,
    pub breakdown: Dimension,
    pub progress: f32,
    pub status: String,
    pub export_enabled: bool,
}

impl ControlPanel {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            dates: Vec::new(),
            start_idx: 0,
            end_idx: 0,
            platforms: Selection::default(),
            states: Selection::default(),
            breakdown: Dimension::PlatformTactic,
            progress: 0.0,
            status: "Ready".to_string(),
            export_enabled: false,
        }
    }

    /// Reset the filters for a freshly loaded dataset: full date range,
    /// every platform selected.
    pub fn set_dataset_options(&mut self, dates: Vec<NaiveDate>, platforms: Vec<String>) {
        self.start_idx = 0;
        self.end_idx = dates.len().saturating_sub(1);
        self.dates = dates;
        self.platforms = Selection::default();
        self.platforms.set_options(platforms);
        self.states = Selection::default();
        self.export_enabled = !self.dates.is_empty();
    }

    pub fn update_platform_options(&mut self, platforms: Vec<String>) {
        self.platforms.set_options(platforms);
    }

    pub fn update_state_options(&mut self, states: Vec<String>) {
        self.states.set_options(states);
    }

    /// Current filter selection.
    pub fn filters(&self) -> FilterState {
        let date_range = match (self.dates.get(self.start_idx), self.dates.get(self.end_idx)) {
            (Some(&start), Some(&end)) => Some(DateRange::new(start, end)),
            _ => None,
        };

        FilterState {
            date_range,
            platforms: self.platforms.selected(),
            states: self.states.selected(),
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 Marketing Intelligence")
                    .size(20.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(RichText::new("Dashboard").size(11.0).color(Color32::GRAY));
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(self.data_dir.display().to_string())
                        .size(12.0)
                        .color(Color32::WHITE),
                );
                ui.horizontal(|ui| {
                    if ui.button("📂 Browse").clicked() {
                        action = ControlPanelAction::BrowseDataDir;
                    }
                    if ui.button("🔄 Reload").clicked() {
                        action = ControlPanelAction::Reload;
                    }
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filters Section =====
        ui.label(RichText::new("🔍 Filters").size(14.0).strong());
        ui.add_space(8.0);

        if !self.dates.is_empty() {
            let max = self.dates.len() - 1;
            let dates = &self.dates;
            let fmt = move |v: f64, _: std::ops::RangeInclusive<usize>| {
                dates
                    .get(v as usize)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            };

            ui.label("Select Date Range");
            let start_changed = ui
                .add(
                    egui::Slider::new(&mut self.start_idx, 0..=max)
                        .text("From")
                        .custom_formatter(fmt),
                )
                .changed();
            let end_changed = ui
                .add(
                    egui::Slider::new(&mut self.end_idx, 0..=max)
                        .text("To")
                        .custom_formatter(fmt),
                )
                .changed();

            // Keep start <= end, moving whichever bound was not touched
            if self.start_idx > self.end_idx {
                if start_changed {
                    self.end_idx = self.start_idx;
                } else {
                    self.start_idx = self.end_idx;
                }
            }
            if start_changed || end_changed {
                action = ControlPanelAction::FiltersChanged;
            }
            ui.add_space(8.0);
        }

        ui.label("Select Platforms");
        if self.platforms.show(ui, "platforms") {
            action = ControlPanelAction::FiltersChanged;
        }
        ui.add_space(8.0);

        ui.label("Select States");
        if self.states.show(ui, "states") {
            action = ControlPanelAction::FiltersChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Breakdown Section =====
        ui.label(RichText::new("🔧 Breakdown").size(14.0).strong());
        ui.add_space(5.0);
        ui.horizontal(|ui| {
            ui.add_sized([90.0, 20.0], egui::Label::new("Group by:"));
            ComboBox::from_id_salt("breakdown")
                .width(170.0)
                .selected_text(self.breakdown.label())
                .show_ui(ui, |ui| {
                    for dimension in Dimension::ALL {
                        if ui
                            .selectable_label(self.breakdown == dimension, dimension.label())
                            .clicked()
                        {
                            self.breakdown = dimension;
                            action = ControlPanelAction::FiltersChanged;
                        }
                    }
                });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("📄 Export Report").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Export;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Loaded") || self.status.contains("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseDataDir,
    Reload,
    FiltersChanged,
    Export,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn new_options_start_checked_and_old_flags_survive() {
        let mut selection = Selection::default();
        selection.set_options(vec!["CA".into(), "NY".into()]);
        selection.checked[0] = false;

        selection.set_options(vec!["CA".into(), "NY".into(), "WA".into()]);
        assert_eq!(selection.checked, vec![false, true, true]);
        assert_eq!(selection.selected(), vec!["NY", "WA"]);
    }

    #[test]
    fn filters_reflect_slider_positions() {
        let mut panel = ControlPanel::new(PathBuf::from("data"));
        panel.set_dataset_options(
            vec![ymd(1), ymd(2), ymd(3)],
            vec!["Facebook".into(), "Google".into()],
        );

        let filters = panel.filters();
        assert_eq!(filters.date_range, Some(DateRange::new(ymd(1), ymd(3))));
        assert_eq!(filters.platforms, vec!["Facebook", "Google"]);
        assert!(filters.states.is_empty());

        panel.start_idx = 1;
        panel.platforms.checked[1] = false;
        let filters = panel.filters();
        assert_eq!(filters.date_range, Some(DateRange::new(ymd(2), ymd(3))));
        assert_eq!(filters.platforms, vec!["Facebook"]);
    }

    #[test]
    fn platforms_outside_the_range_drop_out_and_cleared_ones_stay_cleared() {
        let mut panel = ControlPanel::new(PathBuf::from("data"));
        panel.set_dataset_options(
            vec![ymd(1), ymd(2)],
            vec!["Facebook".into(), "Google".into(), "TikTok".into()],
        );
        panel.platforms.checked[0] = false;

        panel.update_platform_options(vec!["Facebook".into(), "TikTok".into()]);
        assert_eq!(panel.filters().platforms, vec!["TikTok"]);

        panel.update_platform_options(vec![
            "Facebook".into(),
            "Google".into(),
            "TikTok".into(),
        ]);
        assert_eq!(panel.filters().platforms, vec!["Google", "TikTok"]);
    }

    #[test]
    fn no_dates_means_no_range() {
        let panel = ControlPanel::new(PathBuf::from("data"));
        assert_eq!(panel.filters().date_range, None);
    }
}
