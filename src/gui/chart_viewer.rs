//! Chart Viewer Widget
//! Central scrollable panel: KPI tiles, dashboard charts and detail tables.

use crate::charts::format;
use crate::charts::{BarSeries, ChartPlotter, PANEL_COLORS};
use crate::stats::{DashboardView, GroupSummary, Metric, MetricTotals, StatsCalculator};
use egui::{Color32, RichText, ScrollArea};

const SECTION_SPACING: f32 = 20.0;
const CHART_HEIGHT: f32 = 260.0;
const TABLE_HEIGHT: f32 = 320.0;
const ROW_HEIGHT: f32 = 18.0;

/// Tabs of the detailed data section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Business,
    Marketing,
    State,
    Combined,
}

impl DetailTab {
    pub const ALL: [DetailTab; 4] = [
        DetailTab::Business,
        DetailTab::Marketing,
        DetailTab::State,
        DetailTab::Combined,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DetailTab::Business => "Business Metrics",
            DetailTab::Marketing => "Marketing Performance",
            DetailTab::State => "State-wise Analysis",
            DetailTab::Combined => "Combined View",
        }
    }
}

/// Scrollable dashboard display area.
pub struct ChartViewer {
    pub detail_tab: DetailTab,
    /// Ranking metric of the breakdown section
    pub breakdown_metric: Metric,
}

impl Default for ChartViewer {
    fn default() -> Self {
        Self {
            detail_tab: DetailTab::default(),
            breakdown_metric: Metric::AttributedRevenue,
        }
    }
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the dashboard for the current view, or a placeholder.
    pub fn show(&mut self, ui: &mut egui::Ui, view: Option<&DashboardView>, error: Option<&str>) {
        if let Some(error) = error {
            Self::draw_error_banner(ui, error);
            ui.add_space(10.0);
        }

        let Some(view) = view else {
            if error.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("Loading data...").size(20.0));
                });
            }
            return;
        };

        if view.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No data for the selected filters").size(20.0));
            });
            return;
        }

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(
                    RichText::new("📊 Marketing Intelligence Dashboard")
                        .size(26.0)
                        .strong(),
                );
                ui.add_space(SECTION_SPACING);

                Self::draw_kpis(ui, view);
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "📈 Revenue Performance Analysis");
                ChartPlotter::draw_revenue_trend(ui, &view.combined, CHART_HEIGHT * 1.4);
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "🎯 Platform Performance Comparison");
                Self::draw_platform_grid(ui, view);
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "🎨 Tactic Effectiveness Analysis");
                Self::draw_tactics(ui, view);
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "🗺 State-wise Performance Analysis");
                Self::draw_states(ui, view);
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "📊 Click-Through Rate Analysis");
                Self::draw_ctr_analysis(ui, view);
                ui.add_space(SECTION_SPACING);

                Self::section(
                    ui,
                    &format!("🔧 Breakdown by {}", view.breakdown_dimension.label()),
                );
                self.draw_breakdown(ui, view);
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "🔗 Metric Correlations");
                ChartPlotter::draw_correlation(ui, &view.correlation);
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "📋 Detailed Data");
                self.draw_details(ui, view);
                ui.add_space(SECTION_SPACING);

                Self::draw_footer(ui, view);
            });
    }

    fn section(ui: &mut egui::Ui, title: &str) {
        ui.label(RichText::new(title).size(18.0).strong());
        ui.separator();
        ui.add_space(6.0);
    }

    fn draw_error_banner(ui: &mut egui::Ui, error: &str) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(2.0, Color32::from_rgb(220, 53, 69)))
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(format!("⚠ Error loading data: {}", error))
                        .size(14.0)
                        .color(Color32::from_rgb(220, 53, 69)),
                );
                ui.label(
                    RichText::new("Check that the CSV files exist in the data directory.")
                        .size(12.0)
                        .color(Color32::GRAY),
                );
            });
    }

    fn draw_kpis(ui: &mut egui::Ui, view: &DashboardView) {
        let kpis = &view.kpis;
        let width = (ui.available_width() - 4.0 * 30.0) / 4.0;
        ui.horizontal(|ui| {
            ChartPlotter::draw_kpi_tile(
                ui,
                "💰 Total Revenue",
                &format::money(kpis.total_revenue),
                &format!("{} avg/day", format::money(kpis.avg_daily_revenue)),
                width,
            );
            ChartPlotter::draw_kpi_tile(
                ui,
                "💸 Total Ad Spend",
                &format::money(kpis.total_spend),
                &format!("{} avg/day", format::money(kpis.avg_daily_spend)),
                width,
            );
            ChartPlotter::draw_kpi_tile(
                ui,
                "🎯 Average CTR",
                &format::percent(kpis.avg_ctr),
                "Click Rate",
                width,
            );
            ChartPlotter::draw_kpi_tile(
                ui,
                "🛒 Total Orders",
                &format::thousands(kpis.total_orders as f64),
                &format!("{:.0} avg/day", kpis.avg_daily_orders),
                width,
            );
        });
    }

    fn series<'a>(
        id: &'a str,
        title: &'a str,
        y_label: &'a str,
        groups: &[GroupSummary],
        value: impl Fn(&MetricTotals) -> f64,
        color: Color32,
    ) -> BarSeries<'a> {
        BarSeries {
            id,
            title,
            y_label,
            labels: groups.iter().map(|g| g.label()).collect(),
            values: groups.iter().map(|g| value(&g.totals)).collect(),
            color,
        }
    }

    fn draw_platform_grid(ui: &mut egui::Ui, view: &DashboardView) {
        let groups = &view.by_platform;
        let panels = [
            Self::series(
                "platform_spend",
                "Spend by Platform",
                "Spend ($)",
                groups,
                |t| t.spend,
                PANEL_COLORS[0],
            ),
            Self::series(
                "platform_revenue",
                "Revenue by Platform",
                "Revenue ($)",
                groups,
                |t| t.attributed_revenue,
                PANEL_COLORS[1],
            ),
            Self::series(
                "platform_ctr",
                "CTR by Platform",
                "CTR (%)",
                groups,
                MetricTotals::ctr,
                PANEL_COLORS[2],
            ),
            Self::series(
                "platform_cpc",
                "CPC by Platform",
                "CPC ($)",
                groups,
                MetricTotals::cpc,
                PANEL_COLORS[3],
            ),
        ];
        ChartPlotter::draw_metric_grid(ui, &panels, CHART_HEIGHT * 0.8);
    }

    fn draw_tactics(ui: &mut egui::Ui, view: &DashboardView) {
        ui.columns(2, |cols| {
            cols[0].label(RichText::new("Spend vs Revenue by Tactic").size(13.0).strong());
            ChartPlotter::draw_tactic_bubbles(&mut cols[0], &view.by_tactic, CHART_HEIGHT * 1.2);

            cols[1].label(RichText::new("Top Tactics by CTR").size(13.0).strong());
            let labels: Vec<String> = view.top_tactics.iter().map(|g| g.label()).collect();
            let values: Vec<f64> = view.top_tactics.iter().map(|g| g.totals.ctr()).collect();
            ChartPlotter::draw_horizontal_bars(
                &mut cols[1],
                "top_tactics",
                &labels,
                &values,
                Some(values.as_slice()),
                "CTR (%)",
                CHART_HEIGHT * 1.2,
            );
        });
    }

    fn draw_states(ui: &mut egui::Ui, view: &DashboardView) {
        if let Some(highlights) = &view.state_highlights {
            let width = (ui.available_width() - 4.0 * 30.0) / 4.0;
            ui.horizontal(|ui| {
                ChartPlotter::draw_kpi_tile(
                    ui,
                    "🏆 Top Revenue State",
                    &highlights.top_revenue.label(),
                    &format::money(highlights.top_revenue.totals.attributed_revenue),
                    width,
                );
                ChartPlotter::draw_kpi_tile(
                    ui,
                    "📈 Best CTR State",
                    &highlights.best_ctr.label(),
                    &format::percent(highlights.best_ctr.totals.ctr()),
                    width,
                );
                match &highlights.best_cpc {
                    Some(best) => ChartPlotter::draw_kpi_tile(
                        ui,
                        "💰 Best CPC State",
                        &best.label(),
                        &format::money_cents(best.totals.cpc()),
                        width,
                    ),
                    None => {
                        ChartPlotter::draw_kpi_tile(ui, "💰 Best CPC State", "-", "No clicks", width)
                    }
                }
                ChartPlotter::draw_kpi_tile(
                    ui,
                    "🌍 States Active",
                    &highlights.states_active.to_string(),
                    &format!("{} platform combinations", highlights.platform_combinations),
                    width,
                );
            });
            ui.add_space(10.0);
        }

        let panels = Self::state_panels(&view.by_state);
        ChartPlotter::draw_metric_grid(ui, &panels, CHART_HEIGHT * 0.8);

        ui.add_space(10.0);
        ui.label(RichText::new("CTR by State and Platform").size(13.0).strong());
        ChartPlotter::draw_pivot_heatmap(ui, "state_platform_ctr", &view.state_platform_ctr, "%");
    }

    /// Revenue, spend, CTR and CPC per state.
    fn state_panels(groups: &[GroupSummary]) -> [BarSeries<'static>; 4] {
        [
            Self::series(
                "state_revenue",
                "Revenue by State",
                "Revenue ($)",
                groups,
                |t| t.attributed_revenue,
                PANEL_COLORS[0],
            ),
            Self::series(
                "state_spend",
                "Spend by State",
                "Spend ($)",
                groups,
                |t| t.spend,
                PANEL_COLORS[1],
            ),
            Self::series(
                "state_ctr",
                "CTR by State",
                "CTR (%)",
                groups,
                MetricTotals::ctr,
                PANEL_COLORS[2],
            ),
            Self::series(
                "state_cpc",
                "CPC by State",
                "CPC ($)",
                groups,
                MetricTotals::cpc,
                PANEL_COLORS[3],
            ),
        ]
    }

    fn draw_ctr_analysis(ui: &mut egui::Ui, view: &DashboardView) {
        ui.columns(2, |cols| {
            cols[0].label(RichText::new("CTR by Platform and State").size(13.0).strong());
            ChartPlotter::draw_grouped_ctr(
                &mut cols[0],
                &view.by_platform_state,
                CHART_HEIGHT * 1.2,
            );

            cols[1].label(RichText::new("Top Campaigns by Revenue").size(13.0).strong());
            let labels: Vec<String> = view.top_campaigns.iter().map(|g| g.label()).collect();
            let values: Vec<f64> = view
                .top_campaigns
                .iter()
                .map(|g| g.totals.attributed_revenue)
                .collect();
            let ctr: Vec<f64> = view.top_campaigns.iter().map(|g| g.totals.ctr()).collect();
            ChartPlotter::draw_horizontal_bars(
                &mut cols[1],
                "top_campaigns",
                &labels,
                &values,
                Some(ctr.as_slice()),
                "Attributed Revenue ($)",
                CHART_HEIGHT * 1.2,
            );
        });
    }

    /// Breakdown groups ranked by the chosen metric: bar chart plus table.
    fn draw_breakdown(&mut self, ui: &mut egui::Ui, view: &DashboardView) {
        ui.horizontal(|ui| {
            ui.label("Rank by:");
            egui::ComboBox::from_id_salt("breakdown_metric")
                .selected_text(self.breakdown_metric.label())
                .show_ui(ui, |ui| {
                    for metric in Metric::ALL {
                        ui.selectable_value(&mut self.breakdown_metric, metric, metric.label());
                    }
                });
        });
        ui.add_space(6.0);

        let metric = self.breakdown_metric;
        let ranked = StatsCalculator::top_n(&view.breakdown, metric, view.breakdown.len());
        let chart_groups = &ranked[..ranked.len().min(15)];
        let series = Self::series(
            "breakdown_chart",
            "Top groups",
            metric.label(),
            chart_groups,
            |t| metric.value(t),
            Color32::from_rgb(100, 149, 237),
        );
        ChartPlotter::draw_bar_series(ui, &series, CHART_HEIGHT);
        ui.add_space(6.0);
        Self::draw_group_table(ui, "breakdown_table", &ranked);
    }

    /// Metric table over grouped rows.
    fn draw_group_table(ui: &mut egui::Ui, id: &str, groups: &[GroupSummary]) {
        let headers = [
            "Group",
            "Spend",
            "Revenue",
            "Impressions",
            "Clicks",
            "CTR",
            "CPC",
            "CPM",
            "ROAS",
            "Rev / 1k Impr",
        ];
        Self::draw_table(ui, id, &headers, groups.len(), |i| {
            let g = &groups[i];
            let t = &g.totals;
            vec![
                g.label(),
                format::money(t.spend),
                format::money(t.attributed_revenue),
                format::thousands(t.impressions as f64),
                format::thousands(t.clicks as f64),
                format::percent(t.ctr()),
                format::money_cents(t.cpc()),
                format::money_cents(t.cpm()),
                format!("{:.2}", t.roas()),
                format::money_cents(t.efficiency()),
            ]
        });
    }

    fn draw_details(&mut self, ui: &mut egui::Ui, view: &DashboardView) {
        ui.horizontal(|ui| {
            for tab in DetailTab::ALL {
                ui.selectable_value(&mut self.detail_tab, tab, tab.label());
            }
        });
        ui.add_space(6.0);

        match self.detail_tab {
            DetailTab::Business => {
                let headers = [
                    "Date", "Orders", "New Orders", "New Customers", "Revenue", "Gross Profit",
                    "COGS", "AOV", "Margin",
                ];
                Self::draw_table(ui, "business_table", &headers, view.combined.len(), |i| {
                    let day = &view.combined[i];
                    let b = &day.business;
                    vec![
                        b.date.format("%Y-%m-%d").to_string(),
                        format::thousands(b.orders as f64),
                        format::thousands(b.new_orders as f64),
                        format::thousands(b.new_customers as f64),
                        format::money(b.total_revenue),
                        format::money(b.gross_profit),
                        format::money(b.cogs),
                        format::money_cents(day.avg_order_value()),
                        format::percent(day.profit_margin()),
                    ]
                });
            }
            DetailTab::Marketing => {
                let headers = [
                    "Date", "Platform", "Tactic", "State", "Campaign", "Impressions", "Clicks",
                    "Spend", "Revenue", "CTR", "CPC", "ROAS",
                ];
                Self::draw_table(ui, "marketing_table", &headers, view.marketing.len(), |i| {
                    let row = &view.marketing[i];
                    let t = MetricTotals::from_row(row);
                    vec![
                        row.date.format("%Y-%m-%d").to_string(),
                        row.platform.clone(),
                        row.tactic.clone(),
                        row.state.clone(),
                        row.campaign.clone(),
                        format::thousands(t.impressions as f64),
                        format::thousands(t.clicks as f64),
                        format::money_cents(t.spend),
                        format::money_cents(t.attributed_revenue),
                        format::percent(t.ctr()),
                        format::money_cents(t.cpc()),
                        format!("{:.2}", t.roas()),
                    ]
                });
            }
            DetailTab::State => {
                Self::draw_table(ui, "state_table", &STATE_HEADERS, view.by_state.len(), |i| {
                    state_cells(&view.by_state[i])
                });
            }
            DetailTab::Combined => {
                let headers = [
                    "Date", "Revenue", "Orders", "Spend", "Attributed", "Impressions", "Clicks",
                    "CTR", "ROAS", "CAC", "Attribution",
                ];
                Self::draw_table(ui, "combined_table", &headers, view.combined.len(), |i| {
                    let day = &view.combined[i];
                    let t = day.marketing.unwrap_or_default();
                    vec![
                        day.date().format("%Y-%m-%d").to_string(),
                        format::money(day.business.total_revenue),
                        format::thousands(day.business.orders as f64),
                        format::money(t.spend),
                        format::money(t.attributed_revenue),
                        format::thousands(t.impressions as f64),
                        format::thousands(t.clicks as f64),
                        format::percent(t.ctr()),
                        format!("{:.2}", t.roas()),
                        format::money_cents(day.customer_acquisition_cost()),
                        format::percent(day.marketing_attribution_rate()),
                    ]
                });
            }
        }
    }

    /// Scrollable striped table; only the visible rows are formatted.
    fn draw_table(
        ui: &mut egui::Ui,
        id: &str,
        headers: &[&str],
        row_count: usize,
        row: impl Fn(usize) -> Vec<String>,
    ) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(format!("{} rows", format::thousands(row_count as f64)))
                        .size(11.0)
                        .color(Color32::GRAY),
                );
                ScrollArea::both()
                    .id_salt(id)
                    .max_height(TABLE_HEIGHT)
                    .auto_shrink([false, true])
                    .show_rows(ui, ROW_HEIGHT, row_count + 1, |ui, range| {
                        egui::Grid::new(id)
                            .striped(true)
                            .min_col_width(70.0)
                            .spacing([16.0, 2.0])
                            .show(ui, |ui| {
                                for idx in range {
                                    // Row 0 is the header
                                    if idx == 0 {
                                        for header in headers {
                                            ui.label(RichText::new(*header).strong());
                                        }
                                    } else {
                                        for cell in row(idx - 1) {
                                            ui.label(cell);
                                        }
                                    }
                                    ui.end_row();
                                }
                            });
                    });
            });
    }

    fn draw_footer(ui: &mut egui::Ui, view: &DashboardView) {
        ui.separator();
        ui.vertical_centered(|ui| {
            ui.label(
                RichText::new("📊 Marketing Intelligence Dashboard | Built with egui & Polars")
                    .size(12.0)
                    .color(Color32::GRAY),
            );
            ui.label(
                RichText::new(format!(
                    "Data covers {} days of marketing and business performance",
                    view.kpis.days
                ))
                .size(11.0)
                .color(Color32::GRAY),
            );
        });
    }
}

const STATE_HEADERS: [&str; 10] = [
    "State",
    "Platforms",
    "Spend",
    "Revenue",
    "Impressions",
    "Clicks",
    "CTR",
    "CPC",
    "CPM",
    "ROAS",
];

/// One row of the state-wise table: a state with its distinct platform count.
fn state_cells(group: &GroupSummary) -> Vec<String> {
    let t = &group.totals;
    vec![
        group.label(),
        group.platform_count.to_string(),
        format::money(t.spend),
        format::money(t.attributed_revenue),
        format::thousands(t.impressions as f64),
        format::thousands(t.clicks as f64),
        format::percent(t.ctr()),
        format::money_cents(t.cpc()),
        format::money_cents(t.cpm()),
        format!("{:.2}", t.roas()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_tabs_have_distinct_labels() {
        let labels: std::collections::BTreeSet<&str> =
            DetailTab::ALL.iter().map(|t| t.label()).collect();
        assert_eq!(labels.len(), DetailTab::ALL.len());
        assert_eq!(ChartViewer::new().detail_tab, DetailTab::Business);
    }

    fn state(name: &str, platforms: usize, spend: f64, clicks: u64) -> GroupSummary {
        GroupSummary {
            key: vec![name.to_string()],
            totals: MetricTotals {
                impressions: 10_000,
                clicks,
                spend,
                attributed_revenue: spend * 3.0,
            },
            platform_count: platforms,
        }
    }

    #[test]
    fn state_rows_carry_platform_count() {
        let cells = state_cells(&state("CA", 2, 250.0, 100));
        assert_eq!(cells.len(), STATE_HEADERS.len());
        assert_eq!(cells[0], "CA");
        assert_eq!(cells[1], "2");
        assert_eq!(cells[2], "$250");
        assert_eq!(cells[7], "$2.50");
    }

    #[test]
    fn state_grid_shows_revenue_spend_ctr_and_cpc() {
        let groups = vec![state("CA", 2, 250.0, 100), state("NY", 1, 90.0, 0)];
        let panels = ChartViewer::state_panels(&groups);

        let titles: Vec<&str> = panels.iter().map(|p| p.title).collect();
        assert_eq!(
            titles,
            vec!["Revenue by State", "Spend by State", "CTR by State", "CPC by State"]
        );
        assert_eq!(panels[3].labels, vec!["CA", "NY"]);
        assert_eq!(panels[3].values, vec![2.5, 0.0]);
    }
}
