//! Chart Plotter Module
//! Interactive dashboard charts using egui_plot.

use crate::charts::format;
use crate::stats::{CombinedDay, CorrelationMatrix, GroupSummary, PivotTable};
use egui::{Align2, Color32, FontId, RichText, Sense, Stroke};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Text};
use std::collections::BTreeSet;

pub const REVENUE_COLOR: Color32 = Color32::from_rgb(59, 130, 246); // #3b82f6
pub const ATTRIBUTED_COLOR: Color32 = Color32::from_rgb(245, 158, 11); // #f59e0b

/// Panel colors for the four-metric grids
pub const PANEL_COLORS: [Color32; 4] = [
    Color32::from_rgb(31, 119, 180),  // Blue
    Color32::from_rgb(255, 127, 14),  // Orange
    Color32::from_rgb(44, 160, 44),   // Green
    Color32::from_rgb(214, 39, 40),   // Red
];

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(233, 30, 99),  // Pink
    Color32::from_rgb(0, 188, 212),  // Cyan
    Color32::from_rgb(255, 87, 34),  // Deep Orange
    Color32::from_rgb(121, 85, 72),  // Brown
    Color32::from_rgb(96, 125, 139), // Blue Grey
];

const HEATMAP_NAN: Color32 = Color32::from_rgb(90, 90, 90);

/// One categorical bar series.
pub struct BarSeries<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub y_label: &'a str,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub color: Color32,
}

/// Attributed revenue as `[day index, value]` runs. A day without marketing
/// rows ends the current run, leaving a gap in the line.
pub fn attributed_segments(combined: &[CombinedDay]) -> Vec<Vec<[f64; 2]>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (i, day) in combined.iter().enumerate() {
        match day.marketing {
            Some(totals) => current.push([i as f64, totals.attributed_revenue]),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Creates the dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn palette_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Light-to-dark blue scale for `t` in [0, 1].
    pub fn blues(t: f64) -> Color32 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color32::from_rgb(lerp(222, 8), lerp(235, 48), lerp(247, 107))
    }

    /// Blue (-1) through white (0) to red (+1). NaN is grey.
    pub fn diverging(v: f64) -> Color32 {
        if !v.is_finite() {
            return HEATMAP_NAN;
        }
        let v = v.clamp(-1.0, 1.0);
        let (target, t) = if v >= 0.0 {
            ((178u8, 24u8, 43u8), v)
        } else {
            ((33u8, 102u8, 172u8), -v)
        };
        let lerp = |b: u8| (247.0 + (b as f64 - 247.0) * t).round() as u8;
        Color32::from_rgb(lerp(target.0), lerp(target.1), lerp(target.2))
    }

    /// Readable text color on top of `fill`.
    fn contrast_text(fill: Color32) -> Color32 {
        let luma = 0.299 * fill.r() as f32 + 0.587 * fill.g() as f32 + 0.114 * fill.b() as f32;
        if luma > 150.0 {
            Color32::BLACK
        } else {
            Color32::WHITE
        }
    }

    /// KPI tile: label, large value, small delta line.
    pub fn draw_kpi_tile(ui: &mut egui::Ui, label: &str, value: &str, delta: &str, width: f32) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(8.0)
            .stroke(Stroke::new(1.0, REVENUE_COLOR.gamma_multiply(0.6)))
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(width);
                ui.label(RichText::new(label).size(13.0).color(Color32::GRAY));
                ui.label(RichText::new(value).size(24.0).strong());
                ui.label(
                    RichText::new(delta)
                        .size(12.0)
                        .color(Color32::from_rgb(40, 167, 69)),
                );
            });
    }

    /// Total vs attributed revenue: lines over time, then daily bars.
    pub fn draw_revenue_trend(ui: &mut egui::Ui, combined: &[CombinedDay], height: f32) {
        let dates: Vec<String> = combined
            .iter()
            .map(|d| d.date().format("%m-%d").to_string())
            .collect();
        let hover_dates: Vec<String> = combined
            .iter()
            .map(|d| d.date().format("%Y-%m-%d").to_string())
            .collect();

        let total: Vec<[f64; 2]> = combined
            .iter()
            .enumerate()
            .map(|(i, d)| [i as f64, d.business.total_revenue])
            .collect();
        let segments = attributed_segments(combined);
        let attributed: Vec<[f64; 2]> = segments.iter().flatten().copied().collect();

        ui.label(RichText::new("📈 Revenue Trends Over Time").size(14.0).strong());
        let x_labels = dates.clone();
        Plot::new("revenue_trend_lines")
            .height(height * 0.6)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Date")
            .y_axis_label("Revenue ($)")
            .x_axis_formatter(move |mark, _range| format::index_label(&x_labels, mark.value))
            .y_axis_formatter(|mark, _range| format!("${}", format::compact(mark.value)))
            .label_formatter(move |name, value| {
                let date = format::index_label(&hover_dates, value.x);
                if name.is_empty() {
                    date
                } else {
                    format!("{name}\nDate: {date}\nRevenue: {}", format::money(value.y))
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(total.iter().copied()))
                        .color(REVENUE_COLOR)
                        .width(3.0)
                        .name("Total Revenue"),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(total.iter().copied()))
                        .radius(3.5)
                        .color(REVENUE_COLOR),
                );
                for segment in &segments {
                    plot_ui.line(
                        Line::new(PlotPoints::from_iter(segment.iter().copied()))
                            .color(ATTRIBUTED_COLOR)
                            .width(3.0)
                            .style(egui_plot::LineStyle::dashed_loose())
                            .name("Attributed Revenue"),
                    );
                }
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(attributed.iter().copied()))
                        .radius(3.5)
                        .color(ATTRIBUTED_COLOR),
                );
            });

        ui.add_space(8.0);
        ui.label(RichText::new("📊 Daily Revenue Comparison").size(14.0).strong());
        let x_labels = dates;
        let total_bars: Vec<Bar> = total
            .iter()
            .map(|[x, y]| Bar::new(x - 0.2, *y).width(0.4))
            .collect();
        let attributed_bars: Vec<Bar> = attributed
            .iter()
            .map(|[x, y]| Bar::new(x + 0.2, *y).width(0.4))
            .collect();

        Plot::new("revenue_trend_bars")
            .height(height * 0.4)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Date")
            .y_axis_label("Revenue ($)")
            .x_axis_formatter(move |mark, _range| format::index_label(&x_labels, mark.value))
            .y_axis_formatter(|mark, _range| format!("${}", format::compact(mark.value)))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(
                    BarChart::new(total_bars)
                        .color(REVENUE_COLOR.gamma_multiply(0.7))
                        .name("Total Revenue"),
                );
                plot_ui.bar_chart(
                    BarChart::new(attributed_bars)
                        .color(ATTRIBUTED_COLOR.gamma_multiply(0.7))
                        .name("Attributed Revenue"),
                );
            });
    }

    /// Vertical bar chart over categories.
    pub fn draw_bar_series(ui: &mut egui::Ui, series: &BarSeries<'_>, height: f32) {
        ui.label(RichText::new(series.title).size(13.0).strong());

        let bars: Vec<Bar> = series
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                Bar::new(i as f64, v)
                    .width(0.6)
                    .name(series.labels.get(i).cloned().unwrap_or_default())
            })
            .collect();
        let labels = series.labels.clone();

        Plot::new(series.id)
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .y_axis_label(series.y_label)
            .x_axis_formatter(move |mark, _range| format::index_label(&labels, mark.value))
            .y_axis_formatter(|mark, _range| format::compact(mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(series.color));
            });
    }

    /// Four metric panels in a 2x2 grid (e.g. spend, revenue, CTR, CPC).
    pub fn draw_metric_grid(ui: &mut egui::Ui, panels: &[BarSeries<'_>], height: f32) {
        let width = (ui.available_width() - 12.0) / 2.0;
        for pair in panels.chunks(2) {
            ui.horizontal(|ui| {
                for series in pair {
                    ui.vertical(|ui| {
                        ui.set_width(width);
                        Self::draw_bar_series(ui, series, height);
                    });
                }
            });
            ui.add_space(6.0);
        }
    }

    /// Bubble chart: spend vs attributed revenue, size by CTR, color by CPC.
    pub fn draw_tactic_bubbles(ui: &mut egui::Ui, tactics: &[GroupSummary], height: f32) {
        let max_cpc = tactics
            .iter()
            .map(|t| t.totals.cpc())
            .fold(0.0_f64, f64::max);

        Plot::new("tactic_bubbles")
            .height(height)
            .allow_scroll(false)
            .x_axis_label("Spend ($)")
            .y_axis_label("Attributed Revenue ($)")
            .x_axis_formatter(|mark, _range| format!("${}", format::compact(mark.value)))
            .y_axis_formatter(|mark, _range| format!("${}", format::compact(mark.value)))
            .label_formatter(|name, value| {
                if name.is_empty() {
                    String::new()
                } else {
                    format!(
                        "{name}\nSpend: {}\nRevenue: {}",
                        format::money(value.x),
                        format::money(value.y)
                    )
                }
            })
            .show(ui, |plot_ui| {
                for tactic in tactics {
                    let t = &tactic.totals;
                    let point = [t.spend, t.attributed_revenue];
                    let radius = (t.ctr() * 6.0 / 2.0).clamp(4.0, 30.0) as f32;
                    let color = Self::blues(if max_cpc > 0.0 { t.cpc() / max_cpc } else { 0.0 });

                    plot_ui.points(
                        Points::new(vec![point])
                            .radius(radius)
                            .filled(true)
                            .color(color.gamma_multiply(0.85))
                            .name(tactic.label()),
                    );
                    plot_ui.text(
                        Text::new(
                            PlotPoint::new(point[0], point[1]),
                            RichText::new(tactic.label()).size(10.0),
                        )
                        .anchor(Align2::CENTER_BOTTOM),
                    );
                }
            });
    }

    /// Blue-scale fill for bar `i`; bars without a shade value get the lightest blue.
    fn bar_fill(shade: Option<&[f64]>, max_shade: f64, i: usize) -> Color32 {
        match shade {
            Some(s) if max_shade > 0.0 => {
                let value = s.get(i).copied().unwrap_or(0.0);
                Self::blues(0.25 + 0.75 * value / max_shade)
            }
            _ => REVENUE_COLOR,
        }
    }

    /// Horizontal bars; `shade` (if given) colors each bar on the blue scale.
    pub fn draw_horizontal_bars(
        ui: &mut egui::Ui,
        id: &str,
        labels: &[String],
        values: &[f64],
        shade: Option<&[f64]>,
        x_label: &str,
        height: f32,
    ) {
        let max_shade = shade
            .map(|s| s.iter().copied().fold(0.0_f64, f64::max))
            .unwrap_or(0.0);

        // Largest value on top
        let n = values.len();
        let bars: Vec<Bar> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let position = (n - 1 - i) as f64;
                Bar::new(position, v)
                    .width(0.7)
                    .fill(Self::bar_fill(shade, max_shade, i))
                    .name(labels.get(i).cloned().unwrap_or_default())
            })
            .collect();

        let axis_labels: Vec<String> = labels.iter().rev().cloned().collect();

        Plot::new(id)
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .x_axis_label(x_label)
            .y_axis_formatter(move |mark, _range| format::index_label(&axis_labels, mark.value))
            .y_axis_min_width(150.0)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
            });
    }

    /// CTR grouped by platform (x) with one bar per state.
    pub fn draw_grouped_ctr(ui: &mut egui::Ui, platform_states: &[GroupSummary], height: f32) {
        // Keys are [state, platform]
        let platforms: Vec<String> = platform_states
            .iter()
            .filter_map(|g| g.key.get(1).cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let states: Vec<String> = platform_states
            .iter()
            .filter_map(|g| g.key.first().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let group_width = 0.8;
        let bar_width = group_width / states.len().max(1) as f64;
        let labels = platforms.clone();

        Plot::new("ctr_platform_state")
            .height(height)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Platform")
            .y_axis_label("CTR (%)")
            .x_axis_formatter(move |mark, _range| format::index_label(&labels, mark.value))
            .show(ui, |plot_ui| {
                for (s_idx, state) in states.iter().enumerate() {
                    let offset = -group_width / 2.0 + bar_width * (s_idx as f64 + 0.5);
                    let bars: Vec<Bar> = platform_states
                        .iter()
                        .filter(|g| g.key.first() == Some(state))
                        .filter_map(|g| {
                            let p_idx = platforms.iter().position(|p| Some(p) == g.key.get(1))?;
                            Some(Bar::new(p_idx as f64 + offset, g.totals.ctr()).width(bar_width))
                        })
                        .collect();
                    plot_ui.bar_chart(
                        BarChart::new(bars)
                            .color(Self::palette_color(s_idx))
                            .name(state),
                    );
                }
            });
    }

    /// Heatmap of a pivot table, cells colored on the blue scale.
    pub fn draw_pivot_heatmap(ui: &mut egui::Ui, id: &str, pivot: &PivotTable, suffix: &str) {
        let max = pivot.max_value();
        Self::draw_heatmap(
            ui,
            id,
            &pivot.rows,
            &pivot.columns,
            &pivot.values,
            |v| Self::blues(if max > 0.0 { v / max } else { 0.0 }),
            |v| format!("{:.2}{suffix}", v),
        );
    }

    /// Correlation heatmap on the diverging scale.
    pub fn draw_correlation(ui: &mut egui::Ui, matrix: &CorrelationMatrix) {
        Self::draw_heatmap(
            ui,
            "correlation",
            &matrix.labels,
            &matrix.labels,
            &matrix.values,
            Self::diverging,
            |v| {
                if v.is_finite() {
                    format!("{:.2}", v)
                } else {
                    "-".to_string()
                }
            },
        );
    }

    fn draw_heatmap(
        ui: &mut egui::Ui,
        id: &str,
        rows: &[String],
        columns: &[String],
        values: &[Vec<f64>],
        color: impl Fn(f64) -> Color32,
        text: impl Fn(f64) -> String,
    ) {
        if rows.is_empty() || columns.is_empty() {
            ui.label(RichText::new("No data").color(Color32::GRAY));
            return;
        }

        let label_width = 120.0;
        let cell_width = ((ui.available_width() - label_width) / columns.len() as f32)
            .clamp(40.0, 110.0);
        let cell_height = 26.0;

        egui::Grid::new(ui.make_persistent_id(id))
            .spacing([2.0, 2.0])
            .show(ui, |ui| {
                ui.add_sized([label_width, cell_height], egui::Label::new(""));
                for column in columns {
                    ui.add_sized(
                        [cell_width, cell_height],
                        egui::Label::new(RichText::new(column).size(10.0).strong()).truncate(),
                    );
                }
                ui.end_row();

                for (r, row) in rows.iter().enumerate() {
                    ui.add_sized(
                        [label_width, cell_height],
                        egui::Label::new(RichText::new(row).size(11.0)).truncate(),
                    );
                    for (c, column) in columns.iter().enumerate() {
                        let v = values
                            .get(r)
                            .and_then(|vals| vals.get(c))
                            .copied()
                            .unwrap_or(f64::NAN);
                        let fill = color(v);
                        let (rect, response) = ui
                            .allocate_exact_size(egui::vec2(cell_width, cell_height), Sense::hover());
                        ui.painter().rect_filled(rect, 2.0, fill);
                        ui.painter().text(
                            rect.center(),
                            Align2::CENTER_CENTER,
                            text(v),
                            FontId::proportional(11.0),
                            Self::contrast_text(fill),
                        );
                        response.on_hover_text(format!("{row} / {column}: {}", text(v)));
                    }
                    ui.end_row();
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_scales_hit_their_endpoints() {
        assert_eq!(ChartPlotter::blues(0.0), Color32::from_rgb(222, 235, 247));
        assert_eq!(ChartPlotter::blues(1.0), Color32::from_rgb(8, 48, 107));
        assert_eq!(ChartPlotter::diverging(1.0), Color32::from_rgb(178, 24, 43));
        assert_eq!(ChartPlotter::diverging(-1.0), Color32::from_rgb(33, 102, 172));
        assert_eq!(ChartPlotter::diverging(f64::NAN), HEATMAP_NAN);
    }

    fn day(d: u32, attributed: Option<f64>) -> CombinedDay {
        CombinedDay {
            business: crate::data::BusinessDay {
                date: chrono::NaiveDate::from_ymd_opt(2025, 5, d).unwrap(),
                orders: 1,
                new_orders: 1,
                new_customers: 1,
                total_revenue: 100.0,
                gross_profit: 30.0,
                cogs: 70.0,
            },
            marketing: attributed.map(|a| crate::stats::MetricTotals {
                attributed_revenue: a,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn days_without_marketing_break_the_attributed_line() {
        let combined = vec![
            day(1, Some(10.0)),
            day(2, Some(20.0)),
            day(3, None),
            day(4, Some(40.0)),
            day(5, None),
        ];
        let segments = attributed_segments(&combined);
        assert_eq!(segments, vec![vec![[0.0, 10.0], [1.0, 20.0]], vec![[3.0, 40.0]]]);
        assert!(attributed_segments(&[day(1, None)]).is_empty());
    }

    #[test]
    fn short_shade_slice_falls_back_to_lightest_blue() {
        let shade = [4.0, 2.0];
        assert_eq!(ChartPlotter::bar_fill(Some(&shade[..]), 4.0, 0), ChartPlotter::blues(1.0));
        assert_eq!(ChartPlotter::bar_fill(Some(&shade[..]), 4.0, 5), ChartPlotter::blues(0.25));
        assert_eq!(ChartPlotter::bar_fill(None, 0.0, 0), REVENUE_COLOR);
    }
}
