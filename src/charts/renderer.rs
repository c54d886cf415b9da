//! Static Chart Renderer
//! Renders dashboard charts to PNG files with plotters for report export.
//!
//! Files written by [`StaticChartRenderer::export_dashboard`]:
//! 1. `revenue_trend.png`: total vs attributed revenue over time
//! 2. `platform_spend.png`, `platform_revenue.png`: per-platform bars
//! 3. `state_revenue.png`, `state_ctr.png`, `state_cpc.png`: per-state bars
//! 4. `top_campaigns.png`: campaigns ranked by attributed revenue

use crate::charts::format;
use crate::charts::plotter::attributed_segments;
use crate::stats::{DashboardView, GroupSummary};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Image buffer has the wrong size")]
    Buffer,
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

// Colors (RGB)
const REVENUE: RGBColor = RGBColor(59, 130, 246);
const ATTRIBUTED: RGBColor = RGBColor(245, 158, 11);
const BAR_COLORS: [RGBColor; 4] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
];

const CHART_WIDTH: u32 = 1200;
const CHART_HEIGHT: u32 = 700;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the report charts into `dir`. Returns the written files.
    pub fn export_dashboard(view: &DashboardView, dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        let path = dir.join("revenue_trend.png");
        Self::render_revenue_trend(view, &path)?;
        written.push(path);

        let bar_charts: [(&str, &str, &[GroupSummary], fn(&GroupSummary) -> f64, &str); 6] = [
            (
                "platform_spend.png",
                "Spend by Platform",
                &view.by_platform,
                |g: &GroupSummary| g.totals.spend,
                "Spend ($)",
            ),
            (
                "platform_revenue.png",
                "Revenue by Platform",
                &view.by_platform,
                |g: &GroupSummary| g.totals.attributed_revenue,
                "Revenue ($)",
            ),
            (
                "state_revenue.png",
                "Revenue by State",
                &view.by_state,
                |g: &GroupSummary| g.totals.attributed_revenue,
                "Revenue ($)",
            ),
            (
                "state_ctr.png",
                "CTR by State",
                &view.by_state,
                |g: &GroupSummary| g.totals.ctr(),
                "CTR (%)",
            ),
            (
                "state_cpc.png",
                "CPC by State",
                &view.by_state,
                |g: &GroupSummary| g.totals.cpc(),
                "CPC ($)",
            ),
            (
                "top_campaigns.png",
                "Top Campaigns by Revenue",
                &view.top_campaigns,
                |g: &GroupSummary| g.totals.attributed_revenue,
                "Attributed Revenue ($)",
            ),
        ];

        for (idx, (file, title, groups, value, y_desc)) in bar_charts.into_iter().enumerate() {
            let labels: Vec<String> = groups.iter().map(|g| g.label()).collect();
            let values: Vec<f64> = groups.iter().map(value).collect();
            let path = dir.join(file);
            Self::render_bars(
                &path,
                title,
                &labels,
                &values,
                BAR_COLORS[idx % BAR_COLORS.len()],
                y_desc,
            )?;
            written.push(path);
        }

        log::info!("Rendered {} charts to {}", written.len(), dir.display());
        Ok(written)
    }

    /// Draw into an RGB buffer and save it as PNG.
    fn render_png(
        path: &Path,
        draw: impl FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), RenderError>,
    ) -> Result<(), RenderError> {
        let mut buffer = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (CHART_WIDTH, CHART_HEIGHT))
                .into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;
            draw(&root)?;
            root.present().map_err(draw_err)?;
        }

        let image = image::RgbImage::from_raw(CHART_WIDTH, CHART_HEIGHT, buffer)
            .ok_or(RenderError::Buffer)?;
        image.save(path)?;
        Ok(())
    }

    pub fn render_revenue_trend(view: &DashboardView, path: &Path) -> Result<(), RenderError> {
        let dates: Vec<String> = view
            .combined
            .iter()
            .map(|d| d.date().format("%m-%d").to_string())
            .collect();
        let total: Vec<(f64, f64)> = view
            .combined
            .iter()
            .enumerate()
            .map(|(i, d)| (i as f64, d.business.total_revenue))
            .collect();
        let segments: Vec<Vec<(f64, f64)>> = attributed_segments(&view.combined)
            .into_iter()
            .map(|segment| segment.into_iter().map(|[x, y]| (x, y)).collect())
            .collect();

        let x_max = (dates.len().max(2) - 1) as f64;
        let y_max = axis_max(total.iter().chain(segments.iter().flatten()).map(|p| p.1));

        Self::render_png(path, |root| {
            let mut chart = ChartBuilder::on(root)
                .caption("Revenue Performance Analysis", ("sans-serif", 28))
                .margin(20)
                .x_label_area_size(45)
                .y_label_area_size(80)
                .build_cartesian_2d(0f64..x_max, 0f64..y_max)
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .x_desc("Date")
                .y_desc("Revenue ($)")
                .x_labels(dates.len().min(12))
                .x_label_formatter(&|x| format::index_label(&dates, *x))
                .y_label_formatter(&|y| format::money(*y))
                .draw()
                .map_err(draw_err)?;

            chart
                .draw_series(LineSeries::new(total.iter().copied(), REVENUE.stroke_width(3)))
                .map_err(draw_err)?
                .label("Total Revenue")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], REVENUE.stroke_width(3)));

            // One series per run of days with marketing; only the first gets a legend entry
            for (idx, segment) in segments.iter().enumerate() {
                let series = chart
                    .draw_series(LineSeries::new(
                        segment.iter().copied(),
                        ATTRIBUTED.stroke_width(3),
                    ))
                    .map_err(draw_err)?;
                if idx == 0 {
                    series.label("Attributed Revenue").legend(|(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], ATTRIBUTED.stroke_width(3))
                    });
                }
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(draw_err)?;

            Ok(())
        })
    }

    pub fn render_bars(
        path: &Path,
        title: &str,
        labels: &[String],
        values: &[f64],
        color: RGBColor,
        y_desc: &str,
    ) -> Result<(), RenderError> {
        let n = values.len().max(1);
        let y_max = axis_max(values.iter().copied());
        let short_labels: Vec<String> = labels.iter().map(|l| truncate_label(l, 18)).collect();

        Self::render_png(path, |root| {
            let mut chart = ChartBuilder::on(root)
                .caption(title, ("sans-serif", 28))
                .margin(20)
                .x_label_area_size(60)
                .y_label_area_size(80)
                .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(n)
                .x_label_formatter(&|x| format::index_label(&short_labels, *x))
                .y_label_formatter(&|y| format::compact(*y))
                .y_desc(y_desc)
                .draw()
                .map_err(draw_err)?;

            chart
                .draw_series(values.iter().enumerate().map(|(i, &v)| {
                    let x = i as f64;
                    Rectangle::new([(x - 0.35, 0.0), (x + 0.35, v)], color.filled())
                }))
                .map_err(draw_err)?;

            Ok(())
        })
    }
}

/// Upper bound of a value axis with 10% headroom; never zero.
fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.filter(|v| v.is_finite()).fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let cut: String = label.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
