//! Charts module - Interactive charts and static export

pub mod format;
mod plotter;
mod renderer;

pub use plotter::{BarSeries, ChartPlotter, PANEL_COLORS};
pub use renderer::StaticChartRenderer;
