//! Stats module - Metric derivation and aggregation

mod calculator;
mod dashboard;
mod metrics;

pub use calculator::{
    CorrelationMatrix, Dimension, GroupSummary, KpiSummary, PivotTable, StateHighlights,
    StatsCalculator,
};
pub use dashboard::DashboardView;
pub use metrics::{CombinedDay, Metric, MetricTotals};
