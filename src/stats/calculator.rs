//! Statistics Calculator Module
//! Grouped aggregation, KPI summaries, pivots and the correlation matrix.

use crate::data::MarketingRow;
use crate::stats::{CombinedDay, Metric, MetricTotals};
use rayon::prelude::*;
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Grouping dimension for marketing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Platform,
    State,
    Tactic,
    Campaign,
    PlatformTactic,
    PlatformState,
    PlatformCampaign,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Platform,
        Dimension::State,
        Dimension::Tactic,
        Dimension::Campaign,
        Dimension::PlatformTactic,
        Dimension::PlatformState,
        Dimension::PlatformCampaign,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Platform => "Platform",
            Dimension::State => "State",
            Dimension::Tactic => "Tactic",
            Dimension::Campaign => "Campaign",
            Dimension::PlatformTactic => "Tactic (Platform)",
            Dimension::PlatformState => "State (Platform)",
            Dimension::PlatformCampaign => "Campaign (Platform)",
        }
    }

    /// Group key parts for a row. Combined dimensions list the platform last.
    pub fn key(&self, row: &MarketingRow) -> Vec<String> {
        match self {
            Dimension::Platform => vec![row.platform.clone()],
            Dimension::State => vec![row.state.clone()],
            Dimension::Tactic => vec![row.tactic.clone()],
            Dimension::Campaign => vec![row.campaign.clone()],
            Dimension::PlatformTactic => vec![row.tactic.clone(), row.platform.clone()],
            Dimension::PlatformState => vec![row.state.clone(), row.platform.clone()],
            Dimension::PlatformCampaign => vec![row.campaign.clone(), row.platform.clone()],
        }
    }
}

/// Totals for one group of marketing rows.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub key: Vec<String>,
    pub totals: MetricTotals,
    /// Distinct platforms contributing to the group
    pub platform_count: usize,
}

impl GroupSummary {
    /// Display label, e.g. "Retargeting (Facebook)".
    pub fn label(&self) -> String {
        match self.key.as_slice() {
            [single] => single.clone(),
            [first, rest @ ..] => format!("{} ({})", first, rest.join(", ")),
            [] => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiSummary {
    pub total_revenue: f64,
    pub avg_daily_revenue: f64,
    pub total_spend: f64,
    /// Average over days that have marketing data
    pub avg_daily_spend: f64,
    pub avg_ctr: f64,
    pub total_orders: u64,
    pub avg_daily_orders: f64,
    pub days: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateHighlights {
    pub top_revenue: GroupSummary,
    pub best_ctr: GroupSummary,
    /// Lowest CPC among states with clicks
    pub best_cpc: Option<GroupSummary>,
    pub states_active: usize,
    pub platform_combinations: usize,
}

/// Matrix of a metric for row keys × column keys (missing cells are 0).
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl PivotTable {
    pub fn max_value(&self) -> f64 {
        self.values
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// NaN where the correlation is undefined
    pub values: Vec<Vec<f64>>,
}

/// Series compared in the marketing vs business correlation matrix.
pub const CORRELATION_SERIES: [&str; 10] = [
    "total revenue",
    "gross profit",
    "# of orders",
    "new customers",
    "spend",
    "attributed revenue",
    "impression",
    "clicks",
    "ctr",
    "cpc",
];

/// Handles aggregation and summary calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Group rows by a dimension and sum their counters. Sorted by key.
    pub fn aggregate(rows: &[MarketingRow], dimension: Dimension) -> Vec<GroupSummary> {
        let mut groups: BTreeMap<Vec<String>, (MetricTotals, BTreeSet<&str>)> = BTreeMap::new();

        for row in rows {
            let entry = groups.entry(dimension.key(row)).or_default();
            entry.0.add_row(row);
            entry.1.insert(row.platform.as_str());
        }

        groups
            .into_iter()
            .map(|(key, (totals, platforms))| GroupSummary {
                key,
                totals,
                platform_count: platforms.len(),
            })
            .collect()
    }

    /// Aggregate several dimensions in parallel.
    pub fn aggregate_many(
        rows: &[MarketingRow],
        dimensions: &[Dimension],
    ) -> HashMap<Dimension, Vec<GroupSummary>> {
        dimensions
            .par_iter()
            .map(|&dimension| (dimension, Self::aggregate(rows, dimension)))
            .collect()
    }

    /// Largest `n` groups by metric, ties broken by key.
    pub fn top_n(groups: &[GroupSummary], metric: Metric, n: usize) -> Vec<GroupSummary> {
        let mut sorted = groups.to_vec();
        sorted.sort_by(|a, b| {
            metric
                .value(&b.totals)
                .partial_cmp(&metric.value(&a.totals))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        sorted.truncate(n);
        sorted
    }

    /// Headline KPI tiles.
    pub fn kpis(combined: &[CombinedDay]) -> KpiSummary {
        let days = combined.len();
        if days == 0 {
            return KpiSummary::default();
        }

        let marketing: Vec<MetricTotals> = combined.iter().filter_map(|d| d.marketing).collect();
        let total_revenue: f64 = combined.iter().map(|d| d.business.total_revenue).sum();
        let total_orders: u64 = combined.iter().map(|d| d.business.orders).sum();
        let total_spend: f64 = marketing.iter().map(|m| m.spend).sum();
        let daily_ctr: Vec<f64> = marketing.iter().map(|m| m.ctr()).collect();

        KpiSummary {
            total_revenue,
            avg_daily_revenue: total_revenue / days as f64,
            total_spend,
            avg_daily_spend: mean_or_zero(&marketing.iter().map(|m| m.spend).collect::<Vec<_>>()),
            avg_ctr: mean_or_zero(&daily_ctr),
            total_orders,
            avg_daily_orders: total_orders as f64 / days as f64,
            days,
        }
    }

    /// Best-performing states for the state KPI tiles.
    pub fn state_highlights(states: &[GroupSummary]) -> Option<StateHighlights> {
        let top_revenue = Self::top_n(states, Metric::AttributedRevenue, 1).pop()?;
        let best_ctr = Self::top_n(states, Metric::Ctr, 1).pop()?;

        let best_cpc = states
            .iter()
            .filter(|s| s.totals.clicks > 0)
            .min_by(|a, b| {
                a.totals
                    .cpc()
                    .partial_cmp(&b.totals.cpc())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.key.cmp(&b.key))
            })
            .cloned();

        Some(StateHighlights {
            top_revenue,
            best_ctr,
            best_cpc,
            states_active: states.len(),
            platform_combinations: states.iter().map(|s| s.platform_count).sum(),
        })
    }

    /// Pivot a metric over two single-part dimensions.
    pub fn pivot(
        rows: &[MarketingRow],
        row_dim: Dimension,
        col_dim: Dimension,
        metric: Metric,
    ) -> PivotTable {
        let mut cells: BTreeMap<(String, String), MetricTotals> = BTreeMap::new();
        let mut row_keys = BTreeSet::new();
        let mut col_keys = BTreeSet::new();

        for row in rows {
            let r = row_dim.key(row).join(" / ");
            let c = col_dim.key(row).join(" / ");
            row_keys.insert(r.clone());
            col_keys.insert(c.clone());
            cells.entry((r, c)).or_default().add_row(row);
        }

        let rows: Vec<String> = row_keys.into_iter().collect();
        let columns: Vec<String> = col_keys.into_iter().collect();
        let values = rows
            .iter()
            .map(|r| {
                columns
                    .iter()
                    .map(|c| {
                        cells
                            .get(&(r.clone(), c.clone()))
                            .map(|t| metric.value(t))
                            .unwrap_or(0.0)
                    })
                    .collect()
            })
            .collect();

        PivotTable {
            rows,
            columns,
            values,
        }
    }

    /// Pearson correlation between business and marketing series, over the
    /// days that have marketing data.
    pub fn correlation_matrix(combined: &[CombinedDay]) -> CorrelationMatrix {
        let days: Vec<(&CombinedDay, MetricTotals)> = combined
            .iter()
            .filter_map(|d| d.marketing.map(|m| (d, m)))
            .collect();

        let series: Vec<Vec<f64>> = (0..CORRELATION_SERIES.len())
            .map(|idx| {
                days.iter()
                    .map(|(d, m)| match idx {
                        0 => d.business.total_revenue,
                        1 => d.business.gross_profit,
                        2 => d.business.orders as f64,
                        3 => d.business.new_customers as f64,
                        4 => m.spend,
                        5 => m.attributed_revenue,
                        6 => m.impressions as f64,
                        7 => m.clicks as f64,
                        8 => m.ctr(),
                        _ => m.cpc(),
                    })
                    .collect()
            })
            .collect();

        let values = series
            .par_iter()
            .map(|a| series.iter().map(|b| Self::pearson(a, b)).collect())
            .collect();

        CorrelationMatrix {
            labels: CORRELATION_SERIES.iter().map(|s| s.to_string()).collect(),
            values,
        }
    }

    /// Sample Pearson correlation. NaN for fewer than 2 points or zero variance.
    pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
        if x.len() != y.len() || x.len() < 2 {
            return f64::NAN;
        }

        let sx = x.std_dev();
        let sy = y.std_dev();
        if sx == 0.0 || sy == 0.0 || sx.is_nan() || sy.is_nan() {
            return f64::NAN;
        }

        let r = x.covariance(y) / (sx * sy);
        r.clamp(-1.0, 1.0)
    }
}

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BusinessDay, DataProcessor};
    use chrono::NaiveDate;

    fn row(
        platform: &str,
        state: &str,
        tactic: &str,
        impressions: u64,
        clicks: u64,
        spend: f64,
        revenue: f64,
    ) -> MarketingRow {
        MarketingRow {
            date: NaiveDate::from_ymd_opt(2025, 5, 16).unwrap(),
            platform: platform.to_string(),
            tactic: tactic.to_string(),
            state: state.to_string(),
            campaign: format!("{tactic} campaign"),
            impressions,
            clicks,
            spend,
            attributed_revenue: revenue,
        }
    }

    fn rows() -> Vec<MarketingRow> {
        vec![
            row("Facebook", "NY", "ASC", 10_000, 100, 50.0, 200.0),
            row("Facebook", "CA", "ASC", 5_000, 100, 40.0, 80.0),
            row("Google", "NY", "Search", 2_000, 80, 120.0, 600.0),
            row("TikTok", "CA", "Spark", 20_000, 60, 0.0, 0.0),
        ]
    }

    #[test]
    fn platform_spend_sums_to_total_spend() {
        let rows = rows();
        let by_platform = StatsCalculator::aggregate(&rows, Dimension::Platform);
        let platform_total: f64 = by_platform.iter().map(|g| g.totals.spend).sum();
        let total: f64 = rows.iter().map(|r| r.spend).sum();
        assert_eq!(platform_total, total);
        assert_eq!(by_platform.len(), 3);
        assert_eq!(by_platform[0].label(), "Facebook");
        assert_eq!(by_platform[0].totals.clicks, 200);
    }

    #[test]
    fn group_ratios_come_from_summed_totals() {
        let by_platform = StatsCalculator::aggregate(&rows(), Dimension::Platform);
        // 200 clicks / 15 000 impressions, not the mean of 1% and 2%
        assert_eq!(by_platform[0].totals.ctr(), 1.33);
        assert_eq!(by_platform[2].totals.roas(), 0.0);
    }

    #[test]
    fn combined_dimension_labels_and_platform_counts() {
        let by_tactic = StatsCalculator::aggregate(&rows(), Dimension::PlatformTactic);
        let labels: Vec<String> = by_tactic.iter().map(|g| g.label()).collect();
        assert_eq!(labels, vec!["ASC (Facebook)", "Search (Google)", "Spark (TikTok)"]);

        let by_state = StatsCalculator::aggregate(&rows(), Dimension::State);
        assert_eq!(by_state[0].label(), "CA");
        assert_eq!(by_state[0].platform_count, 2);
    }

    #[test]
    fn aggregate_many_matches_single_aggregation() {
        let rows = rows();
        let all = StatsCalculator::aggregate_many(&rows, &Dimension::ALL);
        assert_eq!(all.len(), Dimension::ALL.len());
        assert_eq!(
            all[&Dimension::State],
            StatsCalculator::aggregate(&rows, Dimension::State)
        );
    }

    #[test]
    fn top_n_orders_descending() {
        let by_tactic = StatsCalculator::aggregate(&rows(), Dimension::Tactic);
        let top = StatsCalculator::top_n(&by_tactic, Metric::AttributedRevenue, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].label(), "Search");
        assert_eq!(top[1].label(), "ASC");
    }

    #[test]
    fn state_highlights_pick_extremes() {
        let by_state = StatsCalculator::aggregate(&rows(), Dimension::State);
        let highlights = StatsCalculator::state_highlights(&by_state).unwrap();
        assert_eq!(highlights.top_revenue.label(), "NY");
        // NY: 180 clicks / 12 000 impressions = 1.5%, CA: 160 / 25 000 = 0.64%
        assert_eq!(highlights.best_ctr.label(), "NY");
        // CA: 40 / 160 = 0.25, NY: 170 / 180 = 0.94
        assert_eq!(highlights.best_cpc.unwrap().label(), "CA");
        assert_eq!(highlights.states_active, 2);
        assert_eq!(highlights.platform_combinations, 4);
    }

    #[test]
    fn state_highlights_empty_input() {
        assert!(StatsCalculator::state_highlights(&[]).is_none());
    }

    #[test]
    fn pivot_fills_missing_cells_with_zero() {
        let pivot =
            StatsCalculator::pivot(&rows(), Dimension::State, Dimension::Platform, Metric::Ctr);
        assert_eq!(pivot.rows, vec!["CA", "NY"]);
        assert_eq!(pivot.columns, vec!["Facebook", "Google", "TikTok"]);
        assert_eq!(pivot.values[0], vec![2.0, 0.0, 0.3]);
        assert_eq!(pivot.values[1], vec![1.0, 4.0, 0.0]);
        assert_eq!(pivot.max_value(), 4.0);
    }

    fn combined(days: &[(u32, f64, Option<f64>)]) -> Vec<CombinedDay> {
        days.iter()
            .map(|&(d, revenue, spend)| CombinedDay {
                business: BusinessDay {
                    date: NaiveDate::from_ymd_opt(2025, 5, d).unwrap(),
                    orders: (revenue / 100.0) as u64,
                    new_orders: 1,
                    new_customers: 1,
                    total_revenue: revenue,
                    gross_profit: revenue * 0.3,
                    cogs: revenue * 0.7,
                },
                marketing: spend.map(|s| MetricTotals {
                    impressions: (s * 100.0) as u64,
                    clicks: (s * 2.0) as u64,
                    spend: s,
                    attributed_revenue: s * 2.0,
                }),
            })
            .collect()
    }

    #[test]
    fn kpis_average_spend_over_days_with_marketing() {
        let days = combined(&[(1, 1000.0, Some(100.0)), (2, 2000.0, Some(300.0)), (3, 3000.0, None)]);
        let kpis = StatsCalculator::kpis(&days);
        assert_eq!(kpis.total_revenue, 6000.0);
        assert_eq!(kpis.avg_daily_revenue, 2000.0);
        assert_eq!(kpis.total_spend, 400.0);
        assert_eq!(kpis.avg_daily_spend, 200.0);
        assert_eq!(kpis.avg_ctr, 2.0);
        assert_eq!(kpis.total_orders, 60);
        assert_eq!(kpis.days, 3);
    }

    #[test]
    fn kpis_of_empty_selection_are_zero() {
        assert_eq!(StatsCalculator::kpis(&[]), KpiSummary::default());
    }

    #[test]
    fn correlation_diagonal_is_one_and_constant_series_undefined() {
        let days = combined(&[(1, 1000.0, Some(100.0)), (2, 2500.0, Some(300.0)), (3, 1800.0, Some(250.0))]);
        let matrix = StatsCalculator::correlation_matrix(&days);
        assert_eq!(matrix.labels.len(), CORRELATION_SERIES.len());
        assert!((matrix.values[0][0] - 1.0).abs() < 1e-9);
        // revenue and gross profit are proportional
        assert!((matrix.values[0][1] - 1.0).abs() < 1e-9);
        // CTR is constant at 2%
        assert!(matrix.values[8][0].is_nan());
    }

    #[test]
    fn pearson_detects_negative_relationship() {
        let r = StatsCalculator::pearson(&[1.0, 2.0, 3.0], &[6.0, 4.0, 2.0]);
        assert!((r + 1.0).abs() < 1e-9);
        assert!(StatsCalculator::pearson(&[1.0], &[2.0]).is_nan());
    }

    #[test]
    fn daily_join_feeds_kpis() {
        let rows = rows();
        let daily = DataProcessor::daily_marketing(&rows);
        let business = vec![combined(&[(16, 5000.0, None)])[0].business.clone()];
        let joined = DataProcessor::join_by_date(&business, &daily);
        let kpis = StatsCalculator::kpis(&joined);
        assert_eq!(kpis.total_spend, 210.0);
    }
}
