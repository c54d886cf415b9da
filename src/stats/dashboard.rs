//! Dashboard snapshot: everything the UI renders for one filter selection.

use crate::config::DashboardConfig;
use crate::data::{DataProcessor, Dataset, FilterState, MarketingRow};
use crate::stats::{
    CombinedDay, CorrelationMatrix, Dimension, GroupSummary, KpiSummary, Metric, PivotTable,
    StateHighlights, StatsCalculator,
};
use std::collections::HashMap;

/// Derived data for the current filters. Rebuilt on every filter change;
/// the underlying [`Dataset`] is never re-read.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub combined: Vec<CombinedDay>,
    pub marketing: Vec<MarketingRow>,
    pub kpis: KpiSummary,
    pub by_platform: Vec<GroupSummary>,
    pub by_tactic: Vec<GroupSummary>,
    pub top_tactics: Vec<GroupSummary>,
    pub by_state: Vec<GroupSummary>,
    pub by_platform_state: Vec<GroupSummary>,
    pub top_campaigns: Vec<GroupSummary>,
    pub breakdown_dimension: Dimension,
    pub breakdown: Vec<GroupSummary>,
    pub state_highlights: Option<StateHighlights>,
    pub state_platform_ctr: PivotTable,
    pub correlation: CorrelationMatrix,
}

impl DashboardView {
    pub fn build(
        dataset: &Dataset,
        filters: &FilterState,
        breakdown_dimension: Dimension,
        config: &DashboardConfig,
    ) -> Self {
        let business = DataProcessor::filter_business(&dataset.business, filters.date_range);
        let marketing = DataProcessor::filter_marketing(&dataset.marketing, filters);

        // The joined business view follows the date range only
        let in_range = DataProcessor::filter_marketing(
            &dataset.marketing,
            &FilterState {
                date_range: filters.date_range,
                ..FilterState::default()
            },
        );
        let daily = DataProcessor::daily_marketing(&in_range);
        let combined = DataProcessor::join_by_date(&business, &daily);

        let mut dimensions = vec![
            Dimension::Platform,
            Dimension::PlatformTactic,
            Dimension::State,
            Dimension::PlatformState,
            Dimension::PlatformCampaign,
        ];
        if !dimensions.contains(&breakdown_dimension) {
            dimensions.push(breakdown_dimension);
        }

        let ((mut groups, state_platform_ctr), (kpis, correlation)) = rayon::join(
            || {
                rayon::join(
                    || StatsCalculator::aggregate_many(&marketing, &dimensions),
                    || {
                        StatsCalculator::pivot(
                            &marketing,
                            Dimension::State,
                            Dimension::Platform,
                            Metric::Ctr,
                        )
                    },
                )
            },
            || {
                (
                    StatsCalculator::kpis(&combined),
                    StatsCalculator::correlation_matrix(&combined),
                )
            },
        );

        let breakdown = groups.get(&breakdown_dimension).cloned().unwrap_or_default();
        let by_platform = take(&mut groups, Dimension::Platform);
        let by_tactic = take(&mut groups, Dimension::PlatformTactic);
        let by_state = take(&mut groups, Dimension::State);
        let by_platform_state = take(&mut groups, Dimension::PlatformState);
        let by_campaign = take(&mut groups, Dimension::PlatformCampaign);

        let top_tactics = StatsCalculator::top_n(&by_tactic, Metric::Ctr, config.top_tactics);
        let top_campaigns = StatsCalculator::top_n(
            &by_campaign,
            Metric::AttributedRevenue,
            config.top_campaigns,
        );
        let state_highlights = StatsCalculator::state_highlights(&by_state);

        log::debug!(
            "Dashboard rebuilt: {} days, {} marketing rows, {} states",
            combined.len(),
            marketing.len(),
            by_state.len()
        );

        Self {
            combined,
            marketing,
            kpis,
            by_platform,
            by_tactic,
            top_tactics,
            by_state,
            by_platform_state,
            top_campaigns,
            breakdown_dimension,
            breakdown,
            state_highlights,
            state_platform_ctr,
            correlation,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.combined.is_empty() && self.marketing.is_empty()
    }
}

fn take(groups: &mut HashMap<Dimension, Vec<GroupSummary>>, dimension: Dimension) -> Vec<GroupSummary> {
    groups.remove(&dimension).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BusinessDay, DateRange};
    use chrono::NaiveDate;

    fn ymd(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn dataset() -> Dataset {
        let business = (1..=3)
            .map(|d| BusinessDay {
                date: ymd(d),
                orders: 10 * d as u64,
                new_orders: d as u64,
                new_customers: d as u64,
                total_revenue: 1000.0 * d as f64,
                gross_profit: 300.0 * d as f64,
                cogs: 700.0 * d as f64,
            })
            .collect();

        let mut marketing = Vec::new();
        for d in 1..=3 {
            for (platform, state, spend) in [("Facebook", "NY", 10.0), ("Google", "CA", 20.0)] {
                marketing.push(MarketingRow {
                    date: ymd(d),
                    platform: platform.to_string(),
                    tactic: "Prospecting".to_string(),
                    state: state.to_string(),
                    campaign: format!("{platform} launch"),
                    impressions: 1000,
                    clicks: 10 * d as u64,
                    spend: spend * d as f64,
                    attributed_revenue: spend * 2.0,
                });
            }
        }

        Dataset {
            business,
            marketing,
            platforms: vec!["Facebook".into(), "Google".into()],
            report: Vec::new(),
        }
    }

    #[test]
    fn unfiltered_view_covers_all_rows() {
        let config = DashboardConfig::default();
        let view = DashboardView::build(&dataset(), &FilterState::default(), Dimension::State, &config);

        assert_eq!(view.combined.len(), 3);
        assert_eq!(view.marketing.len(), 6);
        assert_eq!(view.kpis.total_spend, 180.0);
        let platform_spend: f64 = view.by_platform.iter().map(|g| g.totals.spend).sum();
        assert_eq!(platform_spend, view.kpis.total_spend);
        assert_eq!(view.breakdown, view.by_state);
        assert_eq!(view.top_campaigns.len(), 2);
        assert_eq!(view.state_platform_ctr.rows, vec!["CA", "NY"]);
        assert!(view.state_highlights.is_some());
    }

    #[test]
    fn platform_filter_narrows_marketing_but_not_the_joined_view() {
        let config = DashboardConfig::default();
        let filters = FilterState {
            date_range: Some(DateRange::new(ymd(2), ymd(3))),
            platforms: vec!["Google".into()],
            states: Vec::new(),
        };
        let view = DashboardView::build(&dataset(), &filters, Dimension::PlatformCampaign, &config);

        assert_eq!(view.combined.len(), 2);
        assert_eq!(view.kpis.total_revenue, 5000.0);
        // Days 2 and 3 across both platforms: (20 + 30) + (40 + 60)
        assert_eq!(view.kpis.total_spend, 150.0);
        assert_eq!(view.by_platform.len(), 1);
        assert_eq!(view.by_platform[0].totals.spend, 100.0);
        assert_eq!(view.breakdown[0].label(), "Google launch (Google)");
    }

    #[test]
    fn filters_matching_nothing_give_empty_marketing() {
        let config = DashboardConfig::default();
        let filters = FilterState {
            states: vec!["TX".into()],
            ..FilterState::default()
        };
        let view = DashboardView::build(&dataset(), &filters, Dimension::Tactic, &config);
        assert!(view.marketing.is_empty());
        assert!(view.state_highlights.is_none());
        assert!(view.by_platform.is_empty());
        assert_eq!(view.kpis.total_spend, 180.0);
        assert_eq!(view.combined.len(), 3);
    }

    #[test]
    fn ad_spend_tile_ignores_platform_selection() {
        let mut data = dataset();
        data.business.truncate(1);
        data.marketing.retain(|r| r.date == ymd(1));
        data.marketing[1].spend = 30.0;

        let filters = FilterState {
            platforms: vec!["Google".into()],
            ..FilterState::default()
        };
        let config = DashboardConfig::default();
        let view = DashboardView::build(&data, &filters, Dimension::Platform, &config);

        assert_eq!(view.kpis.total_spend, 40.0);
        assert_eq!(view.combined[0].customer_acquisition_cost(), 40.0);
        assert_eq!(view.by_platform.len(), 1);
        assert_eq!(view.by_platform[0].totals.spend, 30.0);
    }
}
