//! Data Processor Module
//! Sidebar filters, the date join and the tabular views used for export.

use crate::data::{BusinessDay, MarketingRow};
use crate::stats::{CombinedDay, GroupSummary, MetricTotals};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds if they are reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Current sidebar selection. Empty platform/state lists mean "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub date_range: Option<DateRange>,
    pub platforms: Vec<String>,
    pub states: Vec<String>,
}

impl FilterState {
    fn in_range(&self, date: NaiveDate) -> bool {
        self.date_range.map_or(true, |r| r.contains(date))
    }

    fn platform_selected(&self, platform: &str) -> bool {
        self.platforms.is_empty() || self.platforms.iter().any(|p| p == platform)
    }

    fn state_selected(&self, state: &str) -> bool {
        self.states.is_empty() || self.states.iter().any(|s| s == state)
    }
}

/// Handles filtering and joining of loaded rows.
pub struct DataProcessor;

impl DataProcessor {
    pub fn filter_business(days: &[BusinessDay], range: Option<DateRange>) -> Vec<BusinessDay> {
        days.iter()
            .filter(|d| range.map_or(true, |r| r.contains(d.date)))
            .cloned()
            .collect()
    }

    /// Apply date range, then platforms, then states.
    pub fn filter_marketing(rows: &[MarketingRow], filters: &FilterState) -> Vec<MarketingRow> {
        rows.iter()
            .filter(|r| {
                filters.in_range(r.date)
                    && filters.platform_selected(&r.platform)
                    && filters.state_selected(&r.state)
            })
            .cloned()
            .collect()
    }

    /// States available under the current date range and platform selection.
    /// Configured platforms that have marketing rows inside the date range,
    /// in configured order.
    pub fn platform_options(
        rows: &[MarketingRow],
        configured: &[String],
        date_range: Option<DateRange>,
    ) -> Vec<String> {
        let present: BTreeSet<&str> = rows
            .iter()
            .filter(|r| date_range.map_or(true, |range| range.contains(r.date)))
            .map(|r| r.platform.as_str())
            .collect();
        configured
            .iter()
            .filter(|p| present.contains(p.as_str()))
            .cloned()
            .collect()
    }

    pub fn state_options(rows: &[MarketingRow], filters: &FilterState) -> Vec<String> {
        rows.iter()
            .filter(|r| filters.in_range(r.date) && filters.platform_selected(&r.platform))
            .map(|r| r.state.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Marketing totals per date.
    pub fn daily_marketing(rows: &[MarketingRow]) -> BTreeMap<NaiveDate, MetricTotals> {
        let mut daily: BTreeMap<NaiveDate, MetricTotals> = BTreeMap::new();
        for row in rows {
            daily.entry(row.date).or_default().add_row(row);
        }
        daily
    }

    /// Left join of business days with daily marketing totals.
    pub fn join_by_date(
        business: &[BusinessDay],
        daily: &BTreeMap<NaiveDate, MetricTotals>,
    ) -> Vec<CombinedDay> {
        business
            .iter()
            .map(|day| CombinedDay {
                business: day.clone(),
                marketing: daily.get(&day.date).copied(),
            })
            .collect()
    }

    /// "Business Metrics" table.
    pub fn business_frame(combined: &[CombinedDay]) -> Result<DataFrame, ProcessorError> {
        let df = DataFrame::new(vec![
            date_column(combined.iter().map(|d| d.date())),
            Column::new(
                "# of orders".into(),
                combined.iter().map(|d| d.business.orders).collect::<Vec<_>>(),
            ),
            Column::new(
                "new customers".into(),
                combined.iter().map(|d| d.business.new_customers).collect::<Vec<_>>(),
            ),
            Column::new(
                "total revenue".into(),
                combined.iter().map(|d| d.business.total_revenue).collect::<Vec<_>>(),
            ),
            Column::new(
                "gross profit".into(),
                combined.iter().map(|d| d.business.gross_profit).collect::<Vec<_>>(),
            ),
            Column::new(
                "avg_order_value".into(),
                combined.iter().map(|d| d.avg_order_value()).collect::<Vec<_>>(),
            ),
            Column::new(
                "profit_margin".into(),
                combined.iter().map(|d| d.profit_margin()).collect::<Vec<_>>(),
            ),
        ])?;
        Ok(df)
    }

    /// "Marketing Performance" table.
    pub fn marketing_frame(rows: &[MarketingRow]) -> Result<DataFrame, ProcessorError> {
        let totals: Vec<MetricTotals> = rows.iter().map(MetricTotals::from_row).collect();
        let df = DataFrame::new(vec![
            date_column(rows.iter().map(|r| r.date)),
            Column::new(
                "platform".into(),
                rows.iter().map(|r| r.platform.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "tactic".into(),
                rows.iter().map(|r| r.tactic.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "state".into(),
                rows.iter().map(|r| r.state.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "campaign".into(),
                rows.iter().map(|r| r.campaign.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "impression".into(),
                rows.iter().map(|r| r.impressions).collect::<Vec<_>>(),
            ),
            Column::new("clicks".into(), rows.iter().map(|r| r.clicks).collect::<Vec<_>>()),
            Column::new("spend".into(), rows.iter().map(|r| r.spend).collect::<Vec<_>>()),
            Column::new(
                "attributed revenue".into(),
                rows.iter().map(|r| r.attributed_revenue).collect::<Vec<_>>(),
            ),
            Column::new("ctr".into(), totals.iter().map(|t| t.ctr()).collect::<Vec<_>>()),
            Column::new("cpc".into(), totals.iter().map(|t| t.cpc()).collect::<Vec<_>>()),
        ])?;
        Ok(df)
    }

    /// "State-wise Analysis" table.
    pub fn state_frame(states: &[GroupSummary]) -> Result<DataFrame, ProcessorError> {
        let df = DataFrame::new(vec![
            Column::new(
                "state".into(),
                states.iter().map(|s| s.label()).collect::<Vec<_>>(),
            ),
            Column::new(
                "spend".into(),
                states.iter().map(|s| s.totals.spend).collect::<Vec<_>>(),
            ),
            Column::new(
                "attributed revenue".into(),
                states.iter().map(|s| s.totals.attributed_revenue).collect::<Vec<_>>(),
            ),
            Column::new(
                "impression".into(),
                states.iter().map(|s| s.totals.impressions).collect::<Vec<_>>(),
            ),
            Column::new(
                "clicks".into(),
                states.iter().map(|s| s.totals.clicks).collect::<Vec<_>>(),
            ),
            Column::new("ctr".into(), states.iter().map(|s| s.totals.ctr()).collect::<Vec<_>>()),
            Column::new("cpc".into(), states.iter().map(|s| s.totals.cpc()).collect::<Vec<_>>()),
            Column::new("cpm".into(), states.iter().map(|s| s.totals.cpm()).collect::<Vec<_>>()),
            Column::new(
                "platform".into(),
                states.iter().map(|s| s.platform_count as u32).collect::<Vec<_>>(),
            ),
        ])?;
        Ok(df)
    }

    /// "Combined View" table.
    pub fn combined_frame(combined: &[CombinedDay]) -> Result<DataFrame, ProcessorError> {
        let df = DataFrame::new(vec![
            date_column(combined.iter().map(|d| d.date())),
            Column::new(
                "total revenue".into(),
                combined.iter().map(|d| d.business.total_revenue).collect::<Vec<_>>(),
            ),
            Column::new(
                "spend".into(),
                combined.iter().map(|d| d.marketing.map(|m| m.spend)).collect::<Vec<_>>(),
            ),
            Column::new(
                "attributed revenue".into(),
                combined
                    .iter()
                    .map(|d| d.marketing.map(|m| m.attributed_revenue))
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                "ctr".into(),
                combined.iter().map(|d| d.marketing.map(|m| m.ctr())).collect::<Vec<_>>(),
            ),
            Column::new(
                "cpc".into(),
                combined.iter().map(|d| d.marketing.map(|m| m.cpc())).collect::<Vec<_>>(),
            ),
            Column::new(
                "marketing_attribution_rate".into(),
                combined
                    .iter()
                    .map(|d| d.marketing_attribution_rate())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                "customer_acquisition_cost".into(),
                combined
                    .iter()
                    .map(|d| d.customer_acquisition_cost())
                    .collect::<Vec<_>>(),
            ),
        ])?;
        Ok(df)
    }
}

fn date_column(dates: impl Iterator<Item = NaiveDate>) -> Column {
    let text: Vec<String> = dates.map(|d| d.format("%Y-%m-%d").to_string()).collect();
    Column::new("date".into(), text)
}
