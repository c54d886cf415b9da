//! Marketing Metrics Module
//! Raw metric totals and the ratios derived from them (CTR, CPC, CPM, ROAS).

use crate::data::{BusinessDay, MarketingRow};
use chrono::NaiveDate;

/// Division that yields 0.0 when the denominator is zero or not finite.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summed raw marketing counters for any grouping of rows.
///
/// Ratios are always derived from the sums, never averaged from row ratios.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricTotals {
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub attributed_revenue: f64,
}

impl MetricTotals {
    pub fn from_row(row: &MarketingRow) -> Self {
        Self {
            impressions: row.impressions,
            clicks: row.clicks,
            spend: row.spend,
            attributed_revenue: row.attributed_revenue,
        }
    }

    pub fn add(&mut self, other: &MetricTotals) {
        self.impressions += other.impressions;
        self.clicks += other.clicks;
        self.spend += other.spend;
        self.attributed_revenue += other.attributed_revenue;
    }

    pub fn add_row(&mut self, row: &MarketingRow) {
        self.add(&Self::from_row(row));
    }

    /// Click-through rate in percent.
    pub fn ctr(&self) -> f64 {
        round2(safe_div(self.clicks as f64, self.impressions as f64) * 100.0)
    }

    /// Cost per click.
    pub fn cpc(&self) -> f64 {
        round2(safe_div(self.spend, self.clicks as f64))
    }

    /// Cost per thousand impressions.
    pub fn cpm(&self) -> f64 {
        round2(safe_div(self.spend, self.impressions as f64) * 1000.0)
    }

    /// Return on ad spend. Zero spend gives 0.
    pub fn roas(&self) -> f64 {
        round2(safe_div(self.attributed_revenue, self.spend))
    }

    /// Attributed revenue per thousand impressions.
    pub fn efficiency(&self) -> f64 {
        round2(safe_div(self.attributed_revenue, self.impressions as f64) * 1000.0)
    }
}

impl<'a> std::iter::Sum<&'a MetricTotals> for MetricTotals {
    fn sum<I: Iterator<Item = &'a MetricTotals>>(iter: I) -> Self {
        iter.fold(MetricTotals::default(), |mut acc, t| {
            acc.add(t);
            acc
        })
    }
}

/// Metrics that can be selected for ranking, pivots and charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Spend,
    AttributedRevenue,
    Impressions,
    Clicks,
    Ctr,
    Cpc,
    Cpm,
    Roas,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Spend,
        Metric::AttributedRevenue,
        Metric::Impressions,
        Metric::Clicks,
        Metric::Ctr,
        Metric::Cpc,
        Metric::Cpm,
        Metric::Roas,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Spend => "Spend ($)",
            Metric::AttributedRevenue => "Attributed Revenue ($)",
            Metric::Impressions => "Impressions",
            Metric::Clicks => "Clicks",
            Metric::Ctr => "CTR (%)",
            Metric::Cpc => "CPC ($)",
            Metric::Cpm => "CPM ($)",
            Metric::Roas => "ROAS",
        }
    }

    pub fn value(&self, totals: &MetricTotals) -> f64 {
        match self {
            Metric::Spend => totals.spend,
            Metric::AttributedRevenue => totals.attributed_revenue,
            Metric::Impressions => totals.impressions as f64,
            Metric::Clicks => totals.clicks as f64,
            Metric::Ctr => totals.ctr(),
            Metric::Cpc => totals.cpc(),
            Metric::Cpm => totals.cpm(),
            Metric::Roas => totals.roas(),
        }
    }
}

/// A business day joined with the marketing totals for the same date.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedDay {
    pub business: BusinessDay,
    /// `None` when no marketing row exists for the date (left join)
    pub marketing: Option<MetricTotals>,
}

impl CombinedDay {
    pub fn date(&self) -> NaiveDate {
        self.business.date
    }

    pub fn spend(&self) -> f64 {
        self.marketing.map(|m| m.spend).unwrap_or(0.0)
    }

    pub fn attributed_revenue(&self) -> f64 {
        self.marketing.map(|m| m.attributed_revenue).unwrap_or(0.0)
    }

    pub fn avg_order_value(&self) -> f64 {
        round2(safe_div(
            self.business.total_revenue,
            self.business.orders as f64,
        ))
    }

    pub fn customer_acquisition_cost(&self) -> f64 {
        round2(safe_div(self.spend(), self.business.new_customers as f64))
    }

    /// Share of total revenue attributed to marketing, in percent.
    pub fn marketing_attribution_rate(&self) -> f64 {
        round2(safe_div(self.attributed_revenue(), self.business.total_revenue) * 100.0)
    }

    pub fn profit_margin(&self) -> f64 {
        round2(safe_div(self.business.gross_profit, self.business.total_revenue) * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(impressions: u64, clicks: u64, spend: f64, revenue: f64) -> MetricTotals {
        MetricTotals {
            impressions,
            clicks,
            spend,
            attributed_revenue: revenue,
        }
    }

    #[test]
    fn ratios_follow_their_definitions() {
        let t = totals(20_000, 250, 125.0, 500.0);
        assert_eq!(t.ctr(), 1.25);
        assert_eq!(t.cpc(), 0.5);
        assert_eq!(t.cpm(), 6.25);
        assert_eq!(t.roas(), 4.0);
        assert_eq!(t.efficiency(), 25.0);
    }

    #[test]
    fn zero_spend_gives_zero_roas() {
        let t = totals(1000, 10, 0.0, 300.0);
        assert_eq!(t.roas(), 0.0);
    }

    #[test]
    fn zero_denominators_give_zero() {
        let t = MetricTotals::default();
        assert_eq!(t.ctr(), 0.0);
        assert_eq!(t.cpc(), 0.0);
        assert_eq!(t.cpm(), 0.0);
        assert_eq!(safe_div(1.0, f64::NAN), 0.0);
    }

    #[test]
    fn ratios_are_rounded_to_cents() {
        let t = totals(3, 1, 1.0, 0.0);
        assert_eq!(t.ctr(), 33.33);
        assert_eq!(round2(2.345_1), 2.35);
    }

    #[test]
    fn summing_totals_adds_every_counter() {
        let parts = [totals(10, 1, 2.5, 4.0), totals(30, 3, 7.5, 6.0)];
        let sum: MetricTotals = parts.iter().sum();
        assert_eq!(sum, totals(40, 4, 10.0, 10.0));
        assert_eq!(sum.ctr(), 10.0);
    }

    #[test]
    fn metric_value_reads_matching_field() {
        let t = totals(1000, 50, 25.0, 100.0);
        assert_eq!(Metric::Clicks.value(&t), 50.0);
        assert_eq!(Metric::Roas.value(&t), 4.0);
        assert_eq!(Metric::Ctr.value(&t), 5.0);
    }

    #[test]
    fn combined_day_without_marketing_has_zero_cac() {
        let day = CombinedDay {
            business: BusinessDay {
                date: NaiveDate::from_ymd_opt(2025, 5, 16).unwrap(),
                orders: 40,
                new_orders: 10,
                new_customers: 8,
                total_revenue: 2000.0,
                gross_profit: 500.0,
                cogs: 1500.0,
            },
            marketing: None,
        };
        assert_eq!(day.avg_order_value(), 50.0);
        assert_eq!(day.customer_acquisition_cost(), 0.0);
        assert_eq!(day.marketing_attribution_rate(), 0.0);
        assert_eq!(day.profit_margin(), 25.0);
    }
}
