//! Typed records extracted from the source CSV files.

use chrono::NaiveDate;

/// One row of the business-outcomes table. Dates are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessDay {
    pub date: NaiveDate,
    pub orders: u64,
    pub new_orders: u64,
    pub new_customers: u64,
    pub total_revenue: f64,
    pub gross_profit: f64,
    pub cogs: f64,
}

/// One row of a platform marketing table.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketingRow {
    pub date: NaiveDate,
    pub platform: String,
    pub tactic: String,
    pub state: String,
    pub campaign: String,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub attributed_revenue: f64,
}

/// Per-file load outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub source: String,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

/// Everything loaded for one session.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Sorted by date
    pub business: Vec<BusinessDay>,
    /// Sorted by date, configured platform order within a date
    pub marketing: Vec<MarketingRow>,
    /// Platform names in configured order
    pub platforms: Vec<String>,
    pub report: Vec<FileReport>,
}

impl Dataset {
    /// First and last business date.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.business.first()?.date, self.business.last()?.date))
    }

    /// All business dates in order, used for the date range controls.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.business.iter().map(|d| d.date).collect()
    }

    pub fn rows_dropped(&self) -> usize {
        self.report.iter().map(|r| r.rows_dropped).sum()
    }
}
