//! CSV Data Loader Module
//! Reads the business and platform CSV files with Polars and extracts typed rows.

use crate::config::DashboardConfig;
use crate::data::{BusinessDay, Dataset, FileReport, MarketingRow};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Data file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("{source_name}: missing required column '{column}'")]
    MissingColumn { source_name: String, column: String },
    #[error("{0}: no valid rows")]
    NoData(String),
}

const DATE: &[&str] = &["date"];
const ORDERS: &[&str] = &["# of orders", "orders"];
const NEW_ORDERS: &[&str] = &["# of new orders", "new orders"];
const NEW_CUSTOMERS: &[&str] = &["new customers"];
const TOTAL_REVENUE: &[&str] = &["total revenue", "revenue"];
const GROSS_PROFIT: &[&str] = &["gross profit", "profit"];
const COGS: &[&str] = &["cogs"];

const TACTIC: &[&str] = &["tactic"];
const STATE: &[&str] = &["state"];
const CAMPAIGN: &[&str] = &["campaign"];
const IMPRESSIONS: &[&str] = &["impression", "impressions"];
const CLICKS: &[&str] = &["clicks"];
const SPEND: &[&str] = &["spend"];
const ATTRIBUTED_REVENUE: &[&str] = &["attributed revenue"];

/// Loads the configured data sources into a [`Dataset`].
pub struct DataLoader {
    config: DashboardConfig,
}

impl DataLoader {
    pub fn new(config: DashboardConfig) -> Self {
        Self { config }
    }

    /// Load the business file and every platform file.
    pub fn load(&self) -> Result<Dataset, LoaderError> {
        let mut report = Vec::new();

        let business_path = self.config.business_path();
        let df = Self::read_frame(&business_path)?;
        let source = self.config.business_file.clone();
        let (business, dropped) = Self::business_from_frame(&df, &source)?;
        if business.is_empty() {
            return Err(LoaderError::NoData(source));
        }
        log::info!(
            "Loaded {} business days from {} ({} dropped)",
            business.len(),
            business_path.display(),
            dropped
        );
        report.push(FileReport {
            source,
            rows_read: df.height(),
            rows_dropped: dropped,
        });

        let mut marketing = Vec::new();
        let mut platforms = Vec::new();
        for platform in &self.config.platforms {
            let path = self.config.platform_path(platform);
            let df = Self::read_frame(&path)?;
            let (rows, dropped) = Self::marketing_from_frame(&df, &platform.name)?;
            log::info!(
                "Loaded {} {} rows from {} ({} dropped)",
                rows.len(),
                platform.name,
                path.display(),
                dropped
            );
            report.push(FileReport {
                source: platform.file.clone(),
                rows_read: df.height(),
                rows_dropped: dropped,
            });
            marketing.extend(rows);
            platforms.push(platform.name.clone());
        }

        // Stable: rows of one date keep the configured platform order
        marketing.sort_by_key(|r| r.date);

        Ok(Dataset {
            business,
            marketing,
            platforms,
            report,
        })
    }

    /// Read a CSV file using Polars. Malformed cells become nulls.
    pub fn read_frame(path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::MissingFile(path.to_path_buf()));
        }

        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        Ok(df)
    }

    /// Extract business days. Rows with a bad date or a missing/negative
    /// number are dropped, as are repeated dates after the first.
    pub fn business_from_frame(
        df: &DataFrame,
        source: &str,
    ) -> Result<(Vec<BusinessDay>, usize), LoaderError> {
        let dates = text_values(required(df, source, DATE)?)?;
        let orders = numeric_values(required(df, source, ORDERS)?)?;
        let new_orders = numeric_values(required(df, source, NEW_ORDERS)?)?;
        let new_customers = numeric_values(required(df, source, NEW_CUSTOMERS)?)?;
        let total_revenue = numeric_values(required(df, source, TOTAL_REVENUE)?)?;
        let gross_profit = numeric_values(required(df, source, GROSS_PROFIT)?)?;
        let cogs = numeric_values(required(df, source, COGS)?)?;

        let mut rows = Vec::with_capacity(df.height());
        let mut seen = HashSet::new();
        let mut malformed = 0;
        let mut duplicates = 0;

        for i in 0..df.height() {
            let row = (|| {
                Some(BusinessDay {
                    date: parse_date(dates[i].as_deref()?)?,
                    orders: count(orders[i])?,
                    new_orders: count(new_orders[i])?,
                    new_customers: count(new_customers[i])?,
                    total_revenue: amount(total_revenue[i])?,
                    // Gross profit may legitimately be negative
                    gross_profit: gross_profit[i].filter(|v| v.is_finite())?,
                    cogs: amount(cogs[i])?,
                })
            })();

            match row {
                Some(day) if seen.insert(day.date) => rows.push(day),
                Some(day) => {
                    log::warn!("{source}: duplicate date {} ignored", day.date);
                    duplicates += 1;
                }
                None => malformed += 1,
            }
        }

        if malformed > 0 {
            log::warn!("{source}: dropped {malformed} malformed rows");
        }

        rows.sort_by_key(|d| d.date);
        Ok((rows, malformed + duplicates))
    }

    /// Extract marketing rows for one platform.
    pub fn marketing_from_frame(
        df: &DataFrame,
        platform: &str,
    ) -> Result<(Vec<MarketingRow>, usize), LoaderError> {
        let dates = text_values(required(df, platform, DATE)?)?;
        let tactics = text_values(required(df, platform, TACTIC)?)?;
        let states = text_values(required(df, platform, STATE)?)?;
        let campaigns = match find_column(df, CAMPAIGN) {
            Some(column) => text_values(column)?,
            None => vec![None; df.height()],
        };
        let impressions = numeric_values(required(df, platform, IMPRESSIONS)?)?;
        let clicks = numeric_values(required(df, platform, CLICKS)?)?;
        let spend = numeric_values(required(df, platform, SPEND)?)?;
        let attributed = numeric_values(required(df, platform, ATTRIBUTED_REVENUE)?)?;

        let mut rows = Vec::with_capacity(df.height());
        let mut dropped = 0;

        for i in 0..df.height() {
            let row = (|| {
                Some(MarketingRow {
                    date: parse_date(dates[i].as_deref()?)?,
                    platform: platform.to_string(),
                    tactic: tactics[i].clone()?,
                    state: states[i].clone()?,
                    campaign: campaigns[i].clone().unwrap_or_default(),
                    impressions: count(impressions[i])?,
                    clicks: count(clicks[i])?,
                    spend: amount(spend[i])?,
                    attributed_revenue: amount(attributed[i])?,
                })
            })();

            match row {
                Some(row) => rows.push(row),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            log::warn!("{platform}: dropped {dropped} malformed rows");
        }

        Ok((rows, dropped))
    }
}

/// Find a column by any of its accepted names (case-insensitive, trimmed).
fn find_column<'a>(df: &'a DataFrame, names: &[&str]) -> Option<&'a Column> {
    df.get_columns().iter().find(|c| {
        let name = c.name().as_str().trim().to_lowercase();
        names.iter().any(|n| *n == name)
    })
}

fn required<'a>(
    df: &'a DataFrame,
    source: &str,
    names: &[&str],
) -> Result<&'a Column, LoaderError> {
    find_column(df, names).ok_or_else(|| LoaderError::MissingColumn {
        source_name: source.to_string(),
        column: names[0].to_string(),
    })
}

fn text_values(column: &Column) -> Result<Vec<Option<String>>, LoaderError> {
    let series = column.as_materialized_series().cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
        .collect();
    Ok(values)
}

/// Numeric column as f64. Text columns are coerced, accepting "$1,234.50".
fn numeric_values(column: &Column) -> Result<Vec<Option<f64>>, LoaderError> {
    let series = column.as_materialized_series();
    if series.dtype() == &DataType::String {
        return Ok(series.str()?.into_iter().map(|v| v.and_then(parse_number)).collect());
    }

    let values = series.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    cleaned.parse().ok()
}

fn count(value: Option<f64>) -> Option<u64> {
    amount(value).map(|v| v.round() as u64)
}

fn amount(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

/// Parse a date cell. Accepts ISO dates, `YYYY/MM/DD`, `MM/DD/YYYY` and
/// timestamps (date part kept).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts.date());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformSource;
    use std::fs;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn business_frame() -> DataFrame {
        df!(
            "date" => ["2025-05-17", "2025-05-16", "2025-05-16", "not a date"],
            "# of orders" => [Some(10i64), Some(20), Some(30), Some(40)],
            "# of new orders" => [4i64, 5, 6, 7],
            "new customers" => [2i64, 3, 4, 5],
            "total revenue" => [1000.0, 2000.0, 3000.0, 4000.0],
            "gross profit" => [300.0, -50.0, 900.0, 1200.0],
            "COGS" => [700.0, 2050.0, 2100.0, 2800.0]
        )
        .unwrap()
    }

    #[test]
    fn business_rows_are_sorted_and_deduplicated() {
        let (days, dropped) = DataLoader::business_from_frame(&business_frame(), "business.csv").unwrap();

        assert_eq!(dropped, 2);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, ymd(2025, 5, 16));
        assert_eq!(days[0].orders, 20, "first occurrence of a date wins");
        assert_eq!(days[0].gross_profit, -50.0);
        assert_eq!(days[1].date, ymd(2025, 5, 17));
    }

    #[test]
    fn missing_business_column_is_reported() {
        let df = df!("date" => ["2025-05-16"], "# of orders" => [1i64]).unwrap();
        let err = DataLoader::business_from_frame(&df, "business.csv").unwrap_err();
        match err {
            LoaderError::MissingColumn { column, .. } => assert_eq!(column, "# of new orders"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn marketing_rows_drop_missing_and_negative_values() {
        let df = df!(
            "Date" => ["2025-05-16", "2025-05-16", "2025-05-17"],
            "Tactic" => ["ASC", "ASC", "Retargeting"],
            "State" => ["NY", "CA", "NY"],
            "Campaign" => ["Spring", "Spring", "Summer"],
            "impressions" => [Some(1000i64), None, Some(500)],
            "clicks" => [10i64, 5, 7],
            "spend" => [25.5, 10.0, -1.0],
            "attributed revenue" => [100.0, 20.0, 30.0]
        )
        .unwrap();

        let (rows, dropped) = DataLoader::marketing_from_frame(&df, "Facebook").unwrap();
        assert_eq!(dropped, 2);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].platform, "Facebook");
        assert_eq!(rows[0].impressions, 1000);
        assert_eq!(rows[0].spend, 25.5);
    }

    #[test]
    fn text_numbers_are_coerced() {
        let df = df!(
            "date" => ["2025-05-16"],
            "tactic" => ["Search"],
            "state" => ["WA"],
            "impression" => ["1,200"],
            "clicks" => ["12"],
            "spend" => ["$1,050.25"],
            "attributed revenue" => ["0"]
        )
        .unwrap();

        let (rows, dropped) = DataLoader::marketing_from_frame(&df, "Google").unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(rows[0].impressions, 1200);
        assert_eq!(rows[0].spend, 1050.25);
        assert_eq!(rows[0].campaign, "");
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("2025-05-16"), Some(ymd(2025, 5, 16)));
        assert_eq!(parse_date("2025/05/16"), Some(ymd(2025, 5, 16)));
        assert_eq!(parse_date("05/16/2025"), Some(ymd(2025, 5, 16)));
        assert_eq!(parse_date("2025-05-16 00:00:00"), Some(ymd(2025, 5, 16)));
        assert_eq!(parse_date("16th May"), None);
    }

    fn write_sources(dir: &Path) {
        fs::write(
            dir.join("business.csv"),
            "date,# of orders,# of new orders,new customers,total revenue,gross profit,COGS\n\
             2025-05-16,10,4,3,1000,300,700\n\
             2025-05-17,12,5,4,1200,360,840\n",
        )
        .unwrap();
        fs::write(
            dir.join("fb.csv"),
            "date,tactic,state,campaign,impression,clicks,spend,attributed revenue\n\
             2025-05-17,ASC,NY,Spring,1000,10,20.5,80\n\
             2025-05-16,ASC,NY,Spring,2000,30,40,100\n",
        )
        .unwrap();
        fs::write(
            dir.join("g.csv"),
            "date,tactic,state,campaign,impression,clicks,spend,attributed revenue\n\
             2025-05-16,Search,CA,Brand,500,25,10,0\n\
             2025-05-16,Search,CA,Brand,oops,25,10,0\n",
        )
        .unwrap();
    }

    fn test_config(dir: &Path) -> DashboardConfig {
        DashboardConfig {
            data_dir: dir.to_path_buf(),
            platforms: vec![
                PlatformSource::new("Facebook", "fb.csv"),
                PlatformSource::new("Google", "g.csv"),
            ],
            ..DashboardConfig::default()
        }
    }

    #[test]
    fn load_reads_every_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path());

        let dataset = DataLoader::new(test_config(dir.path())).load().unwrap();
        assert_eq!(dataset.business.len(), 2);
        assert_eq!(dataset.marketing.len(), 3);
        assert_eq!(dataset.platforms, vec!["Facebook", "Google"]);
        assert_eq!(dataset.marketing[0].date, ymd(2025, 5, 16));
        assert_eq!(dataset.marketing[0].platform, "Facebook");
        assert_eq!(dataset.marketing[1].platform, "Google");
        assert_eq!(dataset.rows_dropped(), 1);
        assert_eq!(dataset.date_bounds(), Some((ymd(2025, 5, 16), ymd(2025, 5, 17))));
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path());
        let mut config = test_config(dir.path());
        config.platforms.push(PlatformSource::new("TikTok", "missing.csv"));

        let err = DataLoader::new(config).load().unwrap_err();
        assert!(matches!(err, LoaderError::MissingFile(_)));
    }
}
