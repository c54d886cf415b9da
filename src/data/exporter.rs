//! Table Exporter Module
//! Writes the detail tables of the current view to CSV files.

use crate::data::DataProcessor;
use crate::stats::DashboardView;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Table error: {0}")]
    Table(#[from] crate::data::processor::ProcessorError),
}

pub struct TableExporter;

impl TableExporter {
    /// Write the four detail tables into `dir`. Returns the written paths.
    pub fn export_tables(view: &DashboardView, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        fs::create_dir_all(dir)?;

        let tables = [
            ("business_metrics.csv", DataProcessor::business_frame(&view.combined)?),
            ("marketing_performance.csv", DataProcessor::marketing_frame(&view.marketing)?),
            ("state_analysis.csv", DataProcessor::state_frame(&view.by_state)?),
            ("combined_view.csv", DataProcessor::combined_frame(&view.combined)?),
        ];

        let mut written = Vec::with_capacity(tables.len());
        for (name, mut df) in tables {
            let path = dir.join(name);
            Self::write_csv(&mut df, &path)?;
            written.push(path);
        }

        log::info!("Exported {} tables to {}", written.len(), dir.display());
        Ok(written)
    }

    pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), ExportError> {
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).include_header(true).finish(df)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::data::{BusinessDay, Dataset, FilterState, MarketingRow};
    use crate::stats::Dimension;
    use chrono::NaiveDate;

    #[test]
    fn writes_all_four_tables_with_headers() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 16).unwrap();
        let dataset = Dataset {
            business: vec![BusinessDay {
                date,
                orders: 5,
                new_orders: 2,
                new_customers: 1,
                total_revenue: 500.0,
                gross_profit: 150.0,
                cogs: 350.0,
            }],
            marketing: vec![MarketingRow {
                date,
                platform: "TikTok".into(),
                tactic: "Spark".into(),
                state: "WA".into(),
                campaign: "Launch".into(),
                impressions: 4000,
                clicks: 40,
                spend: 20.0,
                attributed_revenue: 60.0,
            }],
            platforms: vec!["TikTok".into()],
            report: Vec::new(),
        };
        let view = DashboardView::build(
            &dataset,
            &FilterState::default(),
            Dimension::Platform,
            &DashboardConfig::default(),
        );

        let dir = tempfile::tempdir().unwrap();
        let written = TableExporter::export_tables(&view, dir.path()).unwrap();
        assert_eq!(written.len(), 4);

        let marketing = fs::read_to_string(dir.path().join("marketing_performance.csv")).unwrap();
        let mut lines = marketing.lines();
        assert!(lines.next().unwrap().starts_with("date,platform,tactic,state,campaign"));
        assert!(lines.next().unwrap().starts_with("2025-05-16,TikTok,Spark,WA,Launch,4000,40"));
    }
}
