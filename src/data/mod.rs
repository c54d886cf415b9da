//! Data module - CSV loading, filtering and export

mod exporter;
mod loader;
mod model;
mod processor;

pub use exporter::TableExporter;
pub use loader::DataLoader;
pub use model::{BusinessDay, Dataset, FileReport, MarketingRow};
pub use processor::{DataProcessor, DateRange, FilterState};
