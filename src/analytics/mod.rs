//! Dashboard analytics over the raw readings and the scored schedule
//!
//! Computes the data behind each dashboard view (sensor trends, failure
//! history, prediction spread, explanation frequencies, priority breakdown,
//! actual vs predicted failures and the raw-data correlation matrix) and
//! exports it as JSON or a static HTML page. Nothing here writes to the
//! schedule.
//!
//! # Example
//!
//! ```no_run
//! use smart_asset_scheduler::analytics::{
//!     AssetFilter, DashboardExporter, DashboardProvider, ExportFormat,
//! };
//! use std::path::Path;
//!
//! let data = DashboardProvider::default().from_files(
//!     Path::new("data/synthetic_asset_data.csv"),
//!     Path::new("data/final_schedule.csv"),
//!     &AssetFilter::only(["A1", "A2"]),
//! )?;
//! DashboardExporter::export(&data, ExportFormat::Html, Path::new("data/dashboard.html"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod dashboard;
mod error;
mod export;
mod statistics;

pub use dashboard::{
    available_assets, ActualVsPredicted, AssetCount, AssetFilter, AssetProbability, AssetRow,
    AssetTrend, DashboardData, DashboardProvider, ExplanationCount, FailureHeatmap,
    HighRiskEntry, PredictionDistribution, TrendPoint, CORRELATION_COLUMNS,
};
pub use error::{AnalyticsError, AnalyticsResult};
pub use export::{DashboardExporter, ExportFormat};
pub use statistics::{pearson, BoxSummary, CorrelationMatrix};
