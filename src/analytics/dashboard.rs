//! Data behind every dashboard view, computed from the raw readings and
//! the latest schedule

use crate::analytics::error::AnalyticsResult;
use crate::analytics::statistics::{BoxSummary, CorrelationMatrix};
use crate::error::Result;
use crate::maintenance::PriorityCounts;
use crate::models::{Priority, ScoredReading, SensorReading};
use crate::pipeline::{load_readings, load_scored};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Columns of the raw-data correlation matrix
pub const CORRELATION_COLUMNS: [&str; 4] = ["Usage_Hours", "Temperature", "Pressure", "Failure"];

/// Rows that belong to an asset
pub trait AssetRow {
    fn asset_id(&self) -> &str;
}

impl AssetRow for SensorReading {
    fn asset_id(&self) -> &str {
        &self.asset_id
    }
}

impl AssetRow for ScoredReading {
    fn asset_id(&self) -> &str {
        &self.asset_id
    }
}

/// Subset of assets to show. The default selects every asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFilter {
    assets: Option<BTreeSet<String>>,
}

impl AssetFilter {
    pub fn all() -> Self {
        Self { assets: None }
    }

    pub fn only<I, S>(assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            assets: Some(assets.into_iter().map(Into::into).collect()),
        }
    }

    pub fn matches(&self, asset_id: &str) -> bool {
        self.assets
            .as_ref()
            .map_or(true, |assets| assets.contains(asset_id))
    }

    pub fn apply<'a, T: AssetRow>(&self, rows: &'a [T]) -> Vec<&'a T> {
        rows.iter().filter(|row| self.matches(row.asset_id())).collect()
    }

    /// Selected assets present in `rows`, sorted
    pub fn selected<T: AssetRow>(&self, rows: &[T]) -> Vec<String> {
        rows.iter()
            .map(|row| row.asset_id())
            .filter(|id| self.matches(id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect()
    }
}

/// Sorted distinct asset ids of a dataset
pub fn available_assets<T: AssetRow>(rows: &[T]) -> Vec<String> {
    AssetFilter::all().selected(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub usage_hours: f64,
    pub temperature: f64,
    pub pressure: f64,
}

/// Sensor time series of one asset, ordered by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetTrend {
    pub asset_id: String,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCount {
    pub asset_id: String,
    pub count: usize,
}

/// Failures summed per date (rows) and asset (columns); missing cells are 0
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureHeatmap {
    pub dates: Vec<NaiveDate>,
    pub assets: Vec<String>,
    pub cells: Vec<Vec<u32>>,
}

impl FailureHeatmap {
    fn from_readings(rows: &[&SensorReading]) -> Self {
        let dates: Vec<NaiveDate> = rows
            .iter()
            .map(|r| r.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let assets: Vec<String> = rows
            .iter()
            .map(|r| r.asset_id.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect();

        let date_index: HashMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        let asset_index: HashMap<&str, usize> = assets
            .iter()
            .enumerate()
            .map(|(i, a)| (a.as_str(), i))
            .collect();

        let mut cells = vec![vec![0u32; assets.len()]; dates.len()];
        for row in rows {
            let (Some(&d), Some(&a)) = (
                date_index.get(&row.date),
                asset_index.get(row.asset_id.as_str()),
            ) else {
                continue;
            };
            cells[d][a] += u32::from(row.failure);
        }

        Self {
            dates,
            assets,
            cells,
        }
    }

    pub fn get(&self, date: NaiveDate, asset_id: &str) -> Option<u32> {
        let d = self.dates.iter().position(|x| *x == date)?;
        let a = self.assets.iter().position(|x| x == asset_id)?;
        Some(self.cells[d][a])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionDistribution {
    pub predicted_failure: usize,
    pub predicted_ok: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetProbability {
    pub asset_id: String,
    pub summary: BoxSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationCount {
    pub explanation: String,
    pub count: usize,
}

/// One row of the high-risk schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighRiskEntry {
    pub asset_id: String,
    pub date: NaiveDate,
    pub failure_prob: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualVsPredicted {
    pub asset_id: String,
    pub actual_failures: usize,
    pub predicted_failures: usize,
}

/// Complete dashboard data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    pub generated_at: DateTime<Utc>,

    /// Assets shown, sorted
    pub assets: Vec<String>,

    pub raw_rows: usize,
    pub scored_rows: usize,

    pub sensor_trends: Vec<AssetTrend>,

    /// Historical failures per asset, most failures first; assets that never
    /// failed are omitted
    pub failure_counts: Vec<AssetCount>,
    pub failure_heatmap: FailureHeatmap,

    pub prediction_distribution: PredictionDistribution,
    pub probability_by_asset: Vec<AssetProbability>,
    pub top_explanations: Vec<ExplanationCount>,

    pub priority_counts: PriorityCounts,
    pub high_risk: Vec<HighRiskEntry>,

    pub actual_vs_predicted: Vec<ActualVsPredicted>,
    pub correlation: CorrelationMatrix,
}

/// Builds [`DashboardData`] from the two datasets
#[derive(Debug, Clone)]
pub struct DashboardProvider {
    top_explanations: usize,
}

impl DashboardProvider {
    pub fn new(top_explanations: usize) -> Self {
        Self { top_explanations }
    }

    /// Load both CSV files and build the dashboard
    pub fn from_files(
        &self,
        raw_path: &Path,
        scored_path: &Path,
        filter: &AssetFilter,
    ) -> Result<DashboardData> {
        let raw = load_readings(raw_path)?;
        let scored = load_scored(scored_path)?;
        Ok(self.generate(&raw, &scored, filter)?)
    }

    pub fn generate(
        &self,
        raw: &[SensorReading],
        scored: &[ScoredReading],
        filter: &AssetFilter,
    ) -> AnalyticsResult<DashboardData> {
        let raw_rows = filter.apply(raw);
        let scored_rows = filter.apply(scored);

        debug!(
            raw = raw_rows.len(),
            scored = scored_rows.len(),
            "Building dashboard"
        );

        let data = DashboardData {
            generated_at: Utc::now(),
            assets: filter.selected(scored),
            raw_rows: raw_rows.len(),
            scored_rows: scored_rows.len(),
            sensor_trends: sensor_trends(&raw_rows),
            failure_counts: failure_counts(&raw_rows),
            failure_heatmap: FailureHeatmap::from_readings(&raw_rows),
            prediction_distribution: prediction_distribution(&scored_rows),
            probability_by_asset: probability_by_asset(&scored_rows)?,
            top_explanations: top_explanations(&scored_rows, self.top_explanations),
            priority_counts: scored_rows.iter().fold(
                PriorityCounts::default(),
                |mut counts, row| {
                    counts.record(row.priority);
                    counts
                },
            ),
            high_risk: high_risk(&scored_rows),
            actual_vs_predicted: actual_vs_predicted(&scored_rows),
            correlation: correlation(&raw_rows)?,
        };

        info!(
            assets = data.assets.len(),
            urgent = data.priority_counts.urgent,
            "Dashboard data generated"
        );

        Ok(data)
    }
}

impl Default for DashboardProvider {
    fn default() -> Self {
        Self::new(10)
    }
}

fn sensor_trends(rows: &[&SensorReading]) -> Vec<AssetTrend> {
    let mut by_asset: BTreeMap<&str, Vec<TrendPoint>> = BTreeMap::new();
    for row in rows {
        by_asset
            .entry(row.asset_id.as_str())
            .or_default()
            .push(TrendPoint {
                date: row.date,
                usage_hours: row.usage_hours,
                temperature: row.temperature,
                pressure: row.pressure,
            });
    }

    by_asset
        .into_iter()
        .map(|(asset_id, mut points)| {
            points.sort_by_key(|p| p.date);
            AssetTrend {
                asset_id: asset_id.to_string(),
                points,
            }
        })
        .collect()
}

fn failure_counts(rows: &[&SensorReading]) -> Vec<AssetCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.failed()) {
        *counts.entry(row.asset_id.as_str()).or_insert(0) += 1;
    }

    let mut counts: Vec<AssetCount> = counts
        .into_iter()
        .map(|(asset_id, count)| AssetCount {
            asset_id: asset_id.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps assets with equal counts in id order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

fn prediction_distribution(rows: &[&ScoredReading]) -> PredictionDistribution {
    let predicted_failure = rows.iter().filter(|r| r.predicted_failure).count();
    PredictionDistribution {
        predicted_failure,
        predicted_ok: rows.len() - predicted_failure,
    }
}

fn probability_by_asset(rows: &[&ScoredReading]) -> AnalyticsResult<Vec<AssetProbability>> {
    let mut by_asset: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for row in rows {
        by_asset
            .entry(row.asset_id.as_str())
            .or_default()
            .push(row.failure_prob);
    }

    by_asset
        .into_iter()
        .map(|(asset_id, probs)| {
            Ok(AssetProbability {
                asset_id: asset_id.to_string(),
                summary: BoxSummary::from_data(&probs)?,
            })
        })
        .collect()
}

fn top_explanations(rows: &[&ScoredReading], limit: usize) -> Vec<ExplanationCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        *counts.entry(row.explanation.as_str()).or_insert(0) += 1;
    }

    let mut counts: Vec<ExplanationCount> = counts
        .into_iter()
        .map(|(explanation, count)| ExplanationCount {
            explanation: explanation.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

fn high_risk(rows: &[&ScoredReading]) -> Vec<HighRiskEntry> {
    let mut entries: Vec<HighRiskEntry> = rows
        .iter()
        .filter(|r| r.priority == Priority::Urgent)
        .map(|r| HighRiskEntry {
            asset_id: r.asset_id.clone(),
            date: r.date,
            failure_prob: r.failure_prob,
            explanation: r.explanation.clone(),
        })
        .collect();
    entries.sort_by(|a, b| b.failure_prob.total_cmp(&a.failure_prob));
    entries
}

fn actual_vs_predicted(rows: &[&ScoredReading]) -> Vec<ActualVsPredicted> {
    let mut by_asset: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for row in rows {
        let entry = by_asset.entry(row.asset_id.as_str()).or_insert((0, 0));
        entry.0 += usize::from(row.failure);
        entry.1 += usize::from(row.predicted_failure);
    }

    by_asset
        .into_iter()
        .map(|(asset_id, (actual, predicted))| ActualVsPredicted {
            asset_id: asset_id.to_string(),
            actual_failures: actual,
            predicted_failures: predicted,
        })
        .collect()
}

fn correlation(rows: &[&SensorReading]) -> AnalyticsResult<CorrelationMatrix> {
    let column = |f: fn(&SensorReading) -> f64| rows.iter().map(|r| f(r)).collect::<Vec<f64>>();

    CorrelationMatrix::from_columns(&[
        (CORRELATION_COLUMNS[0], column(|r| r.usage_hours)),
        (CORRELATION_COLUMNS[1], column(|r| r.temperature)),
        (CORRELATION_COLUMNS[2], column(|r| r.pressure)),
        (CORRELATION_COLUMNS[3], column(|r| f64::from(r.failure))),
    ])
}
