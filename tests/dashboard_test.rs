//! Dashboard built from a real pipeline run

mod common;

use common::{synthetic_csv, test_model, write_file};
use smart_asset_scheduler::analytics::{
    AssetFilter, DashboardExporter, DashboardProvider, ExportFormat, CORRELATION_COLUMNS,
};
use smart_asset_scheduler::models::Priority;
use smart_asset_scheduler::pipeline::{load_scored, run_pipeline};
use std::fs;

#[test]
fn test_dashboard_from_pipeline_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "readings.csv", &synthetic_csv(4, 30, 21));
    let output = dir.path().join("schedule.csv");
    run_pipeline(&input, &output, test_model()).unwrap();

    let data = DashboardProvider::default()
        .from_files(&input, &output, &AssetFilter::all())
        .unwrap();

    assert_eq!(data.assets, vec!["A1", "A2", "A3", "A4"]);
    assert_eq!(data.raw_rows, 120);
    assert_eq!(data.scored_rows, 120);
    assert_eq!(data.priority_counts.total(), 120);
    assert_eq!(
        data.prediction_distribution.predicted_failure + data.prediction_distribution.predicted_ok,
        120
    );
    assert!(data.top_explanations.len() <= 10);

    // High-risk list holds exactly the Urgent rows, most likely first
    let scored = load_scored(&output).unwrap();
    let urgent = scored.iter().filter(|r| r.priority == Priority::Urgent).count();
    assert_eq!(data.high_risk.len(), urgent);
    assert!(data
        .high_risk
        .windows(2)
        .all(|w| w[0].failure_prob >= w[1].failure_prob));

    let corr = &data.correlation;
    assert_eq!(corr.columns, CORRELATION_COLUMNS);
    for i in 0..corr.columns.len() {
        assert_eq!(corr.values[i][i], Some(1.0));
        for j in 0..corr.columns.len() {
            assert_eq!(corr.values[i][j], corr.values[j][i]);
        }
    }
}

#[test]
fn test_filtered_dashboard_export() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "readings.csv", &synthetic_csv(3, 20, 4));
    let output = dir.path().join("schedule.csv");
    run_pipeline(&input, &output, test_model()).unwrap();

    let filter = AssetFilter::only(["A2"]);
    let data = DashboardProvider::new(5)
        .from_files(&input, &output, &filter)
        .unwrap();

    assert_eq!(data.assets, vec!["A2"]);
    assert_eq!(data.scored_rows, 20);
    assert!(data.sensor_trends.iter().all(|t| t.asset_id == "A2"));
    assert!(data.actual_vs_predicted.iter().all(|a| a.asset_id == "A2"));
    assert_eq!(data.failure_heatmap.assets.len(), 1);

    let html_path = dir.path().join("report").join("dashboard.html");
    DashboardExporter::export(&data, ExportFormat::Html, &html_path).unwrap();
    let html = fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("Assets by Priority Level"));
    assert!(!html.contains("<td>A1</td>"));

    let json = DashboardExporter::export_to_bytes(&data, ExportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(value["assets"][0], "A2");
}
