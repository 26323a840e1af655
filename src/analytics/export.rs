//! Dashboard export formats

use crate::analytics::dashboard::DashboardData;
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use strum::{Display, EnumString};

/// Export format for the dashboard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    Json,
    Html,
}

impl ExportFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }

    /// Parse a user-supplied format name
    pub fn parse(name: &str) -> AnalyticsResult<Self> {
        name.parse()
            .map_err(|_| AnalyticsError::UnsupportedFormat(format!("unknown format '{}'", name)))
    }
}

/// Renders and writes dashboard data
pub struct DashboardExporter;

impl DashboardExporter {
    /// Render the dashboard and write it to `output_path`
    pub fn export(
        data: &DashboardData,
        format: ExportFormat,
        output_path: &Path,
    ) -> AnalyticsResult<Vec<u8>> {
        let bytes = Self::export_to_bytes(data, format)?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AnalyticsError::ExportFailed(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        fs::write(output_path, &bytes).map_err(|e| {
            AnalyticsError::ExportFailed(format!(
                "Failed to write {}: {}",
                output_path.display(),
                e
            ))
        })?;

        Ok(bytes)
    }

    /// Render without writing to a file
    pub fn export_to_bytes(data: &DashboardData, format: ExportFormat) -> AnalyticsResult<Vec<u8>> {
        match format {
            ExportFormat::Json => serde_json::to_vec_pretty(data).map_err(|e| {
                AnalyticsError::ExportFailed(format!("JSON serialization failed: {}", e))
            }),
            ExportFormat::Html => Ok(Self::render_html(data).into_bytes()),
        }
    }

    fn render_html(data: &DashboardData) -> String {
        let mut body = String::new();

        section(&mut body, "Sensor Trends");
        table(
            &mut body,
            &["Asset_ID", "Date", "Usage_Hours", "Temperature", "Pressure"],
            data.sensor_trends.iter().flat_map(|trend| {
                trend.points.iter().map(|p| {
                    vec![
                        trend.asset_id.clone(),
                        p.date.to_string(),
                        p.usage_hours.to_string(),
                        p.temperature.to_string(),
                        p.pressure.to_string(),
                    ]
                })
            }),
        );

        section(&mut body, "Historical Failures per Asset");
        table(
            &mut body,
            &["Asset_ID", "Failure Count"],
            data.failure_counts
                .iter()
                .map(|c| vec![c.asset_id.clone(), c.count.to_string()]),
        );

        section(&mut body, "Failure Heatmap");
        let mut heatmap_header = vec!["Date"];
        heatmap_header.extend(data.failure_heatmap.assets.iter().map(String::as_str));
        table(
            &mut body,
            &heatmap_header,
            data.failure_heatmap
                .dates
                .iter()
                .zip(&data.failure_heatmap.cells)
                .map(|(date, cells)| {
                    std::iter::once(date.to_string())
                        .chain(cells.iter().map(u32::to_string))
                        .collect::<Vec<String>>()
                }),
        );

        section(&mut body, "Predicted Failure Distribution");
        table(
            &mut body,
            &["Predicted_Failure", "Count"],
            [
                vec![
                    "true".to_string(),
                    data.prediction_distribution.predicted_failure.to_string(),
                ],
                vec![
                    "false".to_string(),
                    data.prediction_distribution.predicted_ok.to_string(),
                ],
            ],
        );

        section(&mut body, "Predicted Failure Probability");
        table(
            &mut body,
            &["Asset_ID", "Min", "Q1", "Median", "Q3", "Max"],
            data.probability_by_asset.iter().map(|a| {
                let s = &a.summary;
                vec![
                    a.asset_id.clone(),
                    fmt_prob(s.min),
                    fmt_prob(s.q1),
                    fmt_prob(s.median),
                    fmt_prob(s.q3),
                    fmt_prob(s.max),
                ]
            }),
        );

        section(&mut body, "Most Common Explanations");
        table(
            &mut body,
            &["Explanation", "Count"],
            data.top_explanations
                .iter()
                .map(|e| vec![e.explanation.clone(), e.count.to_string()]),
        );

        section(&mut body, "Assets by Priority Level");
        let counts = &data.priority_counts;
        table(
            &mut body,
            &["Priority", "Count"],
            [
                vec!["Urgent".to_string(), counts.urgent.to_string()],
                vec!["Medium".to_string(), counts.medium.to_string()],
                vec!["Low".to_string(), counts.low.to_string()],
            ],
        );

        section(&mut body, "High Risk Asset Schedule");
        table(
            &mut body,
            &["Asset_ID", "Date", "Failure_Prob", "Explanation"],
            data.high_risk.iter().map(|r| {
                vec![
                    r.asset_id.clone(),
                    r.date.to_string(),
                    fmt_prob(r.failure_prob),
                    r.explanation.clone(),
                ]
            }),
        );

        section(&mut body, "Actual vs Predicted Failures");
        table(
            &mut body,
            &["Asset_ID", "Failure", "Predicted_Failure"],
            data.actual_vs_predicted.iter().map(|a| {
                vec![
                    a.asset_id.clone(),
                    a.actual_failures.to_string(),
                    a.predicted_failures.to_string(),
                ]
            }),
        );

        section(&mut body, "Correlation Matrix (Raw Data)");
        let mut corr_header = vec![""];
        corr_header.extend(data.correlation.columns.iter().map(String::as_str));
        table(
            &mut body,
            &corr_header,
            data.correlation
                .columns
                .iter()
                .zip(&data.correlation.values)
                .map(|(name, row)| {
                    std::iter::once(name.clone())
                        .chain(row.iter().map(|r| match r {
                            Some(r) => format!("{:.2}", r),
                            None => "n/a".to_string(),
                        }))
                        .collect::<Vec<String>>()
                }),
        );

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Smart Asset Scheduler Dashboard</title>
    <style>
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            max-width: 1200px;
            margin: 0 auto;
            padding: 20px;
            background-color: #f5f5f5;
        }}
        .header {{
            background-color: #2c3e50;
            color: white;
            padding: 20px;
            border-radius: 5px;
            margin-bottom: 20px;
        }}
        table {{
            border-collapse: collapse;
            background-color: white;
            margin-bottom: 20px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }}
        th, td {{
            padding: 4px 10px;
            border: 1px solid #ecf0f1;
            text-align: left;
        }}
        th {{
            background-color: #ecf0f1;
        }}
    </style>
</head>
<body>
    <div class="header">
        <h1>Smart Asset Scheduler Dashboard</h1>
        <p>Generated {} &middot; {} assets &middot; {} scored rows</p>
    </div>
{}</body>
</html>
"#,
            data.generated_at.to_rfc3339(),
            data.assets.len(),
            data.scored_rows,
            body
        )
    }
}

fn fmt_prob(p: f64) -> String {
    format!("{:.3}", p)
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "    <h2>{}</h2>", escape_html(title));
}

fn table<R>(out: &mut String, header: &[&str], rows: R)
where
    R: IntoIterator<Item = Vec<String>>,
{
    out.push_str("    <table>\n        <tr>");
    for h in header {
        let _ = write!(out, "<th>{}</th>", escape_html(h));
    }
    out.push_str("</tr>\n");

    for row in rows {
        out.push_str("        <tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape_html(&cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("    </table>\n");
}

/// Escape HTML special characters
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
