//! CSV source and sink for sensor and scored readings

use crate::error::{AppError, Result};
use crate::models::{ScoredReading, SensorReading};
use csv::StringRecord;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Columns every input file must carry
pub const INPUT_COLUMNS: [&str; 6] = [
    "Asset_ID",
    "Date",
    "Usage_Hours",
    "Temperature",
    "Pressure",
    "Failure",
];

/// Columns every schedule carries. An input with only the required columns
/// produces exactly this header.
pub const OUTPUT_COLUMNS: [&str; 10] = [
    "Asset_ID",
    "Date",
    "Usage_Hours",
    "Temperature",
    "Pressure",
    "Failure",
    "Failure_Prob",
    "Predicted_Failure",
    "Priority",
    "Explanation",
];

/// Columns the pipeline adds to every input row, in file order
pub const SCORE_COLUMNS: [&str; 4] = [
    "Failure_Prob",
    "Predicted_Failure",
    "Priority",
    "Explanation",
];

/// A loaded input file: the parsed readings plus the raw header and rows
/// they came from, so the schedule can carry every input column through
/// untouched.
#[derive(Debug, Clone)]
pub struct SensorTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
    readings: Vec<SensorReading>,
}

impl SensorTable {
    /// Header exactly as it appears in the source file
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Raw fields of every row, in file order
    pub fn records(&self) -> &[StringRecord] {
        &self.records
    }

    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    pub fn into_readings(self) -> Vec<SensorReading> {
        self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Output header: the input header followed by any score column it
    /// does not already carry. Returns the header and the slot of each
    /// score column within it.
    fn output_layout(&self) -> (Vec<String>, [usize; 4]) {
        let mut header: Vec<String> = self.headers.iter().map(str::to_string).collect();
        let mut slots = [0usize; 4];

        for (slot, column) in slots.iter_mut().zip(SCORE_COLUMNS) {
            *slot = match self.headers.iter().position(|h| h.trim() == column) {
                Some(existing) => existing,
                None => {
                    header.push(column.to_string());
                    header.len() - 1
                }
            };
        }

        (header, slots)
    }
}

/// Load and validate sensor readings.
///
/// Fails with `DataLoad` on a missing file or column, an unparseable value,
/// a negative or non-finite sensor value, a duplicated `(Asset_ID, Date)`
/// pair, or an empty dataset.
pub fn load_readings(path: &Path) -> Result<Vec<SensorReading>> {
    load_table(path).map(SensorTable::into_readings)
}

/// Load and validate sensor readings, keeping the raw rows for output.
///
/// Validation is the same as [`load_readings`].
pub fn load_table(path: &Path) -> Result<SensorTable> {
    let (headers, rows) = read_csv::<SensorReading>(path, &INPUT_COLUMNS)?;

    if rows.is_empty() {
        return Err(AppError::DataLoad(format!(
            "{} contains no sensor readings",
            path.display()
        )));
    }

    let mut seen = HashSet::with_capacity(rows.len());
    for (i, (_, reading)) in rows.iter().enumerate() {
        // Header is line 1
        let line = i + 2;

        if !seen.insert((reading.asset_id.as_str(), reading.date)) {
            return Err(AppError::DataLoad(format!(
                "duplicate reading for asset '{}' on {} at line {}",
                reading.asset_id, reading.date, line
            )));
        }

        let values = [reading.usage_hours, reading.temperature, reading.pressure];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AppError::DataLoad(format!(
                "non-finite sensor value at line {}",
                line
            )));
        }

        if reading.usage_hours < 0.0 {
            return Err(AppError::DataLoad(format!(
                "negative Usage_Hours {} at line {}",
                reading.usage_hours, line
            )));
        }
    }

    let (records, readings) = rows.into_iter().unzip();
    let table = SensorTable {
        headers,
        records,
        readings,
    };

    info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.headers.len(),
        "Loaded sensor readings"
    );

    Ok(table)
}

/// Load a previously written schedule
pub fn load_scored(path: &Path) -> Result<Vec<ScoredReading>> {
    let (_, rows) = read_csv::<ScoredReading>(path, &OUTPUT_COLUMNS)?;
    debug!(path = %path.display(), rows = rows.len(), "Loaded scored readings");
    Ok(rows.into_iter().map(|(_, row)| row).collect())
}

/// Replace `path` with the scored rows.
///
/// Each output row is the source row's raw fields followed by the score
/// columns; `rows` must be in the same order as `source`. Rows go to a
/// sibling temporary file that is renamed over the target once fully
/// written, so readers never observe a partial schedule.
pub fn write_scored(path: &Path, source: &SensorTable, rows: &[ScoredReading]) -> Result<()> {
    if rows.len() != source.len() {
        return Err(AppError::Persist(format!(
            "{} scored rows for {} input rows",
            rows.len(),
            source.len()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Persist(format!("cannot create {}: {}", parent.display(), e))
        })?;
    }

    let tmp_path = temp_path_for(path);
    if let Err(e) = write_csv(&tmp_path, source, rows) {
        if let Err(cleanup) = fs::remove_file(&tmp_path) {
            warn!(path = %tmp_path.display(), error = %cleanup, "Failed to remove partial output");
        }
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        AppError::Persist(format!(
            "cannot move {} to {}: {}",
            tmp_path.display(),
            path.display(),
            e
        ))
    })?;

    info!(path = %path.display(), rows = rows.len(), "Wrote schedule");

    Ok(())
}

fn write_csv(path: &Path, source: &SensorTable, rows: &[ScoredReading]) -> Result<()> {
    let persist = |e: csv::Error| AppError::Persist(format!("{}: {}", path.display(), e));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(persist)?;

    let (header, slots) = source.output_layout();
    writer.write_record(&header).map_err(persist)?;

    for (record, row) in source.records.iter().zip(rows) {
        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        fields.resize(header.len(), String::new());
        for (slot, value) in slots.iter().zip(score_fields(row)) {
            fields[*slot] = value;
        }
        writer.write_record(&fields).map_err(persist)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::Persist(format!("{}: {}", path.display(), e)))?;

    Ok(())
}

fn score_fields(row: &ScoredReading) -> [String; 4] {
    [
        format_probability(row.failure_prob),
        row.predicted_failure.to_string(),
        row.priority.to_string(),
        row.explanation.clone(),
    ]
}

// Whole values keep a trailing `.0` so the column always reads as a float.
fn format_probability(p: f64) -> String {
    if p.fract() == 0.0 {
        format!("{:.1}", p)
    } else {
        p.to_string()
    }
}

/// Read every row as raw fields plus its typed form. Header names are
/// matched after trimming; values are trimmed before parsing but the raw
/// record is returned as read.
fn read_csv<T: DeserializeOwned>(
    path: &Path,
    required: &[&str],
) -> Result<(StringRecord, Vec<(StringRecord, T)>)> {
    let load = |e: csv::Error| AppError::DataLoad(format!("{}: {}", path.display(), e));

    let mut reader = csv::ReaderBuilder::new()
        .from_path(path)
        .map_err(|e| AppError::DataLoad(format!("cannot open {}: {}", path.display(), e)))?;

    let headers = reader.headers().map_err(load)?.clone();
    let mut names = headers.clone();
    names.trim();

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !names.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::DataLoad(format!(
            "{} is missing column(s): {}",
            path.display(),
            missing.join(", ")
        )));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(load)?;
        let mut values = record.clone();
        values.trim();
        let parsed = values.deserialize(Some(&names)).map_err(|e| {
            let line = record.position().map_or(0, |pos| pos.line());
            AppError::DataLoad(format!("{} line {}: {}", path.display(), line, e))
        })?;
        rows.push((record, parsed));
    }

    Ok((headers, rows))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schedule.csv".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Asset_ID,Date,Usage_Hours,Temperature,Pressure,Failure\n";

    fn write_input(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("input.csv");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(
            dir.path(),
            &format!("{}A1,2025-07-20,500,90,40,1\nA2,2025-07-20,120.5,65,30,0\n", HEADER),
        );

        let readings = load_readings(&path).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].asset_id, "A1");
        assert_eq!(readings[0].usage_hours, 500.0);
        assert_eq!(readings[1].failure, 0);
    }

    #[test]
    fn test_load_keeps_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(
            dir.path(),
            "Site,Asset_ID,Date,Usage_Hours,Temperature,Pressure,Failure\nNorth,A1,2025-07-20,1,2,3,0\n",
        );

        let table = load_table(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(&table.headers()[0], "Site");
        assert_eq!(&table.records()[0][0], "North");
        assert_eq!(table.readings()[0].asset_id, "A1");
    }

    #[test]
    fn test_load_datetime_dates() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = HEADER.to_string();
        for day in 1..=9 {
            body.push_str(&format!("A1,2024-01-0{}T00:00:00,1,2,3,0\n", day));
        }
        let path = write_input(dir.path(), &body);

        let table = load_table(&path).unwrap();
        assert_eq!(table.len(), 9);
        assert_eq!(
            table.readings()[8].date,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 9).unwrap()
        );
        assert_eq!(&table.records()[8][1], "2024-01-09T00:00:00");
    }

    #[test]
    fn test_load_trims_values_but_keeps_raw_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(
            dir.path(),
            "Asset_ID, Date ,Usage_Hours,Temperature,Pressure,Failure\n A1 ,2025-07-20, 120 ,2,3,0\n",
        );

        let table = load_table(&path).unwrap();
        assert_eq!(table.readings()[0].asset_id, "A1");
        assert_eq!(table.readings()[0].usage_hours, 120.0);
        assert_eq!(&table.records()[0][2], " 120 ");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_readings(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(AppError::DataLoad(_))));
    }

    #[test]
    fn test_load_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), "Asset_ID,Date,Usage_Hours,Temperature,Failure\nA1,2025-07-20,1,2,0\n");

        match load_readings(&path) {
            Err(AppError::DataLoad(msg)) => assert!(msg.contains("Pressure")),
            other => panic!("expected DataLoad error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), HEADER);
        assert!(matches!(load_readings(&path), Err(AppError::DataLoad(_))));
    }

    #[test]
    fn test_load_bad_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), &format!("{}A1,not-a-date,1,2,3,0\n", HEADER));
        assert!(matches!(load_readings(&path), Err(AppError::DataLoad(_))));
    }

    #[test]
    fn test_load_duplicate_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(
            dir.path(),
            &format!("{}A1,2025-07-20,1,2,3,0\nA1,2025-07-20,4,5,6,1\n", HEADER),
        );
        assert!(matches!(load_readings(&path), Err(AppError::DataLoad(_))));
    }

    #[test]
    fn test_load_negative_usage() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), &format!("{}A1,2025-07-20,-1,2,3,0\n", HEADER));
        assert!(matches!(load_readings(&path), Err(AppError::DataLoad(_))));
    }

    fn scored_for(table: &SensorTable, prob: f64) -> Vec<ScoredReading> {
        table
            .readings()
            .iter()
            .map(|r| {
                ScoredReading::from_reading(r.clone(), prob)
                    .with_explanation(format!("{}, with a comma", r.asset_id))
            })
            .collect()
    }

    #[test]
    fn test_write_then_load_scored() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), &format!("{}A1,2025-07-20,500,90,40,1\n", HEADER));
        let path = dir.path().join("nested").join("final_schedule.csv");
        let table = load_table(&input).unwrap();
        let rows = scored_for(&table, 0.92);

        write_scored(&path, &table, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some(OUTPUT_COLUMNS.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some("A1,2025-07-20,500,90,40,1,0.92,true,Urgent,\"A1, with a comma\"")
        );
        assert!(!temp_path_for(&path).exists());

        let loaded = load_scored(&path).unwrap();
        assert_eq!(loaded, rows);
    }

    #[test]
    fn test_write_passes_input_columns_through() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "Asset_ID,Date,Usage_Hours,Temperature,Pressure,Failure,Site\n\
             A1,2024-01-01T00:00:00,120,65,30.50,0,North\n",
        );
        let path = dir.path().join("out.csv");
        let table = load_table(&input).unwrap();

        write_scored(&path, &table, &scored_for(&table, 1.0)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "Asset_ID,Date,Usage_Hours,Temperature,Pressure,Failure,Site,\
             Failure_Prob,Predicted_Failure,Priority,Explanation"
        );
        assert!(lines[1].starts_with("A1,2024-01-01T00:00:00,120,65,30.50,0,North,1.0,true,Urgent,"));
    }

    #[test]
    fn test_write_overwrites_existing_score_columns() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "Asset_ID,Date,Priority,Usage_Hours,Temperature,Pressure,Failure\n\
             A1,2025-07-20,stale,1,2,3,0\n",
        );
        let path = dir.path().join("out.csv");
        let table = load_table(&input).unwrap();

        write_scored(&path, &table, &scored_for(&table, 0.1)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "Asset_ID,Date,Priority,Usage_Hours,Temperature,Pressure,Failure,\
             Failure_Prob,Predicted_Failure,Explanation"
        );
        assert!(lines[1].starts_with("A1,2025-07-20,Low,1,2,3,0,0.1,false,"));
    }

    #[test]
    fn test_write_rejects_row_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), &format!("{}A1,2025-07-20,1,2,3,0\n", HEADER));
        let path = dir.path().join("out.csv");
        let table = load_table(&input).unwrap();

        let result = write_scored(&path, &table, &[]);

        assert!(matches!(result, Err(AppError::Persist(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), &format!("{}A1,2025-07-20,1,2,3,0\n", HEADER));
        let path = dir.path().join("out.csv");
        fs::write(&path, "stale").unwrap();
        let table = load_table(&input).unwrap();

        write_scored(&path, &table, &scored_for(&table, 0.3)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&OUTPUT_COLUMNS.join(",")));
        assert!(!content.contains("stale"));
    }
}
