//! Summary statistics behind the dashboard views

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};

/// Five-number summary of a sample, as drawn by a box plot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSummary {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

impl BoxSummary {
    /// Summarize a non-empty sample. Quartiles use linear interpolation.
    pub fn from_data(data: &[f64]) -> AnalyticsResult<Self> {
        if data.is_empty() {
            return Err(AnalyticsError::InsufficientData(
                "Cannot summarize an empty sample".to_string(),
            ));
        }

        let mut sorted = data.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        Ok(Self {
            count,
            min: sorted[0],
            q1: percentile(&sorted, 25.0),
            median: percentile(&sorted, 50.0),
            q3: percentile(&sorted, 75.0),
            max: sorted[count - 1],
            mean: sorted.iter().sum::<f64>() / count as f64,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Pearson correlation of two equally long samples.
///
/// `None` when either sample is constant or has fewer than two points,
/// where the coefficient is undefined.
pub fn pearson(x: &[f64], y: &[f64]) -> AnalyticsResult<Option<f64>> {
    if x.len() != y.len() {
        return Err(AnalyticsError::CalculationError(format!(
            "Samples must have the same length ({} vs {})",
            x.len(),
            y.len()
        )));
    }

    if x.len() < 2 {
        return Ok(None);
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;

    for (xi, yi) in x.iter().zip(y) {
        let x_diff = xi - mean_x;
        let y_diff = yi - mean_y;
        numerator += x_diff * y_diff;
        sum_sq_x += x_diff * x_diff;
        sum_sq_y += y_diff * y_diff;
    }

    let denominator = (sum_sq_x * sum_sq_y).sqrt();
    if denominator == 0.0 {
        return Ok(None);
    }

    // Rounding can push |r| a hair past 1
    Ok(Some((numerator / denominator).clamp(-1.0, 1.0)))
}

/// Pairwise Pearson correlations between named columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,

    /// Row-major, `values[i][j]` correlates `columns[i]` with `columns[j]`
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn from_columns(columns: &[(&str, Vec<f64>)]) -> AnalyticsResult<Self> {
        let n = columns.len();
        let mut values = vec![vec![None; n]; n];

        for i in 0..n {
            for j in i..n {
                let r = if i == j {
                    // A column correlates perfectly with itself unless constant
                    pearson(&columns[i].1, &columns[i].1)?.map(|_| 1.0)
                } else {
                    pearson(&columns[i].1, &columns[j].1)?
                };
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Ok(Self {
            columns: columns.iter().map(|(name, _)| name.to_string()).collect(),
            values,
        })
    }

    /// Correlation between two named columns
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

fn percentile(sorted_data: &[f64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower]
    } else {
        let weight = index - lower as f64;
        sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_summary() {
        let summary = BoxSummary::from_data(&[5.0, 1.0, 3.0, 2.0, 4.0]).unwrap();

        assert_eq!(summary.count, 5);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.max, 5.0);
        assert_eq!(summary.mean, 3.0);
        assert_eq!(summary.iqr(), 2.0);
    }

    #[test]
    fn test_box_summary_interpolates() {
        let summary = BoxSummary::from_data(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((summary.median - 2.5).abs() < 1e-12);
        assert!((summary.q1 - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_box_summary_empty() {
        assert!(BoxSummary::from_data(&[]).is_err());
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let up = [2.0, 4.0, 6.0, 8.0, 10.0];
        let down = [5.0, 4.0, 3.0, 2.0, 1.0];

        assert!((pearson(&x, &up).unwrap().unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &down).unwrap().unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &[3.0; 5]).unwrap(), None);
        assert_eq!(pearson(&[1.0], &[2.0]).unwrap(), None);
        assert!(pearson(&x, &down[..3]).is_err());
    }

    #[test]
    fn test_matrix_symmetric_unit_diagonal() {
        let matrix = CorrelationMatrix::from_columns(&[
            ("a", vec![1.0, 2.0, 3.0, 4.0]),
            ("b", vec![2.0, 1.0, 4.0, 3.0]),
            ("c", vec![0.0, 0.0, 1.0, 1.0]),
        ])
        .unwrap();

        for i in 0..3 {
            assert_eq!(matrix.values[i][i], Some(1.0));
            for j in 0..3 {
                assert_eq!(matrix.values[i][j], matrix.values[j][i]);
            }
        }
        assert!((matrix.get("a", "b").unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(matrix.get("a", "missing"), None);
    }

    #[test]
    fn test_matrix_constant_column() {
        let matrix =
            CorrelationMatrix::from_columns(&[("a", vec![1.0, 2.0]), ("flat", vec![0.0, 0.0])])
                .unwrap();

        assert_eq!(matrix.get("a", "a"), Some(1.0));
        assert_eq!(matrix.get("flat", "flat"), None);
        assert_eq!(matrix.get("a", "flat"), None);
    }
}
