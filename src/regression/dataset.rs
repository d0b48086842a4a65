//! Integer regression datasets.
//!
//! Text format: one row per line, values separated by whitespace and/or
//! commas, the last value being the label. Blank lines and lines starting
//! with `#` are skipped. Every row must carry the same number of values.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RegressionError, Result};

/// Feature matrix with a parallel label vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    features: Vec<Vec<i64>>,
    labels: Vec<i64>,
    dim: usize,
}

impl Dataset {
    /// Build a dataset, checking that rows exist and share one dimension.
    pub fn new(features: Vec<Vec<i64>>, labels: Vec<i64>) -> Result<Self> {
        let dim = features.first().map_or(0, Vec::len);
        if features.is_empty() || dim == 0 {
            return Err(load_err("dataset has no rows or no features"));
        }
        if features.len() != labels.len() {
            return Err(load_err(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if let Some(row) = features.iter().position(|r| r.len() != dim) {
            return Err(load_err(format!(
                "row {} has {} features, expected {}",
                row,
                features[row].len(),
                dim
            )));
        }
        Ok(Self {
            features,
            labels,
            dim,
        })
    }

    /// Read and parse a dataset file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| load_err(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    /// Parse the text format
    pub fn parse(text: &str) -> Result<Self> {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        let mut width = None;

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let values = line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|tok| !tok.is_empty())
                .map(|tok| {
                    tok.parse::<i64>().map_err(|_| {
                        load_err(format!("line {}: '{}' is not an integer", lineno + 1, tok))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            if values.len() < 2 {
                return Err(load_err(format!(
                    "line {}: need at least one feature and a label",
                    lineno + 1
                )));
            }
            match width {
                None => width = Some(values.len()),
                Some(w) if w != values.len() => {
                    return Err(load_err(format!(
                        "line {}: {} values, expected {}",
                        lineno + 1,
                        values.len(),
                        w
                    )));
                }
                Some(_) => {}
            }

            if let Some((label, row)) = values.split_last() {
                features.push(row.to_vec());
                labels.push(*label);
            }
        }

        Self::new(features, labels)
    }

    pub fn rows(&self) -> usize {
        self.features.len()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn features(&self) -> &[Vec<i64>] {
        &self.features
    }

    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Values of feature `j` across all rows
    pub fn column(&self, j: usize) -> Vec<i64> {
        self.features.iter().map(|row| row[j]).collect()
    }
}

fn load_err(msg: impl Into<String>) -> RegressionError {
    RegressionError::DatasetLoad(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_separators() {
        let text = "# x1 x2 y\n20 17 -26\n5, 22, 39\n\n8,7,-1\n  24\t23  20\n";
        let ds = Dataset::parse(text).unwrap();
        assert_eq!(ds.rows(), 4);
        assert_eq!(ds.dim(), 2);
        assert_eq!(ds.labels(), &[-26, 39, -1, 20]);
        assert_eq!(ds.column(1), vec![17, 22, 7, 23]);
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        let err = Dataset::parse("1 2 3\n4 5\n").unwrap_err();
        assert!(matches!(err, RegressionError::DatasetLoad(msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Dataset::parse("1 two 3\n").is_err());
        assert!(Dataset::parse("7\n").is_err());
        assert!(Dataset::parse("# only comments\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Dataset::load("/nonexistent/regression.dat").unwrap_err();
        assert!(matches!(err, RegressionError::DatasetLoad(_)));
    }
}
