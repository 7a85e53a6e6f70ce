//! Labeled CSV datasets for emergency retraining.

use std::collections::HashSet;
use std::path::Path;

use super::ModelError;

/// Raw labeled training data: binary feature columns followed by a label column.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f32>>,
    pub labels: Vec<String>,
}

impl LabeledDataset {
    /// Read a CSV whose header names the feature columns and whose last
    /// non-blank column is the label. Trailing blank header columns (export
    /// artifacts) are ignored; malformed rows are skipped.
    pub fn from_csv(path: &Path) -> Result<Self, ModelError> {
        let dataset_err = |message: String| ModelError::Dataset {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| dataset_err(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| dataset_err(e.to_string()))?
            .clone();

        let columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (i, h.trim().to_string()))
            .filter(|(_, h)| !h.is_empty())
            .collect();
        let Some(((label_col, _), feature_cols)) = columns.split_last() else {
            return Err(dataset_err("header row is empty".into()));
        };
        if feature_cols.is_empty() {
            return Err(dataset_err("no feature columns before the label".into()));
        }

        // A repeated header keeps its first column; later copies are dropped
        // so the model width always equals the feature list length.
        let mut feature_cols: Vec<(usize, String)> = feature_cols.to_vec();
        let before = feature_cols.len();
        let mut seen = HashSet::new();
        feature_cols.retain(|(_, h)| seen.insert(h.clone()));
        if feature_cols.len() < before {
            tracing::warn!(
                path = %path.display(),
                dropped = before - feature_cols.len(),
                "Dropped repeated feature columns"
            );
        }

        let feature_names: Vec<String> = feature_cols.iter().map(|(_, h)| h.clone()).collect();
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        let mut skipped = 0usize;

        for record in reader.records() {
            let Ok(record) = record else {
                skipped += 1;
                continue;
            };
            let label = record.get(*label_col).map(str::trim).unwrap_or_default();
            if label.is_empty() {
                skipped += 1;
                continue;
            }

            let parsed: Option<Vec<f32>> = feature_cols
                .iter()
                .map(|(i, _)| {
                    record
                        .get(*i)
                        .and_then(|v| v.trim().parse::<f32>().ok())
                        .map(|v| if v != 0.0 { 1.0 } else { 0.0 })
                })
                .collect();

            match parsed {
                Some(row) => {
                    rows.push(row);
                    labels.push(label.to_string());
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!(path = %path.display(), skipped, "Skipped malformed dataset rows");
        }
        if rows.is_empty() {
            return Err(dataset_err("no usable rows".into()));
        }

        Ok(Self {
            feature_names,
            rows,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
