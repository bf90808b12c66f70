//! Standard scaling: `(x - mean) / scale`, fit once on the train partition and frozen.

use crate::{FraudError, Result};
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScalerFile", into = "ScalerFile")]
pub struct StandardScaler {
    feature_names_in: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// On-disk shape; validated into [`StandardScaler`].
#[derive(Serialize, Deserialize)]
struct ScalerFile {
    feature_names_in: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl TryFrom<ScalerFile> for StandardScaler {
    type Error = FraudError;

    fn try_from(f: ScalerFile) -> Result<Self> {
        StandardScaler::from_parts(f.feature_names_in, f.mean, f.scale)
    }
}

impl From<StandardScaler> for ScalerFile {
    fn from(s: StandardScaler) -> Self {
        ScalerFile {
            feature_names_in: s.feature_names_in,
            mean: s.mean,
            scale: s.scale,
        }
    }
}

impl StandardScaler {
    pub fn from_parts(feature_names_in: Vec<String>, mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if mean.len() != feature_names_in.len() || scale.len() != feature_names_in.len() {
            return Err(FraudError::SchemaMismatch(format!(
                "scaler has {} names, {} means, {} scales",
                feature_names_in.len(),
                mean.len(),
                scale.len()
            )));
        }
        if mean.iter().chain(&scale).any(|v| !v.is_finite()) || scale.iter().any(|s| *s == 0.0) {
            return Err(FraudError::SchemaMismatch(
                "scaler parameters must be finite with non-zero scale".to_string(),
            ));
        }
        Ok(Self {
            feature_names_in,
            mean,
            scale,
        })
    }

    /// Fit on `rows` (one inner vector per sample, columns in `names` order).
    /// Population standard deviation; constant columns get scale 1.
    pub fn fit(names: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(FraudError::MalformedInput(
                "cannot fit scaler on an empty partition".to_string(),
            ));
        }
        let width = names.len();
        if let Some(bad) = rows.iter().position(|r| r.len() != width) {
            return Err(FraudError::SchemaMismatch(format!(
                "row {bad} has {} values, expected {width}",
                rows[bad].len()
            )));
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; width];
        for row in rows {
            for ((acc, v), m) in var.iter_mut().zip(row).zip(&mean) {
                *acc += (v - m).powi(2);
            }
        }
        let scale = var
            .into_iter()
            .map(|v| {
                let sd = (v / n).sqrt();
                if sd > f64::EPSILON {
                    sd
                } else {
                    1.0
                }
            })
            .collect();

        Self::from_parts(names, mean, scale)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names_in
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if width != self.feature_names_in.len() {
            return Err(FraudError::SchemaMismatch(format!(
                "scaler expects {} columns, got {width}",
                self.feature_names_in.len()
            )));
        }
        Ok(())
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    pub fn inverse_transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| v * s + m)
            .collect())
    }

    /// Column-wise transform of an n × k matrix whose columns follow `feature_names()`.
    pub fn transform(&self, matrix: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_width(matrix.ncols())?;
        let mut out = matrix.to_owned();
        for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (m, s) = (self.mean[j], self.scale[j]);
            col.mapv_inplace(|v| (v - m) / s);
        }
        Ok(out)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| FraudError::artifact(path, e))?;
        serde_json::from_str(&data).map_err(|e| FraudError::artifact(path, e))
    }

    /// The scaler exactly as [`load`](Self::load) will see it after [`save`](Self::save).
    pub fn persisted(&self) -> Result<Self> {
        let text = serde_json::to_string_pretty(self)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
