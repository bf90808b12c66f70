//! Linear classifiers exported as coefficients + intercept.

use super::{logistic, Classifier, RawScores};
use crate::{FraudError, Result};
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearKind {
    /// Logistic regression: exposes calibrated probabilities.
    Logistic,
    /// Margin-only model (e.g. linear SVM): exposes a decision score.
    LinearMargin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default = "default_name")]
    pub name: String,
    pub feature_names: Vec<String>,
    pub coef: Vec<f64>,
    pub intercept: f64,
    #[serde(skip, default = "default_kind")]
    kind: LinearKind,
}

fn default_name() -> String {
    "linear".to_string()
}

fn default_kind() -> LinearKind {
    LinearKind::Logistic
}

impl LinearModel {
    pub fn new(
        kind: LinearKind,
        name: impl Into<String>,
        feature_names: Vec<String>,
        coef: Vec<f64>,
        intercept: f64,
    ) -> Result<Self> {
        Self {
            name: name.into(),
            feature_names,
            coef,
            intercept,
            kind,
        }
        .validated(kind)
    }

    /// Check shape and finiteness and fix the output kind (the kind lives in the artifact tag).
    pub(crate) fn validated(mut self, kind: LinearKind) -> Result<Self> {
        if self.coef.len() != self.feature_names.len() {
            return Err(FraudError::Model(format!(
                "linear model `{}` has {} coefficients for {} features",
                self.name,
                self.coef.len(),
                self.feature_names.len()
            )));
        }
        if self.coef.iter().any(|c| !c.is_finite()) || !self.intercept.is_finite() {
            return Err(FraudError::Model(format!(
                "linear model `{}` has non-finite parameters",
                self.name
            )));
        }
        self.kind = kind;
        Ok(self)
    }

    pub fn kind(&self) -> LinearKind {
        self.kind
    }

    pub fn decision(&self, row: ArrayView1<'_, f64>) -> f64 {
        row.iter().zip(&self.coef).map(|(x, w)| x * w).sum::<f64>() + self.intercept
    }
}

impl Classifier for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature_names)
    }

    fn raw_scores(&self, matrix: ArrayView2<'_, f64>) -> Result<RawScores> {
        let scores = matrix.rows().into_iter().map(|r| self.decision(r));
        Ok(match self.kind {
            LinearKind::Logistic => RawScores::Probabilities(scores.map(logistic).collect()),
            LinearKind::LinearMargin => RawScores::DecisionScores(scores.collect()),
        })
    }
}
