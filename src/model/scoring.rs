//! Scoring adapter: classifier output → probability per row in [0, 1].

use super::{Classifier, RawScores};
use crate::{FraudError, Result};
use ndarray::ArrayView2;

pub fn logistic(score: f64) -> f64 {
    1.0 / (1.0 + (-score).exp())
}

pub struct ScoringAdapter {
    classifier: Box<dyn Classifier>,
}

impl ScoringAdapter {
    pub fn new(classifier: Box<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn name(&self) -> &str {
        self.classifier.name()
    }

    /// `score(aligned_matrix) -> probability_per_row`.
    ///
    /// Native probabilities are used as-is; decision scores go through the logistic function.
    pub fn score(&self, matrix: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        if let Some(expected) = self.classifier.n_features() {
            if matrix.ncols() != expected {
                return Err(FraudError::SchemaMismatch(format!(
                    "model `{}` expects {expected} columns, got {}",
                    self.classifier.name(),
                    matrix.ncols()
                )));
            }
        }

        let raw = self.classifier.raw_scores(matrix)?;
        if raw.len() != matrix.nrows() {
            return Err(FraudError::Model(format!(
                "model `{}` returned {} scores for {} rows",
                self.classifier.name(),
                raw.len(),
                matrix.nrows()
            )));
        }

        let probabilities: Vec<f64> = match raw {
            RawScores::Probabilities(p) => p,
            RawScores::DecisionScores(s) => s.into_iter().map(logistic).collect(),
        };
        if let Some(bad) = probabilities
            .iter()
            .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
        {
            return Err(FraudError::Model(format!(
                "model `{}` produced invalid probability {bad}",
                self.classifier.name()
            )));
        }
        Ok(probabilities)
    }

    /// Probability for a single aligned row.
    pub fn score_one(&self, row: &[f64]) -> Result<f64> {
        let view = ArrayView2::from_shape((1, row.len()), row)
            .map_err(|e| FraudError::SchemaMismatch(e.to_string()))?;
        self.score(view)?
            .into_iter()
            .next()
            .ok_or_else(|| FraudError::Model("empty score vector".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    struct Fixed(RawScores);

    impl Classifier for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn raw_scores(&self, _matrix: ArrayView2<'_, f64>) -> Result<RawScores> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn logistic_reference_points() {
        assert_eq!(logistic(0.0), 0.5);
        assert!(logistic(40.0) > 0.999_999);
        assert!(logistic(-40.0) < 1e-6);
    }

    #[test]
    fn probabilities_pass_through() {
        let adapter = ScoringAdapter::new(Box::new(Fixed(RawScores::Probabilities(vec![0.25]))));
        assert_eq!(adapter.score(array![[1.0, 2.0]].view()).unwrap(), vec![0.25]);
    }

    #[test]
    fn decision_scores_become_probabilities() {
        let adapter =
            ScoringAdapter::new(Box::new(Fixed(RawScores::DecisionScores(vec![0.0, 2.0]))));
        let p = adapter.score(array![[1.0], [2.0]].view()).unwrap();
        assert_eq!(p[0], 0.5);
        assert!((p[1] - 0.880_797_077_977_882_3).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_probability_is_model_error() {
        let adapter = ScoringAdapter::new(Box::new(Fixed(RawScores::Probabilities(vec![1.5]))));
        assert!(matches!(adapter.score_one(&[0.0]), Err(FraudError::Model(_))));
    }

    #[test]
    fn row_count_mismatch_is_model_error() {
        let adapter = ScoringAdapter::new(Box::new(Fixed(RawScores::Probabilities(vec![]))));
        assert!(matches!(adapter.score_one(&[0.0]), Err(FraudError::Model(_))));
    }
}
