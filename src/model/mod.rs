//! Classifiers behind one capability, and the adapter that turns their output into
//! fraud probabilities.

mod ensemble;
mod linear;
mod loader;
#[cfg(feature = "onnx")]
mod onnx;
mod scoring;

pub use ensemble::{EnsembleKind, Node, Tree, TreeEnsemble};
pub use linear::{LinearKind, LinearModel};
pub use loader::{load_classifier, ModelArtifact};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
pub use scoring::{logistic, ScoringAdapter};

use crate::Result;
use ndarray::ArrayView2;

/// What a classifier natively produces for each row.
#[derive(Debug, Clone, PartialEq)]
pub enum RawScores {
    /// Calibrated probability of the fraud class.
    Probabilities(Vec<f64>),
    /// Unbounded decision score; larger means more likely fraud.
    DecisionScores(Vec<f64>),
}

impl RawScores {
    pub fn len(&self) -> usize {
        match self {
            RawScores::Probabilities(v) | RawScores::DecisionScores(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fitted classifier. Implementations are immutable after load and shared across requests.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// Column names the model was trained on, when the artifact records them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Expected input width, when known.
    fn n_features(&self) -> Option<usize> {
        self.feature_names().map(<[String]>::len)
    }

    /// Score an n × d matrix whose columns are in training order.
    fn raw_scores(&self, matrix: ArrayView2<'_, f64>) -> Result<RawScores>;
}
