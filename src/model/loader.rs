//! Classifier artifact loading. JSON artifacts carry a `kind` tag; `.onnx` files need the
//! `onnx` cargo feature.

use super::{Classifier, EnsembleKind, LinearKind, LinearModel, TreeEnsemble};
use crate::{FraudError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Logistic(LinearModel),
    LinearMargin(LinearModel),
    RandomForest(TreeEnsemble),
    GradientBoosting(TreeEnsemble),
}

impl ModelArtifact {
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>> {
        Ok(match self {
            ModelArtifact::Logistic(m) => Box::new(m.validated(LinearKind::Logistic)?),
            ModelArtifact::LinearMargin(m) => Box::new(m.validated(LinearKind::LinearMargin)?),
            ModelArtifact::RandomForest(e) => Box::new(e.validated(EnsembleKind::RandomForest)?),
            ModelArtifact::GradientBoosting(e) => {
                Box::new(e.validated(EnsembleKind::GradientBoosting)?)
            }
        })
    }
}

pub fn load_classifier(path: &Path) -> Result<Box<dyn Classifier>> {
    if !path.exists() {
        return Err(FraudError::artifact(path, "model file not found"));
    }

    let is_onnx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("onnx"));
    if is_onnx {
        return load_onnx(path);
    }

    let data = std::fs::read_to_string(path).map_err(|e| FraudError::artifact(path, e))?;
    let artifact: ModelArtifact =
        serde_json::from_str(&data).map_err(|e| FraudError::artifact(path, e))?;
    let classifier = artifact
        .into_classifier()
        .map_err(|e| FraudError::artifact(path, e))?;
    info!(
        path = %path.display(),
        model = classifier.name(),
        features = ?classifier.n_features(),
        "classifier loaded"
    );
    Ok(classifier)
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path) -> Result<Box<dyn Classifier>> {
    let classifier = super::OnnxClassifier::load(path)?;
    Ok(Box::new(classifier))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path) -> Result<Box<dyn Classifier>> {
    Err(FraudError::artifact(
        path,
        "ONNX models need the `onnx` feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_tagged_linear_margin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("svm.json");
        std::fs::write(
            &path,
            r#"{"kind": "linear_margin", "name": "svm", "feature_names": ["a"], "coef": [2.0], "intercept": -1.0}"#,
        )
        .unwrap();
        let c = load_classifier(&path).unwrap();
        assert_eq!(c.name(), "svm");
        assert_eq!(c.n_features(), Some(1));
    }

    #[test]
    fn missing_model_is_artifact_unavailable() {
        let err = load_classifier(Path::new("/nonexistent/model.json")).err().unwrap();
        assert!(matches!(err, FraudError::ArtifactUnavailable { .. }));
    }

    #[test]
    fn unknown_kind_is_artifact_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        std::fs::write(&path, r#"{"kind": "quantum", "feature_names": []}"#).unwrap();
        let err = load_classifier(&path).err().unwrap();
        assert!(matches!(err, FraudError::ArtifactUnavailable { .. }));
    }
}
