//! ONNX Runtime classifiers. Input: [n, d] f32. Output: a probability tensor, [n, 2] or [n].
//!
//! Models must be exported without the zipmap post-processor so probabilities come back as a
//! plain tensor.

use super::{Classifier, RawScores};
use crate::{FraudError, Result};
use ndarray::{Array2, ArrayView2};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct OnnxClassifier {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FraudError::artifact(path, "model file not found"));
        }
        let session = Session::builder()
            .map_err(|e| FraudError::artifact(path, format!("session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| FraudError::artifact(path, format!("optimization level: {e}")))?
            .commit_from_file(path)
            .map_err(|e| FraudError::artifact(path, e))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| FraudError::artifact(path, "model declares no inputs"))?;
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let output_name = pick_probability_output(&output_names)
            .ok_or_else(|| FraudError::artifact(path, "model declares no probability output"))?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx")
            .to_string();
        info!(path = %path.display(), input = %input_name, output = %output_name, "ONNX model loaded");

        Ok(Self {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

/// Prefer an output named like `probabilities`; otherwise the first one that is not the label.
fn pick_probability_output(names: &[String]) -> Option<String> {
    names
        .iter()
        .find(|n| n.to_ascii_lowercase().contains("prob"))
        .or_else(|| names.iter().find(|n| !n.to_ascii_lowercase().contains("label")))
        .cloned()
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn raw_scores(&self, matrix: ArrayView2<'_, f64>) -> Result<RawScores> {
        let n = matrix.nrows();
        let input: Array2<f32> = matrix.mapv(|v| v as f32);
        let tensor = Tensor::from_array(input).map_err(|e| FraudError::Model(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| FraudError::Model("ONNX session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| FraudError::Model(format!("inference failed: {e}")))?;
        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| FraudError::Model(format!("missing output `{}`", self.output_name)))?;
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| FraudError::Model(format!("unexpected output tensor: {e}")))?;

        // [n, k]: the fraud class is column 1; [n] or [n, 1]: already the fraud probability.
        let cols = match shape.len() {
            2 => usize::try_from(shape[1]).unwrap_or(0),
            _ => 1,
        };
        if cols == 0 || data.len() != n * cols {
            return Err(FraudError::Model(format!(
                "output of {} values does not match {n} rows",
                data.len()
            )));
        }
        let column = if cols >= 2 { 1 } else { 0 };
        let probabilities = (0..n).map(|r| f64::from(data[r * cols + column])).collect();
        Ok(RawScores::Probabilities(probabilities))
    }
}
