//! Service configuration. Artifact paths are fixed at startup; a new training run means a restart.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Where the trained artifacts live
    pub artifacts: ArtifactsConfig,
    /// HTTP bind and response policy
    pub server: ServerConfig,
    /// Synthetic account state for the reduced `/predict` request
    pub serving: ServingConfig,
    /// Offline train/validation/test split
    pub split: SplitConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Serialized classifier (`.json`, or `.onnx` with the `onnx` feature)
    pub model_path: PathBuf,
    /// Fitted scaling transform
    pub scaler_path: PathBuf,
    /// Feature schema; `None` selects the built-in `FEATURE_ORDER` layout
    pub schema_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Also signal errors through a non-2xx status (payload shape unchanged)
    pub strict_status: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServingConfig {
    /// `step` value assumed for reduced requests
    pub step: f64,
    /// Originator balance before the transaction
    pub origin_baseline: f64,
    /// Destination balance before the transaction
    pub destination_baseline: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig::default(),
            server: ServerConfig::default(),
            serving: ServingConfig::default(),
            split: SplitConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("artifacts/model.json"),
            scaler_path: PathBuf::from("data/processed/scaler.json"),
            schema_path: Some(PathBuf::from("data/processed/feature_cols.json")),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
            strict_status: false,
        }
    }
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            step: 1.0,
            origin_baseline: 5000.0,
            destination_baseline: 1000.0,
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train: 0.7,
            validation: 0.2,
            test: 0.1,
            seed: 42,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl SplitConfig {
    /// Proportions must be non-negative with a non-empty train share and sum to 1.
    pub fn validate(&self) -> crate::Result<()> {
        let parts = [self.train, self.validation, self.test];
        if parts.iter().any(|p| !p.is_finite() || *p < 0.0) || self.train <= 0.0 {
            return Err(crate::FraudError::MalformedInput(format!(
                "invalid split proportions {:?}",
                parts
            )));
        }
        let total: f64 = parts.iter().sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(crate::FraudError::MalformedInput(format!(
                "split proportions sum to {total}, expected 1.0"
            )));
        }
        Ok(())
    }
}

impl ServiceConfig {
    /// Load from JSON file if present; otherwise return default. A file that exists but
    /// cannot be read or parsed is an error, left to the caller to report once logging is up.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| {
            crate::FraudError::MalformedInput(format!("config {}: {e}", path.display()))
        })
    }
}
