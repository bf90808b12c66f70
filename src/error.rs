//! Error taxonomy shared by the offline builder, the online builder and the serving boundary.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, FraudError>;

#[derive(Debug, thiserror::Error)]
pub enum FraudError {
    /// Model, scaler or schema could not be loaded (or failed a startup consistency check).
    #[error("artifact unavailable: {path}: {reason}")]
    ArtifactUnavailable { path: PathBuf, reason: String },

    /// Required field missing or of the wrong type.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Columns that cannot be lined up with the persisted schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FraudError {
    pub fn artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        FraudError::ArtifactUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-friendly tag, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FraudError::ArtifactUnavailable { .. } => "artifact_unavailable",
            FraudError::MalformedInput(_) => "malformed_input",
            FraudError::SchemaMismatch(_) => "schema_mismatch",
            FraudError::Model(_) => "model",
            FraudError::Io(_) => "io",
            FraudError::Csv(_) => "csv",
            FraudError::Json(_) => "json",
        }
    }
}
