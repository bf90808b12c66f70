//! Online feature builder: one partial record → one aligned row, using persisted artifacts only.

use super::{align, derive_record, AlignedRow, FeatureSchema, RawRecord, StandardScaler};
use crate::config::ServingConfig;
use crate::{FraudError, Result};
use std::path::Path;

/// Scaler and schema loaded together and checked against each other once.
#[derive(Debug, Clone)]
pub struct FeatureArtifacts {
    scaler: StandardScaler,
    schema: FeatureSchema,
}

impl FeatureArtifacts {
    pub fn new(scaler: StandardScaler, schema: FeatureSchema) -> Result<Self> {
        if scaler.feature_names() != schema.numeric_cols() {
            return Err(FraudError::SchemaMismatch(format!(
                "scaler was fit on {:?} but schema numeric_cols are {:?}",
                scaler.feature_names(),
                schema.numeric_cols()
            )));
        }
        Ok(Self { scaler, schema })
    }

    /// Load from disk. Without a schema path the built-in layout is used, with the
    /// scaler's fitted columns as `numeric_cols`.
    pub fn load(scaler_path: &Path, schema_path: Option<&Path>) -> Result<Self> {
        let scaler = StandardScaler::load(scaler_path)?;
        let schema = match schema_path {
            Some(path) => FeatureSchema::load(path)?,
            None => FeatureSchema::builtin(scaler.feature_names().to_vec())
                .map_err(|e| FraudError::artifact(scaler_path, e))?,
        };
        let origin = schema_path.unwrap_or(scaler_path);
        Self::new(scaler, schema).map_err(|e| FraudError::artifact(origin, e))
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn build_one(&self, record: &RawRecord) -> Result<AlignedRow> {
        let derived = derive_record(record, self.schema.numeric_cols(), self.schema.categories())?;
        align(&derived, &self.scaler, &self.schema)
    }
}

/// `build_one(record, scaler, schema) -> aligned_row`. Never refits; the scaler is applied as loaded.
pub fn build_one(
    record: &RawRecord,
    scaler: &StandardScaler,
    schema: &FeatureSchema,
) -> Result<AlignedRow> {
    let derived = derive_record(record, schema.numeric_cols(), schema.categories())?;
    align(&derived, scaler, schema)
}

/// Full record for a reduced `{type, amount}` request, with synthetic balances:
/// the originator pays `amount` out of its baseline (floored at 0), the destination receives it.
pub fn synthetic_record(tx_type: &str, amount: f64, serving: &ServingConfig) -> Result<RawRecord> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(FraudError::MalformedInput(format!(
            "amount must be a non-negative number, got {amount}"
        )));
    }
    Ok(RawRecord::new()
        .with("step", serving.step)
        .with("type", tx_type)
        .with("amount", amount)
        .with("oldbalanceOrg", serving.origin_baseline)
        .with("newbalanceOrig", (serving.origin_baseline - amount).max(0.0))
        .with("oldbalanceDest", serving.destination_baseline)
        .with("newbalanceDest", serving.destination_baseline + amount)
        .with("isFlaggedFraud", 0.0))
}
