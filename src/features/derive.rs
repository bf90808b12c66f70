//! The single derivation and alignment path used by both builders.
//!
//! raw record → engineered columns → one-hot `type` → scale `numeric_cols` → reorder to `all_columns`.
//! Any change to a formula here changes training and serving together.

use super::{FeatureSchema, RawRecord, StandardScaler, TYPE_COLUMN, TYPE_PREFIX};
use crate::{FraudError, Result};
use ndarray::Array2;

/// Engineered columns, in the order they are appended after the passthrough fields.
pub const ENGINEERED_COLUMNS: [&str; 3] = ["amount_log", "orig_balance_change", "dest_balance_change"];

/// Category matching is case-insensitive and ignores surrounding whitespace.
pub fn normalize_category(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

pub fn category_column(category: &str) -> String {
    format!("{TYPE_PREFIX}{category}")
}

/// One indicator per category in `universe`; at most one is 1.0, all zero when unmatched.
pub fn one_hot(category: Option<&str>, universe: &[String]) -> Vec<f64> {
    let normalized = category.map(normalize_category);
    let mut hit = false;
    universe
        .iter()
        .map(|c| {
            if !hit && normalized.as_deref() == Some(c.as_str()) {
                hit = true;
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

fn is_derived(name: &str) -> bool {
    ENGINEERED_COLUMNS.contains(&name) || name.starts_with(TYPE_PREFIX)
}

/// `[amount_log, orig_balance_change, dest_balance_change]`; absent sources count as 0.0.
fn engineered(record: &RawRecord) -> Result<[f64; 3]> {
    let amount = record.number_or_zero("amount")?;
    let orig = record.number_or_zero("oldbalanceOrg")? - record.number_or_zero("newbalanceOrig")?;
    let dest = record.number_or_zero("oldbalanceDest")? - record.number_or_zero("newbalanceDest")?;
    Ok([amount.ln_1p(), orig, dest])
}

/// Named feature values for one record, in derivation order (not yet scaled or aligned).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedRow {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl DerivedRow {
    fn push(&mut self, name: impl Into<String>, value: f64) {
        self.columns.push(name.into());
        self.values.push(value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i])
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Derive the feature columns of one record.
///
/// `passthrough` lists raw numeric fields carried over as-is (absent → 0.0); names of
/// engineered or one-hot columns in it are skipped, those are always recomputed.
/// `categories` is the one-hot universe.
pub fn derive_record(
    record: &RawRecord,
    passthrough: &[String],
    categories: &[String],
) -> Result<DerivedRow> {
    let mut row = DerivedRow {
        columns: Vec::with_capacity(passthrough.len() + ENGINEERED_COLUMNS.len() + categories.len()),
        values: Vec::with_capacity(passthrough.len() + ENGINEERED_COLUMNS.len() + categories.len()),
    };

    for name in passthrough.iter().filter(|n| !is_derived(n)) {
        row.push(name.as_str(), record.number_or_zero(name)?);
    }
    for (name, value) in ENGINEERED_COLUMNS.iter().zip(engineered(record)?) {
        row.push(*name, value);
    }
    let category = record.text(TYPE_COLUMN);
    for (cat, value) in categories.iter().zip(one_hot(category.as_deref(), categories)) {
        row.push(category_column(cat), value);
    }

    if let Some(i) = row.values.iter().position(|v| !v.is_finite()) {
        return Err(FraudError::MalformedInput(format!(
            "derived column `{}` is not finite ({})",
            row.columns[i], row.values[i]
        )));
    }
    Ok(row)
}

/// A feature row in exactly the schema's `all_columns` order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl AlignedRow {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i])
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// 1 × n matrix for the scoring adapter.
    pub fn to_matrix(&self) -> Array2<f64> {
        Array2::from_shape_fn((1, self.values.len()), |(_, j)| self.values[j])
    }
}

/// Scale `numeric_cols` with the given transform and reorder to `all_columns`.
///
/// Numeric columns missing from `derived` are 0.0 before scaling; any other missing column
/// is 0 after. The scaler must have been fit on exactly `numeric_cols`, in order.
pub fn align(
    derived: &DerivedRow,
    scaler: &StandardScaler,
    schema: &FeatureSchema,
) -> Result<AlignedRow> {
    if scaler.feature_names() != schema.numeric_cols() {
        return Err(FraudError::SchemaMismatch(format!(
            "scaler columns {:?} differ from schema numeric_cols {:?}",
            scaler.feature_names(),
            schema.numeric_cols()
        )));
    }

    let numeric: Vec<f64> = schema
        .numeric_cols()
        .iter()
        .map(|c| derived.get(c).unwrap_or(0.0))
        .collect();
    let scaled = scaler.transform_row(&numeric)?;

    let values = schema
        .all_columns()
        .iter()
        .map(|c| match schema.numeric_index(c) {
            Some(i) => scaled[i],
            None => derived.get(c).unwrap_or(0.0),
        })
        .collect();

    Ok(AlignedRow {
        columns: schema.all_columns().to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> Vec<String> {
        super::super::TYPE_CATEGORIES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn one_hot_normalizes_case() {
        let v = one_hot(Some(" transfer "), &universe());
        assert_eq!(v, vec![0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn one_hot_unknown_is_all_zero() {
        let v = one_hot(Some("unknown_category"), &universe());
        assert!(v.iter().all(|x| *x == 0.0));
        assert!(one_hot(None, &universe()).iter().all(|x| *x == 0.0));
    }

    #[test]
    fn engineered_formulas() {
        let r = RawRecord::new()
            .with("amount", 1500.0)
            .with("oldbalanceOrg", 5000.0)
            .with("newbalanceOrig", 3500.0)
            .with("oldbalanceDest", 1000.0)
            .with("newbalanceDest", 2500.0);
        let row = derive_record(&r, &[], &universe()).unwrap();
        assert!((row.get("amount_log").unwrap() - 1501f64.ln()).abs() < 1e-12);
        assert_eq!(row.get("orig_balance_change"), Some(1500.0));
        assert_eq!(row.get("dest_balance_change"), Some(-1500.0));
    }

    #[test]
    fn passthrough_skips_derived_names_and_defaults_missing() {
        let r = RawRecord::new().with("amount", 10.0).with("amount_log", 999.0);
        let passthrough = vec![
            "amount".to_string(),
            "amount_log".to_string(),
            "isFlaggedFraud".to_string(),
        ];
        let row = derive_record(&r, &passthrough, &[]).unwrap();
        assert_eq!(
            row.columns(),
            &["amount", "isFlaggedFraud", "amount_log", "orig_balance_change", "dest_balance_change"]
        );
        assert_eq!(row.get("isFlaggedFraud"), Some(0.0));
        assert!((row.get("amount_log").unwrap() - 11f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn amount_below_minus_one_is_malformed() {
        let r = RawRecord::new().with("amount", -5.0);
        let err = derive_record(&r, &[], &[]).unwrap_err();
        assert!(matches!(err, FraudError::MalformedInput(_)));
    }

    #[test]
    fn align_orders_and_scales() {
        let schema = FeatureSchema::new(
            vec!["amount".into(), "amount_log".into()],
            vec!["type_A".into(), "amount_log".into(), "extra".into(), "amount".into()],
            vec!["A".into()],
        )
        .unwrap();
        let scaler = StandardScaler::from_parts(
            vec!["amount".into(), "amount_log".into()],
            vec![10.0, 0.0],
            vec![2.0, 1.0],
        )
        .unwrap();
        let r = RawRecord::new().with("amount", 14.0).with("type", "a");
        let derived = derive_record(&r, schema.numeric_cols(), schema.categories()).unwrap();
        let aligned = align(&derived, &scaler, &schema).unwrap();
        assert_eq!(aligned.columns(), schema.all_columns());
        assert_eq!(aligned.get("type_A"), Some(1.0));
        assert_eq!(aligned.get("amount"), Some(2.0));
        assert_eq!(aligned.get("extra"), Some(0.0));
        assert!((aligned.get("amount_log").unwrap() - 15f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn align_rejects_foreign_scaler() {
        let schema = FeatureSchema::new(vec!["a".into()], vec!["a".into()], vec![]).unwrap();
        let scaler = StandardScaler::from_parts(vec!["b".into()], vec![0.0], vec![1.0]).unwrap();
        let derived = derive_record(&RawRecord::new(), schema.numeric_cols(), &[]).unwrap();
        let err = align(&derived, &scaler, &schema).unwrap_err();
        assert!(matches!(err, FraudError::SchemaMismatch(_)));
    }
}
