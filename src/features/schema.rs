//! Persisted feature schema: the single source of truth for classifier column order.

use super::{FEATURE_ORDER, TYPE_CATEGORIES, TYPE_PREFIX};
use crate::{FraudError, Result};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// `numeric_cols ⊆ all_columns`; `all_columns` order is the classifier's input order.
/// One-hot `type_*` columns may be listed as numeric, in which case they are scaled too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaFile", into = "SchemaFile")]
pub struct FeatureSchema {
    numeric_cols: Vec<String>,
    all_columns: Vec<String>,
    categories: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct SchemaFile {
    numeric_cols: Vec<String>,
    all_columns: Vec<String>,
    /// Absent in schemas written before the universe was persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<String>>,
}

impl TryFrom<SchemaFile> for FeatureSchema {
    type Error = FraudError;

    fn try_from(f: SchemaFile) -> Result<Self> {
        let categories = match f.categories {
            Some(c) => c,
            None => f
                .all_columns
                .iter()
                .filter_map(|c| c.strip_prefix(TYPE_PREFIX))
                .map(str::to_string)
                .collect(),
        };
        FeatureSchema::new(f.numeric_cols, f.all_columns, categories)
    }
}

impl From<FeatureSchema> for SchemaFile {
    fn from(s: FeatureSchema) -> Self {
        SchemaFile {
            numeric_cols: s.numeric_cols,
            all_columns: s.all_columns,
            categories: Some(s.categories),
        }
    }
}

fn first_duplicate(items: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    items.iter().find(|c| !seen.insert(c.as_str())).map(String::as_str)
}

impl FeatureSchema {
    pub fn new(
        numeric_cols: Vec<String>,
        all_columns: Vec<String>,
        categories: Vec<String>,
    ) -> Result<Self> {
        for (what, list) in [
            ("all_columns", &all_columns),
            ("numeric_cols", &numeric_cols),
            ("categories", &categories),
        ] {
            if let Some(dup) = first_duplicate(list) {
                return Err(FraudError::SchemaMismatch(format!("duplicate {what} entry `{dup}`")));
            }
        }
        let all: HashSet<&str> = all_columns.iter().map(String::as_str).collect();
        if let Some(missing) = numeric_cols.iter().find(|c| !all.contains(c.as_str())) {
            return Err(FraudError::SchemaMismatch(format!(
                "numeric column `{missing}` is not in all_columns"
            )));
        }
        Ok(Self {
            numeric_cols,
            all_columns,
            categories,
        })
    }

    /// `FEATURE_ORDER` with the fixed five-category universe; `numeric_cols` come from the scaler.
    pub fn builtin(numeric_cols: Vec<String>) -> Result<Self> {
        Self::new(
            numeric_cols,
            FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            TYPE_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn numeric_cols(&self) -> &[String] {
        &self.numeric_cols
    }

    pub fn all_columns(&self) -> &[String] {
        &self.all_columns
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn numeric_index(&self, column: &str) -> Option<usize> {
        self.numeric_cols.iter().position(|c| c == column)
    }

    pub fn width(&self) -> usize {
        self.all_columns.len()
    }

    /// CRC32 over the ordered column names; equal hashes mean an identical layout.
    pub fn layout_hash(&self) -> u32 {
        let mut hasher = Hasher::new();
        for name in &self.all_columns {
            hasher.update(name.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| FraudError::artifact(path, e))?;
        serde_json::from_str(&data).map_err(|e| FraudError::artifact(path, e))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn numeric_must_be_subset() {
        let err = FeatureSchema::new(s(&["a", "z"]), s(&["a", "b"]), vec![]).unwrap_err();
        assert!(matches!(err, FraudError::SchemaMismatch(_)));
    }

    #[test]
    fn duplicates_rejected() {
        assert!(FeatureSchema::new(vec![], s(&["a", "a"]), vec![]).is_err());
    }

    #[test]
    fn legacy_file_recovers_categories() {
        let json = r#"{"numeric_cols": ["amount"], "all_columns": ["amount", "type_PAYMENT", "type_TRANSFER"]}"#;
        let schema: FeatureSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.categories(), &["PAYMENT", "TRANSFER"]);
    }

    #[test]
    fn scaled_category_columns_accepted() {
        let json = r#"{"numeric_cols": ["amount", "type_PAYMENT", "type_TRANSFER"], "all_columns": ["amount", "type_PAYMENT", "type_TRANSFER"]}"#;
        let schema: FeatureSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.categories(), &["PAYMENT", "TRANSFER"]);
        assert_eq!(schema.numeric_index("type_TRANSFER"), Some(2));
    }

    #[test]
    fn builtin_matches_feature_order() {
        let schema = FeatureSchema::builtin(s(&["step", "amount"])).unwrap();
        assert_eq!(schema.width(), FEATURE_ORDER.len());
        assert_eq!(schema.all_columns()[14], "type_TRANSFER");
        assert_eq!(schema.numeric_index("amount"), Some(1));
        assert!(FeatureSchema::builtin(s(&["account_age"])).is_err());
    }

    #[test]
    fn layout_hash_tracks_order() {
        let a = FeatureSchema::new(vec![], s(&["x", "y"]), vec![]).unwrap();
        let b = FeatureSchema::new(vec![], s(&["y", "x"]), vec![]).unwrap();
        assert_eq!(a.layout_hash(), a.clone().layout_hash());
        assert_ne!(a.layout_hash(), b.layout_hash());
    }

    #[test]
    fn save_load_keeps_categories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feature_cols.json");
        let schema = FeatureSchema::new(s(&["a"]), s(&["a", "type_X"]), s(&["X", "Y"])).unwrap();
        schema.save(&path).unwrap();
        assert_eq!(FeatureSchema::load(&path).unwrap(), schema);
    }
}
