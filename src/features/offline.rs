//! Offline feature builder: labelled history → engineered, scaled partitions plus the
//! scaler and schema the online builder will load.

use super::{
    align, category_column, derive_record, normalize_category, DerivedRow, FeatureSchema,
    RawRecord, StandardScaler, ID_COLUMNS, LABEL_COLUMN, REQUIRED_TRAINING_COLUMNS, TYPE_COLUMN,
};
use crate::config::SplitConfig;
use crate::{FraudError, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub const SCALER_FILE: &str = "scaler.json";
pub const SCHEMA_FILE: &str = "feature_cols.json";

/// Tabular raw history: header order plus one record per row.
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    columns: Vec<String>,
    records: Vec<RawRecord>,
}

fn is_text_column(name: &str) -> bool {
    name == TYPE_COLUMN || ID_COLUMNS.contains(&name)
}

impl RawDataset {
    pub fn new(columns: Vec<String>, records: Vec<RawRecord>) -> Self {
        Self { columns, records }
    }

    /// Parse CSV with a header row. `type` and identifier columns stay text, every other
    /// non-empty cell must parse as a number; empty cells are left absent.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut records = Vec::new();
        for (i, row) in rdr.records().enumerate() {
            let row = row?;
            let mut record = RawRecord::new();
            for (name, cell) in columns.iter().zip(row.iter()) {
                let cell = cell.trim();
                if cell.is_empty() {
                    continue;
                }
                if is_text_column(name) {
                    record.insert(name.as_str(), cell);
                } else {
                    let v: f64 = cell.parse().map_err(|_| {
                        FraudError::MalformedInput(format!(
                            "row {}: column `{name}` value {cell:?} is not numeric",
                            i + 1
                        ))
                    })?;
                    record.insert(name.as_str(), v);
                }
            }
            records.push(record);
        }
        Ok(Self { columns, records })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One split of the engineered dataset; rows follow the schema's `all_columns`.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub name: &'static str,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn fraud_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|l| **l == 1).count() as f64 / self.labels.len() as f64
    }

    pub fn matrix(&self, width: usize) -> Result<Array2<f64>> {
        let flat: Vec<f64> = self.rows.iter().flatten().copied().collect();
        Array2::from_shape_vec((self.rows.len(), width), flat)
            .map_err(|e| FraudError::SchemaMismatch(format!("partition {}: {e}", self.name)))
    }

    /// Features in `columns` order followed by the label column.
    pub fn write_csv(&self, path: &Path, columns: &[String]) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(columns.iter().map(String::as_str).chain([LABEL_COLUMN]))?;
        for (row, label) in self.rows.iter().zip(&self.labels) {
            wtr.write_record(
                row.iter()
                    .map(|v| v.to_string())
                    .chain(std::iter::once(label.to_string())),
            )?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// `build(raw_dataset) -> (engineered_dataset, schema, scaler)`.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub train: Partition,
    pub validation: Partition,
    pub test: Partition,
    pub schema: FeatureSchema,
    pub scaler: StandardScaler,
}

impl BuildOutput {
    /// Writes `train.csv`, `val.csv`, `test.csv`, `scaler.json`, `feature_cols.json`.
    pub fn persist(&self, out_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(out_dir)?;
        for part in [&self.train, &self.validation, &self.test] {
            part.write_csv(&out_dir.join(format!("{}.csv", part.name)), self.schema.all_columns())?;
        }
        self.scaler.save(&out_dir.join(SCALER_FILE))?;
        self.schema.save(&out_dir.join(SCHEMA_FILE))?;
        info!(out_dir = %out_dir.display(), "offline artifacts written");
        Ok(())
    }
}

pub struct OfflineFeatureBuilder {
    split: SplitConfig,
}

impl OfflineFeatureBuilder {
    pub fn new(split: SplitConfig) -> Self {
        Self { split }
    }

    pub fn build(&self, dataset: &RawDataset) -> Result<BuildOutput> {
        self.split.validate()?;
        if let Some(missing) = REQUIRED_TRAINING_COLUMNS
            .iter()
            .find(|c| !dataset.columns().iter().any(|h| h == *c))
        {
            return Err(FraudError::MalformedInput(format!(
                "training data is missing column `{missing}`"
            )));
        }
        if dataset.is_empty() {
            return Err(FraudError::MalformedInput("training data has no rows".to_string()));
        }

        // Raw numeric columns keep their header order; engineered and one-hot columns follow.
        let passthrough: Vec<String> = dataset
            .columns()
            .iter()
            .filter(|c| !is_text_column(c) && c.as_str() != LABEL_COLUMN)
            .cloned()
            .collect();

        // Universe = categories actually present, sorted.
        let categories: Vec<String> = dataset
            .records()
            .iter()
            .filter_map(|r| r.text(TYPE_COLUMN))
            .map(|t| normalize_category(&t))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut derived: Vec<DerivedRow> = Vec::with_capacity(dataset.len());
        let mut labels: Vec<u8> = Vec::with_capacity(dataset.len());
        for (i, record) in dataset.records().iter().enumerate() {
            labels.push(parse_label(record, i)?);
            let row = derive_record(record, &passthrough, &categories).map_err(|e| match e {
                FraudError::MalformedInput(msg) => {
                    FraudError::MalformedInput(format!("row {}: {msg}", i + 1))
                }
                other => other,
            })?;
            derived.push(row);
        }

        let all_columns = derived[0].columns().to_vec();
        let category_cols: Vec<String> = categories.iter().map(|c| category_column(c)).collect();
        let numeric_cols: Vec<String> = all_columns
            .iter()
            .filter(|c| !category_cols.contains(c))
            .cloned()
            .collect();
        let schema = FeatureSchema::new(numeric_cols, all_columns, categories)?;

        let [train_idx, val_idx, test_idx] = stratified_split(&labels, &self.split);
        debug!(
            train = train_idx.len(),
            validation = val_idx.len(),
            test = test_idx.len(),
            "stratified split"
        );

        // Fit on the train partition only, then apply the frozen transform everywhere.
        let train_numeric: Vec<Vec<f64>> = train_idx
            .iter()
            .map(|&i| {
                schema
                    .numeric_cols()
                    .iter()
                    .map(|c| derived[i].get(c).unwrap_or(0.0))
                    .collect()
            })
            .collect();
        // Partitions are scaled with the persisted form so serving reproduces them bit for bit.
        let scaler = StandardScaler::fit(schema.numeric_cols().to_vec(), &train_numeric)?.persisted()?;

        let partition = |name: &'static str, idx: &[usize]| -> Result<Partition> {
            let rows = idx
                .iter()
                .map(|&i| align(&derived[i], &scaler, &schema).map(|r| r.into_values()))
                .collect::<Result<Vec<_>>>()?;
            Ok(Partition {
                name,
                rows,
                labels: idx.iter().map(|&i| labels[i]).collect(),
            })
        };
        let train = partition("train", &train_idx)?;
        let validation = partition("val", &val_idx)?;
        let test = partition("test", &test_idx)?;

        info!(
            rows = dataset.len(),
            features = schema.width(),
            numeric = schema.numeric_cols().len(),
            categories = ?schema.categories(),
            train_fraud_rate = train.fraud_rate(),
            "feature build complete"
        );

        Ok(BuildOutput {
            train,
            validation,
            test,
            schema,
            scaler,
        })
    }

    /// Read raw CSV, build, and persist everything into `out_dir`.
    pub fn build_csv(&self, input: &Path, out_dir: &Path) -> Result<BuildOutput> {
        let dataset = RawDataset::from_path(input)?;
        info!(input = %input.display(), rows = dataset.len(), "raw dataset loaded");
        let output = self.build(&dataset)?;
        output.persist(out_dir)?;
        Ok(output)
    }
}

fn parse_label(record: &RawRecord, row: usize) -> Result<u8> {
    match record.number(LABEL_COLUMN)? {
        Some(v) if v == 0.0 => Ok(0),
        Some(v) if v == 1.0 => Ok(1),
        other => Err(FraudError::MalformedInput(format!(
            "row {}: `{LABEL_COLUMN}` must be 0 or 1, got {other:?}",
            row + 1
        ))),
    }
}

/// Per-class shuffle and allocation, so every partition keeps the class ratio.
fn stratified_split(labels: &[u8], split: &SplitConfig) -> [Vec<usize>; 3] {
    let mut rng = StdRng::seed_from_u64(split.seed);
    let mut parts: [Vec<usize>; 3] = Default::default();

    for class in [0u8, 1] {
        let mut idx: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == class)
            .map(|(i, _)| i)
            .collect();
        idx.shuffle(&mut rng);

        let n = idx.len();
        let n_train = (((n as f64) * split.train).round() as usize).min(n);
        let n_val = if split.test == 0.0 {
            n - n_train
        } else {
            (((n as f64) * split.validation).round() as usize).min(n - n_train)
        };
        parts[0].extend_from_slice(&idx[..n_train]);
        parts[1].extend_from_slice(&idx[n_train..n_train + n_val]);
        parts[2].extend_from_slice(&idx[n_train + n_val..]);
    }

    for part in parts.iter_mut() {
        part.shuffle(&mut rng);
    }
    parts
}
