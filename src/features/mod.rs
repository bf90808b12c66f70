//! Feature engineering shared by training and serving.
//!
//! Both builders run the same derivation ([`derive_record`]) and the same alignment
//! ([`align`]); they differ only in where the scaler and schema come from. The offline
//! builder fits them, the online builder loads them.

mod derive;
mod offline;
mod online;
mod record;
mod scaler;
mod schema;

pub use derive::{
    align, category_column, derive_record, normalize_category, one_hot, AlignedRow, DerivedRow,
    ENGINEERED_COLUMNS,
};
pub use offline::{BuildOutput, OfflineFeatureBuilder, Partition, RawDataset, SCALER_FILE, SCHEMA_FILE};
pub use online::{build_one, synthetic_record, FeatureArtifacts};
pub use record::{FieldValue, RawRecord};
pub use scaler::StandardScaler;
pub use schema::FeatureSchema;

/// Training label.
pub const LABEL_COLUMN: &str = "isFraud";

/// Categorical field expanded into `type_<CATEGORY>` columns.
pub const TYPE_COLUMN: &str = "type";

pub const TYPE_PREFIX: &str = "type_";

/// Identifier columns, never features.
pub const ID_COLUMNS: [&str; 2] = ["nameOrig", "nameDest"];

/// Fields a training dataset must carry.
pub const REQUIRED_TRAINING_COLUMNS: [&str; 11] = [
    "step",
    "type",
    "amount",
    "oldbalanceOrg",
    "newbalanceOrig",
    "oldbalanceDest",
    "newbalanceDest",
    "isFraud",
    "isFlaggedFraud",
    "nameOrig",
    "nameDest",
];

/// Category universe assumed when no persisted schema names one.
pub const TYPE_CATEGORIES: [&str; 5] = ["CASH_IN", "CASH_OUT", "DEBIT", "PAYMENT", "TRANSFER"];

/// Classifier column order of the built-in layout. Identical to what the offline
/// builder produces for a dataset with the standard columns and all five categories.
pub const FEATURE_ORDER: [&str; 15] = [
    "step",
    "amount",
    "oldbalanceOrg",
    "newbalanceOrig",
    "oldbalanceDest",
    "newbalanceDest",
    "isFlaggedFraud",
    "amount_log",
    "orig_balance_change",
    "dest_balance_change",
    "type_CASH_IN",
    "type_CASH_OUT",
    "type_DEBIT",
    "type_PAYMENT",
    "type_TRANSFER",
];
