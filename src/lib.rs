//! Transaction fraud scoring.
//!
//! - [`features`]: shared column derivation, the offline (training) and online (serving)
//!   feature builders, the persisted scaler and schema
//! - [`model`]: classifier variants behind one capability, and the scoring adapter
//! - [`risk`]: fixed-threshold verdict
//! - [`artifacts`]: classifier + scaler + schema loaded together and cross-checked
//! - [`server`]: HTTP boundary (`/`, `/health`, `/predict`)
//! - [`logging`]: structured logging

pub mod artifacts;
pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod risk;
pub mod server;

pub use artifacts::Artifacts;
pub use config::ServiceConfig;
pub use error::{FraudError, Result};
pub use features::{FeatureArtifacts, OfflineFeatureBuilder, RawRecord};
pub use logging::StructuredLogger;
pub use model::{Classifier, ScoringAdapter};
pub use risk::{FraudLabel, Verdict};
pub use server::AppContext;
