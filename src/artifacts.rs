//! Everything a scoring call needs, loaded once at startup and read-only afterwards.

use crate::config::ArtifactsConfig;
use crate::features::{FeatureArtifacts, RawRecord};
use crate::model::{load_classifier, ScoringAdapter};
use crate::risk::Verdict;
use crate::{FraudError, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::info;

/// SHA-256 of one artifact file, so operators can tell which training run is live.
#[derive(Debug, Clone)]
pub struct ArtifactDigest {
    pub path: PathBuf,
    pub sha256: String,
}

impl ArtifactDigest {
    pub fn of(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| FraudError::artifact(path, e))?;
        let sha256 = Sha256::digest(&bytes)
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        Ok(Self {
            path: path.to_path_buf(),
            sha256,
        })
    }
}

pub struct Artifacts {
    scorer: ScoringAdapter,
    features: FeatureArtifacts,
    digests: Vec<ArtifactDigest>,
}

impl Artifacts {
    pub fn new(scorer: ScoringAdapter, features: FeatureArtifacts) -> Result<Self> {
        check_classifier_layout(&scorer, &features)
            .map_err(|reason| FraudError::ArtifactUnavailable {
                path: PathBuf::from(scorer.name()),
                reason,
            })?;
        Ok(Self {
            scorer,
            features,
            digests: Vec::new(),
        })
    }

    /// Load classifier, scaler and schema; any failure (including a layout disagreement
    /// between them) is `ArtifactUnavailable`.
    pub fn load(config: &ArtifactsConfig) -> Result<Self> {
        let features = FeatureArtifacts::load(&config.scaler_path, config.schema_path.as_deref())?;
        let classifier = load_classifier(&config.model_path)?;
        let scorer = ScoringAdapter::new(classifier);
        check_classifier_layout(&scorer, &features)
            .map_err(|reason| FraudError::artifact(&config.model_path, reason))?;

        let mut digests = vec![
            ArtifactDigest::of(&config.model_path)?,
            ArtifactDigest::of(&config.scaler_path)?,
        ];
        if let Some(schema_path) = &config.schema_path {
            digests.push(ArtifactDigest::of(schema_path)?);
        }
        for d in &digests {
            info!(path = %d.path.display(), sha256 = %d.sha256, "artifact digest");
        }
        info!(
            model = scorer.name(),
            columns = features.schema().width(),
            layout_hash = %format!("{:08x}", features.schema().layout_hash()),
            "artifacts loaded"
        );

        Ok(Self {
            scorer,
            features,
            digests,
        })
    }

    pub fn scorer(&self) -> &ScoringAdapter {
        &self.scorer
    }

    pub fn features(&self) -> &FeatureArtifacts {
        &self.features
    }

    pub fn digests(&self) -> &[ArtifactDigest] {
        &self.digests
    }

    pub fn model_name(&self) -> &str {
        self.scorer.name()
    }

    pub fn layout_hash(&self) -> u32 {
        self.features.schema().layout_hash()
    }

    /// One complete record → verdict. Identifier fields are ignored by the builder.
    pub fn predict_record(&self, record: &RawRecord) -> Result<Verdict> {
        let row = self.features.build_one(record)?;
        let probability = self.scorer.score_one(row.values())?;
        Ok(Verdict::from_probability(probability))
    }
}

fn check_classifier_layout(
    scorer: &ScoringAdapter,
    features: &FeatureArtifacts,
) -> std::result::Result<(), String> {
    let columns = features.schema().all_columns();
    let classifier = scorer.classifier();
    if let Some(names) = classifier.feature_names() {
        if names != columns {
            return Err(format!(
                "model `{}` was trained on {names:?} but the schema lists {columns:?}",
                classifier.name()
            ));
        }
    } else if let Some(n) = classifier.n_features() {
        if n != columns.len() {
            return Err(format!(
                "model `{}` expects {n} columns but the schema lists {}",
                classifier.name(),
                columns.len()
            ));
        }
    }
    Ok(())
}
