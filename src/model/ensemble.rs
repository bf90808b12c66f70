//! Tree ensembles exported as flat node arrays.
//!
//! A split sends `x[feature] <= threshold` left. Children always have a larger index than
//! their parent, so evaluation terminates.

use super::{Classifier, RawScores};
use crate::{FraudError, Result};
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsembleKind {
    /// Leaves hold fraud probabilities; trees are averaged.
    RandomForest,
    /// Leaves hold margins; trees are summed onto `base_score`.
    GradientBoosting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {i} splits on feature {feature} of {n_features}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i} has a non-finite threshold"));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!("node {i} has invalid child {child}"));
                        }
                    }
                }
                Node::Leaf { value } if !value.is_finite() => {
                    return Err(format!("leaf {i} is not finite"));
                }
                Node::Leaf { .. } => {}
            }
        }
        Ok(())
    }

    pub fn leaf_value(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut i = 0;
        loop {
            match &self.nodes[i] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    i = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default = "default_name")]
    pub name: String,
    pub feature_names: Vec<String>,
    pub trees: Vec<Tree>,
    /// Added to the summed margins of a boosted ensemble.
    #[serde(default)]
    pub base_score: f64,
    #[serde(skip, default = "default_kind")]
    kind: EnsembleKind,
}

fn default_name() -> String {
    "ensemble".to_string()
}

fn default_kind() -> EnsembleKind {
    EnsembleKind::RandomForest
}

impl TreeEnsemble {
    pub fn new(
        kind: EnsembleKind,
        name: impl Into<String>,
        feature_names: Vec<String>,
        trees: Vec<Tree>,
        base_score: f64,
    ) -> Result<Self> {
        Self {
            name: name.into(),
            feature_names,
            trees,
            base_score,
            kind,
        }
        .validated(kind)
    }

    pub(crate) fn validated(mut self, kind: EnsembleKind) -> Result<Self> {
        if self.trees.is_empty() {
            return Err(FraudError::Model(format!("ensemble `{}` has no trees", self.name)));
        }
        if !self.base_score.is_finite() {
            return Err(FraudError::Model(format!("ensemble `{}` has a non-finite base score", self.name)));
        }
        let width = self.feature_names.len();
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(width)
                .map_err(|e| FraudError::Model(format!("ensemble `{}` tree {t}: {e}", self.name)))?;
        }
        self.kind = kind;
        Ok(self)
    }

    pub fn kind(&self) -> EnsembleKind {
        self.kind
    }
}

impl Classifier for TreeEnsemble {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature_names)
    }

    fn raw_scores(&self, matrix: ArrayView2<'_, f64>) -> Result<RawScores> {
        let n_trees = self.trees.len() as f64;
        let sums = matrix
            .rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.leaf_value(row)).sum::<f64>());
        Ok(match self.kind {
            EnsembleKind::RandomForest => {
                RawScores::Probabilities(sums.map(|s| (s / n_trees).clamp(0.0, 1.0)).collect())
            }
            EnsembleKind::GradientBoosting => {
                RawScores::DecisionScores(sums.map(|s| s + self.base_score).collect())
            }
        })
    }
}
