//! Fixed-threshold decision. The threshold is not configurable: evaluation may sweep
//! thresholds, serving does not.

use serde::{Deserialize, Serialize};

/// `label = 1` iff `probability >= DECISION_THRESHOLD`.
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FraudLabel {
    Legitimate,
    Fraud,
}

impl FraudLabel {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= DECISION_THRESHOLD {
            FraudLabel::Fraud
        } else {
            FraudLabel::Legitimate
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            FraudLabel::Fraud => "Fraudulent transaction detected!",
            FraudLabel::Legitimate => "Safe transaction detected.",
        }
    }
}

impl From<FraudLabel> for u8 {
    fn from(label: FraudLabel) -> u8 {
        match label {
            FraudLabel::Legitimate => 0,
            FraudLabel::Fraud => 1,
        }
    }
}

impl TryFrom<u8> for FraudLabel {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(FraudLabel::Legitimate),
            1 => Ok(FraudLabel::Fraud),
            other => Err(format!("label must be 0 or 1, got {other}")),
        }
    }
}

/// Probability scaled to 0–100 and rounded to 2 decimals.
pub fn percent(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

/// Result of scoring one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Fraud probability in [0, 1]
    pub probability: f64,
    pub label: FraudLabel,
}

impl Verdict {
    pub fn from_probability(probability: f64) -> Self {
        Self {
            probability,
            label: FraudLabel::from_probability(probability),
        }
    }

    pub fn percent(&self) -> f64 {
        percent(self.probability)
    }

    pub fn message(&self) -> &'static str {
        self.label.message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(FraudLabel::from_probability(0.5), FraudLabel::Fraud);
        assert_eq!(FraudLabel::from_probability(0.499_999), FraudLabel::Legitimate);
    }

    #[test]
    fn percent_rounds_to_two_decimals() {
        assert_eq!(percent(0.123_456), 12.35);
        assert_eq!(percent(1.0), 100.0);
        assert_eq!(percent(0.0), 0.0);
    }

    #[test]
    fn label_serializes_as_integer() {
        let v = Verdict::from_probability(0.9);
        let json = serde_json::to_value(v).unwrap();
        assert_eq!(json["label"], 1);
        assert_eq!(v.message(), "Fraudulent transaction detected!");
    }
}
