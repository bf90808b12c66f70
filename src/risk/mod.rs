//! Probability → label decision at the serving boundary.

mod verdict;

pub use verdict::{percent, FraudLabel, Verdict, DECISION_THRESHOLD};
