use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, StemError};

/// Number of candidate features drawn at every split.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    All,
    Fraction(f64),
    Count(usize),
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` columns, clamped to `1..=n_features`.
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match *self {
            MaxFeatures::Sqrt => n.sqrt() as usize,
            MaxFeatures::Log2 => n.log2() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fraction(f) => (f * n) as usize,
            MaxFeatures::Count(c) => c,
        };
        k.clamp(1, n_features.max(1))
    }
}

impl FromStr for MaxFeatures {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "log2" => Ok(MaxFeatures::Log2),
            "all" | "none" => Ok(MaxFeatures::All),
            other => {
                if let Ok(count) = other.parse::<usize>() {
                    Ok(MaxFeatures::Count(count))
                } else if let Ok(fraction) = other.parse::<f64>() {
                    Ok(MaxFeatures::Fraction(fraction))
                } else {
                    Err(format!(
                        "Unknown max_features: {}. Expected sqrt, log2, all, a count, or a fraction",
                        s
                    ))
                }
            }
        }
    }
}

/// Per-class sample weighting applied while growing trees.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    /// `n_samples / (n_classes * count_c)`, so minority-class errors cost more.
    Balanced,
    None,
}

/// Hyper-parameters of the random forest.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub class_weight: ClassWeight,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            class_weight: ClassWeight::Balanced,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(StemError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(StemError::InvalidConfig(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(StemError::InvalidConfig(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(StemError::InvalidConfig(
                "max_depth must be at least 1 when set".to_string(),
            ));
        }
        if let MaxFeatures::Fraction(f) = self.max_features {
            if !(f > 0.0 && f <= 1.0) {
                return Err(StemError::InvalidConfig(format!(
                    "max_features fraction must be in (0, 1], got {}",
                    f
                )));
            }
        }
        Ok(())
    }
}
