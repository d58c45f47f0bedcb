//! Training configuration.
//!
//! A JSON file with camel-cased keys; every key is optional and falls back
//! to the documented default. Unknown keys are ignored, wrong types are
//! decode errors.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use predictext_base::{PredictError, Result};
use predictext_lexicon::CasePolicy;
use predictext_ngram::{PruningMethod, SmoothingConfig};

/// Pruning method selector, as spelled in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PruningMethodName {
    None,
    RawCount,
    OrderCount,
    WeightedDifferenceRawProb,
    WeightedDifferenceFullProb,
}

/// All recognized training options.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrainingConfiguration {
    pub ngram_order: usize,
    pub upper_case_replacement_threshold: f64,
    pub convert_case_from_dictionary_model_threshold: f64,
    pub unknown_word_count_threshold: u64,
    pub directly_valid_word_count_threshold: u64,
    pub pruning_method: PruningMethodName,
    pub ngram_pruning_count_threshold: u64,
    pub ngram_pruning_order_count_thresholds: Vec<i64>,
    pub ngram_pruning_weighted_difference_threshold: f64,
    pub smoothing_discount_value: f64,
    pub smoothing_discount_value_lower_bound: f64,
    pub smoothing_discount_value_upper_bound: f64,
    pub base_word_dictionary_path: Option<PathBuf>,
    pub stop_word_dictionary_path: Option<PathBuf>,
}

impl Default for TrainingConfiguration {
    fn default() -> Self {
        TrainingConfiguration {
            ngram_order: 4,
            upper_case_replacement_threshold: 0.35,
            convert_case_from_dictionary_model_threshold: 1e-8,
            unknown_word_count_threshold: 0,
            directly_valid_word_count_threshold: 20,
            pruning_method: PruningMethodName::OrderCount,
            ngram_pruning_count_threshold: 2,
            ngram_pruning_order_count_thresholds: vec![-1, 2, 3, 4],
            ngram_pruning_weighted_difference_threshold: 1e-4,
            smoothing_discount_value: -1.0,
            smoothing_discount_value_lower_bound: 0.1,
            smoothing_discount_value_upper_bound: 1.0,
            base_word_dictionary_path: None,
            stop_word_dictionary_path: None,
        }
    }
}

impl TrainingConfiguration {
    /// Reads a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: TrainingConfiguration = serde_json::from_reader(reader)
            .map_err(|e| PredictError::Decode(format!("training configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ngram_order < 1 {
            return Err(PredictError::InvalidArgument(format!(
                "ngramOrder must be at least 1, got {}",
                self.ngram_order
            )));
        }
        Ok(())
    }

    pub fn case_policy(&self) -> CasePolicy {
        CasePolicy {
            upper_case_replacement_threshold: self.upper_case_replacement_threshold,
            convert_case_from_dictionary_threshold: self
                .convert_case_from_dictionary_model_threshold,
            unknown_word_count_threshold: self.unknown_word_count_threshold,
            directly_valid_word_count_threshold: self.directly_valid_word_count_threshold,
        }
    }

    pub fn smoothing(&self) -> SmoothingConfig {
        SmoothingConfig {
            discount_value: self.smoothing_discount_value,
            lower_bound: self.smoothing_discount_value_lower_bound,
            upper_bound: self.smoothing_discount_value_upper_bound,
        }
    }

    pub fn pruning(&self) -> PruningMethod {
        match self.pruning_method {
            PruningMethodName::None => PruningMethod::None,
            PruningMethodName::RawCount => PruningMethod::RawCount {
                threshold: self.ngram_pruning_count_threshold,
            },
            PruningMethodName::OrderCount => PruningMethod::OrderCount {
                thresholds: self.ngram_pruning_order_count_thresholds.clone(),
            },
            PruningMethodName::WeightedDifferenceRawProb => {
                PruningMethod::WeightedDifferenceRawProb {
                    threshold: self.ngram_pruning_weighted_difference_threshold,
                }
            }
            PruningMethodName::WeightedDifferenceFullProb => {
                PruningMethod::WeightedDifferenceFullProb {
                    threshold: self.ngram_pruning_weighted_difference_threshold,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = TrainingConfiguration::default();
        assert_eq!(config.ngram_order, 4);
        assert_eq!(config.upper_case_replacement_threshold, 0.35);
        assert_eq!(config.directly_valid_word_count_threshold, 20);
        assert_eq!(config.pruning_method, PruningMethodName::OrderCount);
        assert_eq!(config.ngram_pruning_order_count_thresholds, vec![-1, 2, 3, 4]);
        assert_eq!(config.smoothing_discount_value, -1.0);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: TrainingConfiguration =
            serde_json::from_str(r#"{ "ngramOrder": 3, "pruningMethod": "NONE" }"#).unwrap();
        assert_eq!(config.ngram_order, 3);
        assert_eq!(config.pruning_method, PruningMethodName::None);
        assert_eq!(config.directly_valid_word_count_threshold, 20);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config: TrainingConfiguration =
            serde_json::from_str(r#"{ "futureOption": true }"#).unwrap();
        assert_eq!(config.ngram_order, 4);
    }

    #[test]
    fn pruning_selector_builds_the_configured_method() {
        let mut config = TrainingConfiguration::default();
        config.pruning_method = PruningMethodName::RawCount;
        config.ngram_pruning_count_threshold = 5;
        assert_eq!(config.pruning(), PruningMethod::RawCount { threshold: 5 });
    }

    #[test]
    fn zero_order_is_rejected() {
        let mut config = TrainingConfiguration::default();
        config.ngram_order = 0;
        assert!(config.validate().is_err());
    }
}
