//! Predictor configuration.

use serde::Deserialize;

/// Runtime knobs of the predictor; deserializable from the same JSON
/// style as the training configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PredictionParameter {
    /// A user word must have been typed this many times before it is
    /// proposed.
    pub min_use_count_to_validate_new_word: i32,
    /// Correction alternatives above this cost are discarded.
    pub correction_max_cost: f64,
    pub enable_word_correction: bool,
    /// Attach per-candidate scoring detail to predictions.
    pub enable_debug_information: bool,
    /// Weight of the dynamic model in the blended probability, in `[0, 1]`.
    pub dynamic_model_mixture: f64,
    /// Record unknown context words as user words while predicting.
    pub add_new_words_to_user_dictionary: bool,
}

impl Default for PredictionParameter {
    fn default() -> Self {
        PredictionParameter {
            min_use_count_to_validate_new_word: 1,
            correction_max_cost: 1.0,
            enable_word_correction: false,
            enable_debug_information: false,
            dynamic_model_mixture: 0.5,
            add_new_words_to_user_dictionary: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = PredictionParameter::default();
        assert_eq!(p.dynamic_model_mixture, 0.5);
        assert!(!p.enable_word_correction);
        assert_eq!(p.min_use_count_to_validate_new_word, 1);
    }

    #[test]
    fn partial_json_overrides_selected_fields() {
        let p: PredictionParameter =
            serde_json::from_str(r#"{ "enableWordCorrection": true, "correctionMaxCost": 0.4 }"#)
                .unwrap();
        assert!(p.enable_word_correction);
        assert_eq!(p.correction_max_cost, 0.4);
        assert_eq!(p.dynamic_model_mixture, 0.5);
    }
}
