//! Absolute-discounting parameters.
//!
//! The discount `D_k` subtracted from every positive count at order `k` is
//! either a configured constant or estimated from the count-of-counts:
//! `D_k = C1_k / (C1_k + 2·C2_k)` where `Cn_k` is the number of k-grams
//! occurring exactly `n` times, clamped to the configured bounds.

/// Discount configuration, from the training configuration file.
#[derive(Debug, Clone)]
pub struct SmoothingConfig {
    /// Fixed discount for all orders; negative means estimate per order.
    pub discount_value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        SmoothingConfig {
            discount_value: -1.0,
            lower_bound: 0.1,
            upper_bound: 1.0,
        }
    }
}

impl SmoothingConfig {
    /// A fixed discount for every order.
    pub fn constant(value: f64) -> Self {
        SmoothingConfig {
            discount_value: value,
            ..SmoothingConfig::default()
        }
    }

    /// The discount for one order given its count-of-counts.
    pub fn discount_for(&self, singletons: u64, doubletons: u64) -> f64 {
        if self.discount_value >= 0.0 {
            return self.discount_value;
        }
        let denominator = singletons + 2 * doubletons;
        let estimate = if denominator == 0 {
            crate::DEFAULT_DISCOUNT
        } else {
            singletons as f64 / denominator as f64
        };
        estimate.clamp(self.lower_bound, self.upper_bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_override_wins() {
        let config = SmoothingConfig::constant(0.7);
        assert_eq!(config.discount_for(100, 1), 0.7);
    }

    #[test]
    fn estimate_follows_count_of_counts() {
        let config = SmoothingConfig::default();
        // C1 = 30, C2 = 10 → 30 / 50 = 0.6
        assert!((config.discount_for(30, 10) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn estimate_is_clamped() {
        let config = SmoothingConfig::default();
        // All singletons → raw estimate 1.0, upper bound keeps it there;
        // no singletons → raw 0.0, clamped up to 0.1.
        assert_eq!(config.discount_for(10, 0), 1.0);
        assert_eq!(config.discount_for(0, 10), 0.1);
    }

    #[test]
    fn empty_order_falls_back_to_default_discount() {
        let config = SmoothingConfig::default();
        assert_eq!(config.discount_for(0, 0), crate::DEFAULT_DISCOUNT);
    }
}
