//! Analysis configuration

use serde::{Deserialize, Serialize};

use super::error::{InfoError, InfoResult};

/// Default number of equal-frequency bins per numeric variable
pub const DEFAULT_BINS: usize = 10;

/// Substitute for a zero event or non-event count, avoids log(0) in WoE
pub const DEFAULT_SMOOTHING: f64 = 0.5;

/// Weight of the bin-count penalty, `(k-1) * (1/events + 1/non_events)`
pub const DEFAULT_BIN_PENALTY_WEIGHT: f64 = 1.0;

/// Weight of the train/validation WoE instability penalty
pub const DEFAULT_STABILITY_WEIGHT: f64 = 1.0;

/// Configuration for building information tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoConfig {
    /// Target number of equal-frequency bins for numeric variables
    pub bins: usize,
    /// Restrict the analysis to these variables (in this order).
    /// `None` analyzes every column except the outcome and treatment columns.
    pub variables: Option<Vec<String>>,
    /// Value substituted for a zero count before forming distributions
    pub smoothing: f64,
    /// Multiplier for the bin-count penalty
    pub bin_penalty_weight: f64,
    /// Multiplier for the validation instability penalty
    pub stability_weight: f64,
    /// Fan out variables across the rayon thread pool
    pub parallel: bool,
    /// Draw a per-variable progress bar on stderr
    #[serde(skip)]
    pub show_progress: bool,
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            bins: DEFAULT_BINS,
            variables: None,
            smoothing: DEFAULT_SMOOTHING,
            bin_penalty_weight: DEFAULT_BIN_PENALTY_WEIGHT,
            stability_weight: DEFAULT_STABILITY_WEIGHT,
            parallel: true,
            show_progress: false,
        }
    }
}

impl InfoConfig {
    /// Set the target bin count
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    /// Restrict the analysis to a subset of variables
    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = Some(variables.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable parallel per-variable processing
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Check that all parameters are usable
    pub fn validate(&self) -> InfoResult<()> {
        if self.bins == 0 {
            return Err(InfoError::InvalidConfig(
                "bins must be at least 1".to_string(),
            ));
        }
        if !(self.smoothing.is_finite() && self.smoothing > 0.0) {
            return Err(InfoError::InvalidConfig(format!(
                "smoothing must be a positive finite number, got {}",
                self.smoothing
            )));
        }
        for (name, value) in [
            ("bin_penalty_weight", self.bin_penalty_weight),
            ("stability_weight", self.stability_weight),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(InfoError::InvalidConfig(format!(
                    "{} must be a non-negative finite number, got {}",
                    name, value
                )));
            }
        }
        if let Some(vars) = &self.variables {
            if vars.is_empty() {
                return Err(InfoError::InvalidConfig(
                    "variable list is empty".to_string(),
                ));
            }
            let mut seen = std::collections::HashSet::new();
            for v in vars {
                if !seen.insert(v.as_str()) {
                    return Err(InfoError::InvalidConfig(format!(
                        "variable '{}' requested more than once",
                        v
                    )));
                }
            }
        }
        Ok(())
    }

    /// Parameters consumed by the WoE / NWoE calculators
    pub fn woe_params(&self) -> WoeParams {
        WoeParams {
            smoothing: self.smoothing,
            bin_penalty_weight: self.bin_penalty_weight,
            stability_weight: self.stability_weight,
        }
    }
}

/// Numeric knobs of the WoE calculators, split out of [`InfoConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WoeParams {
    pub smoothing: f64,
    pub bin_penalty_weight: f64,
    pub stability_weight: f64,
}

impl Default for WoeParams {
    fn default() -> Self {
        InfoConfig::default().woe_params()
    }
}
