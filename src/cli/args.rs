//! Command-line argument definitions using clap

use clap::Parser;
use std::path::{Path, PathBuf};

use crate::pipeline::{InfoConfig, TargetMapping, DEFAULT_INFER_SCHEMA_LENGTH};

/// infotables - Rank variables by information value (IV) or net information value (NIV)
#[derive(Parser, Debug)]
#[command(name = "infotables")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Training data file (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Binary outcome column
    #[arg(short, long)]
    pub target: String,

    /// Value in the outcome column that represents an EVENT (maps to 1).
    /// Required with --non-event-value when the outcome is not binary 0/1.
    #[arg(long, requires = "non_event_value")]
    pub event_value: Option<String>,

    /// Value in the outcome column that represents a NON-EVENT (maps to 0).
    #[arg(long, requires = "event_value")]
    pub non_event_value: Option<String>,

    /// Binary treatment column. Switches to uplift analysis (NWoE / NIV).
    #[arg(long)]
    pub treatment: Option<String>,

    /// Value in the treatment column that marks TREATED records (maps to 1).
    #[arg(long, requires_all = ["treatment", "control_value"])]
    pub treated_value: Option<String>,

    /// Value in the treatment column that marks CONTROL records (maps to 0).
    #[arg(long, requires_all = ["treatment", "treated_value"])]
    pub control_value: Option<String>,

    /// Validation data file with the same columns as the training data.
    /// Enables the stability penalty.
    #[arg(long)]
    pub valid: Option<PathBuf>,

    /// Target number of equal-frequency bins for numeric variables
    #[arg(short, long, default_value = "10", value_parser = validate_bins)]
    pub bins: usize,

    /// Variables to analyze (comma-separated). Defaults to every column except
    /// the outcome and treatment columns.
    #[arg(long, value_delimiter = ',')]
    pub variables: Vec<String>,

    /// Substitute for zero event / non-event counts in a bin
    #[arg(long, default_value = "0.5", value_parser = validate_smoothing)]
    pub smoothing: f64,

    /// Weight of the bin-count penalty
    #[arg(long, default_value = "1.0", value_parser = validate_weight)]
    pub bin_penalty_weight: f64,

    /// Weight of the train/validation instability penalty
    #[arg(long, default_value = "1.0", value_parser = validate_weight)]
    pub stability_weight: f64,

    /// JSON export path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the JSON export next to the input ('<input>_infotables.json')
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Print the bin-level table of every scored variable
    #[arg(long, default_value = "false")]
    pub show_tables: bool,

    /// Process variables one at a time instead of in parallel
    #[arg(long, default_value = "false")]
    pub sequential: bool,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for a full table scan.
    #[arg(long, default_value_t = DEFAULT_INFER_SCHEMA_LENGTH)]
    pub infer_schema_length: usize,
}

impl Cli {
    /// Where to write the JSON export, if anywhere.
    /// An explicit --output wins over the path derived with --json.
    pub fn export_path(&self) -> Option<PathBuf> {
        if let Some(output) = &self.output {
            return Some(output.clone());
        }
        if !self.json {
            return None;
        }
        let parent = self.input.parent().unwrap_or_else(|| Path::new("."));
        let stem = self
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        Some(parent.join(format!("{}_infotables.json", stem)))
    }

    pub fn outcome_mapping(&self) -> Option<TargetMapping> {
        match (&self.event_value, &self.non_event_value) {
            (Some(event), Some(non_event)) => Some(TargetMapping::new(event, non_event)),
            _ => None,
        }
    }

    pub fn treatment_mapping(&self) -> Option<TargetMapping> {
        match (&self.treated_value, &self.control_value) {
            (Some(treated), Some(control)) => Some(TargetMapping::new(treated, control)),
            _ => None,
        }
    }

    /// Analysis configuration built from the arguments
    pub fn info_config(&self) -> InfoConfig {
        let mut config = InfoConfig {
            bins: self.bins,
            smoothing: self.smoothing,
            bin_penalty_weight: self.bin_penalty_weight,
            stability_weight: self.stability_weight,
            ..Default::default()
        }
        .with_parallel(!self.sequential)
        .with_progress(true);
        if !self.variables.is_empty() {
            config = config.with_variables(self.variables.iter().cloned());
        }
        config
    }
}

/// Validator for the bins parameter
fn validate_bins(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid bin count", s))?;

    if value == 0 {
        Err("bins must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Validator for the smoothing parameter
fn validate_smoothing(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(value.is_finite() && value > 0.0) {
        Err(format!("smoothing must be positive, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for penalty weights
fn validate_weight(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(value.is_finite() && value >= 0.0) {
        Err(format!("penalty weight must be non-negative, got {}", value))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config;

    #[test]
    fn test_defaults_match_library_config() {
        let cli = Cli::parse_from(["infotables", "-i", "train.csv", "-t", "y"]);
        let info = cli.info_config();
        assert_eq!(info.bins, config::DEFAULT_BINS);
        assert_eq!(info.smoothing, config::DEFAULT_SMOOTHING);
        assert_eq!(info.bin_penalty_weight, config::DEFAULT_BIN_PENALTY_WEIGHT);
        assert_eq!(info.stability_weight, config::DEFAULT_STABILITY_WEIGHT);
        assert!(info.variables.is_none());
        assert!(info.parallel);
    }

    #[test]
    fn test_validators() {
        assert!(validate_bins("0").is_err());
        assert_eq!(validate_bins("5"), Ok(5));
        assert!(validate_smoothing("0").is_err());
        assert!(validate_smoothing("abc").is_err());
        assert!(validate_weight("-0.1").is_err());
        assert_eq!(validate_weight("0"), Ok(0.0));
    }
}
