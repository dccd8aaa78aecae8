//! Pipeline module - binning, WoE / NWoE scoring and validation

pub mod analysis;
pub mod binning;
pub mod config;
pub mod error;
pub mod iv;
pub mod loader;
pub mod target;
pub mod uplift;
pub mod validation;

pub use analysis::{create_infotables, AnalysisMode, InfoInput, VariableTable};
pub use binning::{
    bin_variable, Bin, BinKind, BinTable, BinValue, VariableKind, VariableValues, MISSING_LABEL,
    OTHER_LABEL,
};
pub use config::{InfoConfig, WoeParams};
pub use error::{InfoError, InfoResult};
pub use iv::{calculate_woe_iv, compute_woe, ValidationStats, WoeRow, WoeStats, WoeTable};
pub use loader::*;
pub use target::{binary_column, TargetMapping};
pub use uplift::{compute_nwoe, ArmStats, ArmTotals, NwoeRow, NwoeTable};
pub use validation::{validate, validate_uplift, BinStability, Stability};
