//! infotables: Weight of Evidence and Information Value screening
//!
//! Bins each variable of a dataset (equal-frequency quantiles for numeric
//! variables, one bin per level for categorical ones, a separate bin for
//! missing values), computes WoE and IV against a binary outcome, or net WoE
//! and net IV between treatment and control groups, and ranks the variables
//! by penalized score.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
