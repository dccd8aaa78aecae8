//! Cross-validation of bin WoE against a second dataset
//!
//! Training boundaries are applied unchanged to the validation records, WoE is
//! recomputed on the validation side, and each bin is penalized in proportion
//! to how far its validation WoE drifts from the training WoE, weighted by the
//! bin's training separation `|%events - %non-events|`. A bin that receives no
//! validation records at all is treated as maximally unstable and gives up its
//! whole training IV (or NIV) contribution.
//!
//! Validation records that match no training bin (unseen levels, or missing
//! values when training had no missing bin) form an extra OTHER group. Training
//! carries no evidence for them (WoE 0), so the group's penalty is its drift
//! from 0 weighted by its validation separation, i.e. its validation IV (NIV).

use serde::Serialize;

use super::binning::{BinTable, VariableValues};
use super::config::WoeParams;
use super::error::{InfoError, InfoResult};
use super::iv::{
    calculate_woe_iv, check_outcome_classes, count_outcomes, ValidationStats, WoeTable,
};
use super::uplift::{arm_totals, count_arms, net_woe, NwoeTable};

/// Validation outcome of one bin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinStability {
    /// Validation records routed to the bin
    pub count: usize,
    /// Validation WoE (NWoE in uplift mode), `None` if it cannot be computed
    pub woe: Option<f64>,
    /// Penalty contributed by this bin
    pub penalty: f64,
}

impl From<&BinStability> for ValidationStats {
    fn from(bin: &BinStability) -> Self {
        ValidationStats {
            count: bin.count,
            woe: bin.woe,
            stability_penalty: bin.penalty,
        }
    }
}

/// Stability of a variable's bins between training and validation data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stability {
    /// One entry per training bin, in bin order
    pub bins: Vec<BinStability>,
    /// OTHER group of validation records that matched no training bin
    pub other: Option<BinStability>,
    /// Σ of per-bin penalties, OTHER group included
    pub penalty: f64,
    /// Validation records that matched no training bin (unseen levels or
    /// missing values when training had no missing bin)
    pub unmatched: usize,
}

impl Stability {
    fn from_bins(bins: Vec<BinStability>, other: Option<BinStability>) -> Self {
        let penalty = bins.iter().chain(&other).map(|b| b.penalty).sum();
        let unmatched = other.as_ref().map_or(0, |o| o.count);
        Self {
            bins,
            other,
            penalty,
            unmatched,
        }
    }
}

/// Route records that match no training bin to the OTHER slot at `n_bins`
fn with_other_slot(assignments: Vec<Option<usize>>, n_bins: usize) -> Vec<Option<usize>> {
    assignments
        .into_iter()
        .map(|a| Some(a.unwrap_or(n_bins)))
        .collect()
}

fn check_schema(table: &BinTable, values: &VariableValues, lengths: &[usize]) -> InfoResult<()> {
    if values.kind() != table.kind {
        return Err(InfoError::SchemaMismatch {
            column: table.variable.clone(),
            reason: format!(
                "training column is {} but validation column is {}",
                table.kind,
                values.kind()
            ),
        });
    }
    if lengths.iter().any(|&len| len != values.len()) {
        return Err(InfoError::SchemaMismatch {
            column: table.variable.clone(),
            reason: "validation columns have different lengths".to_string(),
        });
    }
    Ok(())
}

/// Compare training WoE with WoE recomputed on validation data.
///
/// # Arguments
/// * `train` - WoE table computed on the training data
/// * `table` - Bin boundaries learned on the training data
/// * `values` - The variable's validation values
/// * `outcome` - Validation outcome (0/1), aligned with `values`
/// * `params` - Smoothing constant and stability weight
///
/// # Errors
/// * `SchemaMismatch` when the validation column has another type
/// * `DegenerateOutcome` when the validation records have one class
pub fn validate(
    train: &WoeTable,
    table: &BinTable,
    values: &VariableValues,
    outcome: &[u8],
    params: &WoeParams,
) -> InfoResult<Stability> {
    check_schema(table, values, &[outcome.len()])?;

    let n_bins = table.len();
    let assignments = with_other_slot(table.assign_values(values), n_bins);
    let mut counts = count_outcomes(assignments, outcome, n_bins + 1);

    let total_events: usize = counts.iter().map(|c| c.0).sum();
    let total_non_events: usize = counts.iter().map(|c| c.1).sum();
    check_outcome_classes("validation data", total_events, total_non_events)?;

    let (other_events, other_non_events) = counts.pop().unwrap_or_default();
    let other = (other_events + other_non_events > 0).then(|| {
        let stats = calculate_woe_iv(
            other_events,
            other_non_events,
            total_events,
            total_non_events,
            params.smoothing,
        );
        BinStability {
            count: other_events + other_non_events,
            woe: Some(stats.woe),
            penalty: params.stability_weight * stats.iv,
        }
    });

    let bins = train
        .rows
        .iter()
        .zip(&counts)
        .map(|(row, &(events, non_events))| {
            let count = events + non_events;
            if count == 0 {
                return BinStability {
                    count,
                    woe: None,
                    penalty: row.iv,
                };
            }
            let stats = calculate_woe_iv(
                events,
                non_events,
                total_events,
                total_non_events,
                params.smoothing,
            );
            let drift = (row.woe - stats.woe).abs();
            let separation = (row.dist_events - row.dist_non_events).abs();
            BinStability {
                count,
                woe: Some(stats.woe),
                penalty: params.stability_weight * drift * separation,
            }
        })
        .collect();

    Ok(Stability::from_bins(bins, other))
}

/// Compare training NWoE with NWoE recomputed on validation data.
///
/// Bins excluded from training NIV carry no penalty. A bin that is included
/// in training but lacks validation records in either arm gives up its whole
/// NIV contribution. The OTHER group is penalized by its validation NIV, or
/// not at all when it lacks one arm.
pub fn validate_uplift(
    train: &NwoeTable,
    table: &BinTable,
    values: &VariableValues,
    outcome: &[u8],
    treatment: &[u8],
    params: &WoeParams,
) -> InfoResult<Stability> {
    check_schema(table, values, &[outcome.len(), treatment.len()])?;

    let n_bins = table.len();
    let assignments = with_other_slot(table.assign_values(values), n_bins);
    let (mut treated, mut control) = count_arms(assignments, outcome, treatment, n_bins + 1);
    let treatment_totals = arm_totals(&treated);
    let control_totals = arm_totals(&control);
    check_outcome_classes(
        "validation treatment group",
        treatment_totals.events,
        treatment_totals.non_events,
    )?;
    check_outcome_classes(
        "validation control group",
        control_totals.events,
        control_totals.non_events,
    )?;

    let other_treated = treated.pop().unwrap_or_default();
    let other_control = control.pop().unwrap_or_default();
    let other_count = other_treated.0 + other_treated.1 + other_control.0 + other_control.1;
    let other = (other_count > 0).then(|| {
        match net_woe(
            other_treated,
            other_control,
            treatment_totals,
            control_totals,
            params.smoothing,
        ) {
            Some((_, _, nwoe, contrast)) => BinStability {
                count: other_count,
                woe: Some(nwoe),
                penalty: params.stability_weight * (nwoe * contrast).abs(),
            },
            None => BinStability {
                count: other_count,
                woe: None,
                penalty: 0.0,
            },
        }
    });

    let bins = train
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let count = treated[i].0 + treated[i].1 + control[i].0 + control[i].1;
            let Some(train_nwoe) = row.nwoe else {
                return BinStability {
                    count,
                    woe: None,
                    penalty: 0.0,
                };
            };
            match net_woe(
                treated[i],
                control[i],
                treatment_totals,
                control_totals,
                params.smoothing,
            ) {
                Some((_, _, nwoe, _)) => BinStability {
                    count,
                    woe: Some(nwoe),
                    penalty: params.stability_weight
                        * (train_nwoe - nwoe).abs()
                        * row.contrast.abs(),
                },
                None => BinStability {
                    count,
                    woe: None,
                    penalty: row.niv,
                },
            }
        })
        .collect();

    Ok(Stability::from_bins(bins, other))
}
